#![warn(missing_docs)]

//! `weightgen` exports the parameters of a trained network for embedded and hardware-synthesis
//! toolchains.
//!
//! The pipeline has three stages, each producing a new artifact:
//!
//! 1. [`WeightExtractor`](weightgen_store::WeightExtractor) reads a weight container into an
//!    ordered [`ExportSet`](weightgen_store::ExportSet).
//! 2. [`render_listing`] and [`CanonicalDocument`] turn the set into a diagnostic listing and a
//!    compact, lossless JSON document.
//! 3. [`SourceGen`] and [`HeaderGen`] turn a document, possibly produced by an earlier run, into
//!    C array declarations.
//!
//! [`ExportGen`] wires the stages together and writes the requested files.
//!
//! ```rust,ignore
//! use weightgen::ExportGen;
//!
//! ExportGen::new()
//!     .input("lenet.safetensors")
//!     .document("weights.json")
//!     .source("weights.c")
//!     .header("weights.h")
//!     .run()?;
//! ```

#[macro_use]
extern crate derive_new;

/// C code generation from canonical documents.
pub mod codegen;

mod config;
mod document;
mod error;
mod export;
mod io;
mod listing;
mod logger;

pub use codegen::{EmptyArrayPolicy, HeaderGen, NumericFormat, SourceGen};
pub use config::{ConfigError, ExportConfig, KeyRemap};
pub use document::CanonicalDocument;
pub use error::{CodegenError, DecodeError, EncodingError, ExportError};
pub use export::{ExportGen, ExportSummary};
pub use listing::render_listing;
pub use logger::init_log;

pub use weightgen_store as store;
