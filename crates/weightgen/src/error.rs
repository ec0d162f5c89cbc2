use std::path::PathBuf;

use weightgen_store::{ParamKind, StoreError};

use crate::ConfigError;

/// A value can't be written to the canonical document.
///
/// JSON has no representation for NaN or infinities, so they are rejected instead of being
/// coerced to `null`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Non-finite value {value} in layer `{layer}`, {field}[{index}]")]
pub struct EncodingError {
    /// Layer holding the value.
    pub layer: String,
    /// Parameter holding the value.
    pub field: ParamKind,
    /// Position of the value in the flattened parameter.
    pub index: usize,
    /// The offending value.
    pub value: f32,
}

/// A canonical document can't be read back.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// Malformed JSON, unknown fields or duplicated layers.
    #[error("Invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// A number does not fit in a finite 32-bit float.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Array declarations can't be generated from a document.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// A present parameter is empty and the policy forbids skipping it.
    #[error("Empty {field} array in layer `{layer}`")]
    EmptyArray {
        /// Layer holding the array.
        layer: String,
        /// Empty parameter.
        field: ParamKind,
    },

    /// Two declarations would share the same identifier.
    #[error("Identifier `{identifier}` is generated by both `{first}` and `{second}`")]
    NameCollision {
        /// The shared identifier.
        identifier: String,
        /// Layer that produced the identifier first.
        first: String,
        /// Layer that produced it again.
        second: String,
    },

    /// The layer name does not produce a valid C identifier.
    #[error("Layer `{layer}` produces the invalid identifier `{identifier}`")]
    InvalidIdentifier {
        /// Layer name.
        layer: String,
        /// Generated identifier.
        identifier: String,
    },

    /// A value does not fit in a 32-bit fixed-point number.
    #[error("Value {value} in layer `{layer}`, {field}[{index}] overflows Q{frac_bits} fixed point")]
    FixedPointOverflow {
        /// Layer holding the value.
        layer: String,
        /// Parameter holding the value.
        field: ParamKind,
        /// Position of the value in the flattened parameter.
        index: usize,
        /// The offending value.
        value: f32,
        /// Number of fractional bits requested.
        frac_bits: u32,
    },

    /// The number of fractional bits is out of range.
    #[error("Unsupported number of fractional bits: {0} (expected 0..=30)")]
    InvalidFracBits(u32),

    /// The top comment would end the `//` comment line early.
    #[error("Top comment must fit on one line: {0:?}")]
    MultilineComment(String),
}

/// Any failure of an export run.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// Reading the container failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Encoding the document failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Decoding the document failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Generating the declarations failed.
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Writing the document as JSON failed.
    #[error("Could not serialize the document: {0}")]
    Serialize(serde_json::Error),

    /// Loading the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing a file failed.
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A required path was not provided.
    #[error("Missing {0} path")]
    MissingPath(&'static str),

    /// The run would not write anything.
    #[error("No output requested")]
    NoOutput,
}
