#![warn(missing_docs)]

//! `weightgen-store` reads the parameter set of a trained network out of a hierarchical weight
//! container and flattens it into an ordered [`ExportSet`].
//!
//! A container is any [`WeightContainer`]: a top-level collection of named groups, each holding
//! numbered variables. Which variable is a kernel and which is a bias is decided by a
//! [`SlotAdapter`], never by names.
//!
//! ```rust,ignore
//! use weightgen_store::{SafetensorsContainer, WeightExtractor};
//!
//! let container = SafetensorsContainer::from_file("lenet.safetensors")?;
//! let set = WeightExtractor::default()
//!     .with_key_remap("conv2d(_\\d+)?", "conv$1")?
//!     .extract(&container)?;
//!
//! for layer in set.iter() {
//!     println!("{}: {:?}", layer.name, layer.kernel.as_ref().map(Vec::len));
//! }
//! ```

#[macro_use]
extern crate derive_new;

mod adapter;
mod container;
mod error;
mod extractor;
mod memory;
mod record;
mod safetensors;

pub use adapter::{KerasSlotAdapter, SlotAdapter};
pub use container::{ContainerGroup, ContainerVariable, TensorValue, VariableValue, WeightContainer};
pub use error::StoreError;
pub use extractor::WeightExtractor;
pub use memory::MemoryContainer;
pub use record::{ExportSet, LayerRecord, ParamKind};

pub use crate::safetensors::SafetensorsContainer;
