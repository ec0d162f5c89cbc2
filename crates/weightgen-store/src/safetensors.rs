use std::collections::BTreeMap;
use std::path::Path;

use half::{bf16, f16};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};

use crate::{ContainerGroup, ContainerVariable, StoreError, TensorValue, VariableValue, WeightContainer};

const LAYERS_PREFIX: &str = "layers";
const VARS_SEGMENT: &str = "vars";

/// A weight container stored in the [safetensors](https://github.com/huggingface/safetensors)
/// format.
///
/// Tensor keys follow the path layout of Keras `.weights.h5` files:
/// `layers/<group>/vars/<slot>`. Keys outside `layers/` (optimizer state, metadata) are ignored.
///
/// Groups are visited in byte-lexicographic order of their names, the order h5py iterates HDF5
/// groups in.
#[derive(Debug, Clone)]
pub struct SafetensorsContainer {
    source: String,
    bytes: Vec<u8>,
}

impl SafetensorsContainer {
    /// Read a container from a file.
    ///
    /// The whole file is read and the handle closed before returning.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        log::debug!("Reading safetensors container {path:?}");
        let bytes = std::fs::read(path).map_err(|err| {
            StoreError::container_format(&source, format!("unable to read container: {err}"))
        })?;

        Self::from_bytes(source, bytes)
    }

    /// Use an in-memory buffer. `source` only appears in error messages.
    pub fn from_bytes(source: impl Into<String>, bytes: Vec<u8>) -> Result<Self, StoreError> {
        let container = Self {
            source: source.into(),
            bytes,
        };

        // Reject invalid headers up front.
        container.tensors()?;
        Ok(container)
    }

    fn tensors(&self) -> Result<SafeTensors<'_>, StoreError> {
        SafeTensors::deserialize(&self.bytes).map_err(|err| {
            StoreError::container_format(&self.source, format!("invalid safetensors data: {err:?}"))
        })
    }
}

impl WeightContainer for SafetensorsContainer {
    fn groups(&self) -> Result<Vec<ContainerGroup>, StoreError> {
        let tensors = self.tensors()?;
        let mut groups: BTreeMap<String, Vec<ContainerVariable>> = BTreeMap::new();

        for (key, view) in tensors.tensors() {
            let Some((group, slot)) = parse_key(&key)? else {
                log::debug!("Ignoring tensor {key:?} outside of `{LAYERS_PREFIX}/`");
                continue;
            };

            let value = decode_view(&view);
            groups
                .entry(group.to_string())
                .or_default()
                .push(ContainerVariable::new(slot, value));
        }

        Ok(groups
            .into_iter()
            .map(|(name, mut variables)| {
                variables.sort_by_key(|variable| variable.slot);
                ContainerGroup { name, variables }
            })
            .collect())
    }
}

/// Split `layers/<group>/vars/<slot>` into its group and slot.
///
/// Returns `None` for keys outside `layers/`.
fn parse_key(key: &str) -> Result<Option<(&str, usize)>, StoreError> {
    let mut segments = key.split('/');
    if segments.next() != Some(LAYERS_PREFIX) {
        return Ok(None);
    }

    let segments = segments.collect::<Vec<_>>();
    let (group, slot) = match segments.as_slice() {
        [group, vars, slot] if *vars == VARS_SEGMENT && !group.is_empty() => (*group, *slot),
        _ => {
            return Err(StoreError::container_format(
                key,
                format!("expected a key of the form `{LAYERS_PREFIX}/<group>/{VARS_SEGMENT}/<slot>`"),
            ))
        }
    };

    let slot = slot.parse::<usize>().map_err(|_| {
        StoreError::container_format(group, format!("variable slot `{slot}` is not an integer"))
    })?;

    Ok(Some((group, slot)))
}

fn decode_view(view: &TensorView<'_>) -> VariableValue {
    let data = view.data();
    let values = match view.dtype() {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect(),
        Dtype::F64 => data
            .chunks_exact(8)
            .map(|bytes| {
                let mut buffer = [0u8; 8];
                buffer.copy_from_slice(bytes);
                f64::from_le_bytes(buffer) as f32
            })
            .collect(),
        Dtype::F16 => data
            .chunks_exact(2)
            .map(|bytes| f16::from_le_bytes([bytes[0], bytes[1]]).to_f32())
            .collect(),
        Dtype::BF16 => data
            .chunks_exact(2)
            .map(|bytes| bf16::from_le_bytes([bytes[0], bytes[1]]).to_f32())
            .collect(),
        dtype => {
            return VariableValue::NonNumeric {
                dtype: format!("{dtype:?}"),
            }
        }
    };

    VariableValue::Numeric(TensorValue::new(view.shape().to_vec(), values))
}
