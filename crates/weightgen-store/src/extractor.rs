use regex::Regex;

use crate::{
    ExportSet, KerasSlotAdapter, LayerRecord, SlotAdapter, StoreError, VariableValue,
    WeightContainer,
};

/// Turns a [`WeightContainer`] into an [`ExportSet`].
///
/// Groups become layers in the container's native order. Each variable is classified by the
/// [`SlotAdapter`]; unclassified slots are skipped.
///
/// # Examples
///
/// ```rust
/// use weightgen_store::{ContainerGroup, MemoryContainer, WeightExtractor};
///
/// let container = MemoryContainer::new().with_group(
///     ContainerGroup::new("conv2d")
///         .with_tensor(0, vec![3], vec![1.0, 2.0, 3.0])
///         .with_tensor(1, vec![1], vec![0.5]),
/// );
///
/// let set = WeightExtractor::default()
///     .with_key_remap("conv2d", "conv1")
///     .unwrap()
///     .extract(&container)
///     .unwrap();
///
/// assert_eq!(set.get("conv1").unwrap().kernel, Some(vec![1.0, 2.0, 3.0]));
/// ```
#[derive(Debug)]
pub struct WeightExtractor<A: SlotAdapter = KerasSlotAdapter> {
    adapter: A,
    key_remap: Vec<(Regex, String)>,
}

impl Default for WeightExtractor<KerasSlotAdapter> {
    fn default() -> Self {
        Self::new(KerasSlotAdapter)
    }
}

impl<A: SlotAdapter> WeightExtractor<A> {
    /// Create an extractor using the given slot convention.
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            key_remap: Vec::new(),
        }
    }

    /// Rename groups matching `pattern` before they become layers.
    ///
    /// The pattern is anchored (`^pattern$`); capture groups can be used in the replacement
    /// (`$1`, `$name`). Rules are tried in the order they were added and only the first matching
    /// rule is applied.
    pub fn with_key_remap(mut self, pattern: &str, replacement: &str) -> Result<Self, StoreError> {
        let regex = Regex::new(&format!("^{pattern}$"))?;

        self.key_remap.push((regex, replacement.into()));
        Ok(self)
    }

    /// Read every group of the container.
    pub fn extract<C: WeightContainer + ?Sized>(&self, container: &C) -> Result<ExportSet, StoreError> {
        let groups = container.groups()?;
        let mut set = ExportSet::new();

        for group in groups {
            let name = self.remap(&group.name);
            if name != group.name {
                log::debug!("Remapped group {:?} to {:?}", group.name, name);
            }

            let mut record = LayerRecord::new(name);
            let mut seen_slots = Vec::with_capacity(group.variables.len());

            for variable in group.variables {
                if seen_slots.contains(&variable.slot) {
                    return Err(StoreError::container_format(
                        &group.name,
                        format!("variable slot {} appears more than once", variable.slot),
                    ));
                }
                seen_slots.push(variable.slot);

                let Some(kind) = self.adapter.classify(variable.slot) else {
                    log::debug!("Skipping slot {} of {:?}", variable.slot, group.name);
                    continue;
                };

                let values = match variable.value {
                    VariableValue::Numeric(tensor) => tensor
                        .flatten()
                        .map_err(|reason| StoreError::container_format(&group.name, reason))?,
                    VariableValue::NonNumeric { dtype } => {
                        return Err(StoreError::container_format(
                            &group.name,
                            format!("{kind} slot {} holds non-numeric data ({dtype})", variable.slot),
                        ))
                    }
                };

                record.set_param(kind, values);
            }

            log::debug!(
                "Extracted layer {:?}: kernel {:?}, bias {:?}",
                record.name,
                record.kernel.as_ref().map(Vec::len),
                record.bias.as_ref().map(Vec::len),
            );

            set.push(record).map_err(|err| {
                StoreError::container_format(&group.name, format!("invalid layer: {err}"))
            })?;
        }

        log::info!("Extracted {} layers", set.len());
        Ok(set)
    }

    fn remap(&self, name: &str) -> String {
        for (pattern, replacement) in self.key_remap.iter() {
            if pattern.is_match(name) {
                return pattern.replace_all(name, replacement.as_str()).to_string();
            }
        }

        name.to_string()
    }
}
