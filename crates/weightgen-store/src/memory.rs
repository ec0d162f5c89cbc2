use crate::{ContainerGroup, StoreError, WeightContainer};

/// A container held in memory.
///
/// Its native order is insertion order. Useful to bridge formats decoded elsewhere, and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryContainer {
    groups: Vec<ContainerGroup>,
}

impl MemoryContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group.
    pub fn with_group(mut self, group: ContainerGroup) -> Self {
        self.groups.push(group);
        self
    }
}

impl WeightContainer for MemoryContainer {
    fn groups(&self) -> Result<Vec<ContainerGroup>, StoreError> {
        Ok(self.groups.clone())
    }
}
