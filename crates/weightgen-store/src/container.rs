use crate::StoreError;

/// A hierarchical weight container: named groups of numbered variables.
///
/// Implementations decode their on-disk layout into this typed schema eagerly, so the extractor
/// never has to probe loosely-typed data.
pub trait WeightContainer {
    /// All top-level groups, in the container's native iteration order.
    ///
    /// That order is the export order of every artifact produced downstream, so it must be
    /// deterministic for a given container.
    fn groups(&self) -> Result<Vec<ContainerGroup>, StoreError>;
}

/// A named group of the container, typically one layer of the network.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerGroup {
    /// Name of the group.
    pub name: String,

    /// Variables of the group, ordered by slot.
    pub variables: Vec<ContainerVariable>,
}

impl ContainerGroup {
    /// Create a group without variables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
        }
    }

    /// Add a numeric tensor in the given slot.
    ///
    /// `data` must be laid out in row-major order.
    pub fn with_tensor(self, slot: usize, shape: Vec<usize>, data: Vec<f32>) -> Self {
        self.with_variable(slot, VariableValue::Numeric(TensorValue::new(shape, data)))
    }

    /// Add an arbitrary variable in the given slot.
    pub fn with_variable(mut self, slot: usize, value: VariableValue) -> Self {
        self.variables.push(ContainerVariable::new(slot, value));
        self
    }
}

/// A variable of a group, identified by its slot.
#[derive(new, Debug, Clone, PartialEq)]
pub struct ContainerVariable {
    /// Position of the variable inside its group.
    pub slot: usize,

    /// Decoded value.
    pub value: VariableValue,
}

/// Decoded value of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    /// A floating point tensor.
    Numeric(TensorValue),

    /// Anything that can't be read as floating point numbers (integers, booleans, strings, ...).
    NonNumeric {
        /// Name of the stored data type.
        dtype: String,
    },
}

/// A tensor with its shape and row-major data.
#[derive(new, Debug, Clone, PartialEq)]
pub struct TensorValue {
    /// Dimensions, outermost first. Empty for scalars.
    pub shape: Vec<usize>,

    /// Elements in row-major order.
    pub data: Vec<f32>,
}

impl TensorValue {
    /// Number of elements implied by the shape.
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Flatten into a 1-D sequence in row-major order, checking the shape.
    pub(crate) fn flatten(self) -> Result<Vec<f32>, String> {
        let expected = self.num_elements();
        if expected != self.data.len() {
            return Err(format!(
                "tensor of shape {:?} holds {} elements, expected {}",
                self.shape,
                self.data.len(),
                expected
            ));
        }

        Ok(self.data)
    }
}
