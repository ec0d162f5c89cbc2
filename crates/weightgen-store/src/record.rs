use core::fmt;
use std::collections::HashMap;

use crate::StoreError;

/// The role a flattened tensor plays inside a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The learnable kernel (weights) of the layer.
    Kernel,

    /// The learnable bias of the layer.
    Bias,
}

impl ParamKind {
    /// Both kinds, in export order.
    pub const ALL: [ParamKind; 2] = [ParamKind::Kernel, ParamKind::Bias];

    /// Field name used in documents and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Kernel => "kernel",
            ParamKind::Bias => "bias",
        }
    }

    /// Suffix appended to generated identifiers.
    pub fn suffix(&self) -> &'static str {
        match self {
            ParamKind::Kernel => "KERNEL",
            ParamKind::Bias => "BIAS",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The exportable parameters of one layer.
///
/// Both tensors are stored flattened in row-major order; their original shape is not kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerRecord {
    /// Layer name, unique within an [`ExportSet`].
    pub name: String,

    /// Flattened kernel, absent for layers without one (pooling, flatten, ...).
    pub kernel: Option<Vec<f32>>,

    /// Flattened bias, independent from the kernel.
    pub bias: Option<Vec<f32>>,
}

impl LayerRecord {
    /// Create a record without any parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernel: None,
            bias: None,
        }
    }

    /// Set the flattened kernel.
    pub fn with_kernel(mut self, kernel: Vec<f32>) -> Self {
        self.kernel = Some(kernel);
        self
    }

    /// Set the flattened bias.
    pub fn with_bias(mut self, bias: Vec<f32>) -> Self {
        self.bias = Some(bias);
        self
    }

    /// The values of the given parameter, if present.
    pub fn param(&self, kind: ParamKind) -> Option<&[f32]> {
        match kind {
            ParamKind::Kernel => self.kernel.as_deref(),
            ParamKind::Bias => self.bias.as_deref(),
        }
    }

    /// Present parameters, kernel first.
    pub fn params(&self) -> impl Iterator<Item = (ParamKind, &[f32])> {
        ParamKind::ALL
            .into_iter()
            .filter_map(move |kind| self.param(kind).map(|values| (kind, values)))
    }

    /// Whether the layer holds a kernel or a bias.
    pub fn has_params(&self) -> bool {
        self.kernel.is_some() || self.bias.is_some()
    }

    pub(crate) fn set_param(&mut self, kind: ParamKind, values: Vec<f32>) {
        match kind {
            ParamKind::Kernel => self.kernel = Some(values),
            ParamKind::Bias => self.bias = Some(values),
        }
    }
}

/// Ordered collection of [`LayerRecord`]s.
///
/// Iteration order is insertion order, which is the export order of every downstream artifact.
/// Names are indexed, so lookups and duplicate checks don't depend on the number of layers.
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    layers: Vec<LayerRecord>,
    index: HashMap<String, usize>,
}

impl PartialEq for ExportSet {
    fn eq(&self, other: &Self) -> bool {
        // The index is derived from the layers.
        self.layers == other.layers
    }
}

impl ExportSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer at the end of the export order.
    ///
    /// Fails if the name is empty or already present.
    pub fn push(&mut self, record: LayerRecord) -> Result<(), StoreError> {
        if record.name.is_empty() {
            return Err(StoreError::EmptyLayerName);
        }
        if self.contains(&record.name) {
            return Err(StoreError::DuplicateLayer(record.name));
        }

        self.index.insert(record.name.clone(), self.layers.len());
        self.layers.push(record);
        Ok(())
    }

    /// Whether a layer with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look a layer up by name.
    pub fn get(&self, name: &str) -> Option<&LayerRecord> {
        self.index.get(name).map(|position| &self.layers[*position])
    }

    /// Number of layers, including those without parameters.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the set holds no layer.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in export order.
    pub fn iter(&self) -> core::slice::Iter<'_, LayerRecord> {
        self.layers.iter()
    }

    /// Layers holding at least one parameter, in export order.
    pub fn layers_with_params(&self) -> impl Iterator<Item = &LayerRecord> {
        self.layers.iter().filter(|layer| layer.has_params())
    }

    /// Layer names in export order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.name.as_str())
    }

    /// Build a set from records, failing on the first invalid or duplicated name.
    pub fn try_from_records<I>(records: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = LayerRecord>,
    {
        let mut set = Self::new();
        for record in records {
            set.push(record)?;
        }
        Ok(set)
    }
}

impl IntoIterator for ExportSet {
    type Item = LayerRecord;
    type IntoIter = std::vec::IntoIter<LayerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExportSet {
    type Item = &'a LayerRecord;
    type IntoIter = core::slice::Iter<'a, LayerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}
