use core::fmt;
use std::io::Read;

use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use weightgen_store::{ExportSet, LayerRecord};

use crate::{DecodeError, EncodingError};

/// The canonical interchange document: layer name -> flattened `kernel` and/or `bias`.
///
/// Encoded as compact JSON, in export order:
///
/// ```json
/// {"conv1":{"kernel":[1.0,2.0,3.0],"bias":[0.5]},"flatten":{}}
/// ```
///
/// The mapping from [`ExportSet`] is lossless: names, order, field presence and every `f32` value
/// survive a round trip. Every value of a document is finite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalDocument {
    set: ExportSet,
}

impl CanonicalDocument {
    /// Encode an export set, rejecting non-finite values.
    pub fn encode(set: &ExportSet) -> Result<Self, EncodingError> {
        Self::from_export_set(set.clone())
    }

    /// Same as [`encode`](Self::encode), taking ownership of the set.
    pub fn from_export_set(set: ExportSet) -> Result<Self, EncodingError> {
        for layer in set.iter() {
            check_finite(layer)?;
        }

        Ok(Self { set })
    }

    /// Compact JSON text, without any whitespace.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse compact (or pretty) JSON text.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Ok(Self::from_export_set(raw.0)?)
    }

    /// Parse JSON from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DecodeError> {
        let raw: RawDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_export_set(raw.0)?)
    }

    /// Layers in document order.
    pub fn layers(&self) -> impl Iterator<Item = &LayerRecord> {
        self.set.iter()
    }

    /// Number of layers, including those without parameters.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Whether the document holds no layer.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// The export set the document represents.
    pub fn as_export_set(&self) -> &ExportSet {
        &self.set
    }

    /// Rebuild the export set.
    pub fn into_export_set(self) -> ExportSet {
        self.set
    }
}

fn check_finite(layer: &LayerRecord) -> Result<(), EncodingError> {
    for (field, values) in layer.params() {
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(EncodingError {
                layer: layer.name.clone(),
                field,
                index,
                value: *value,
            });
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct EntryRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    kernel: Option<&'a [f32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bias: Option<&'a [f32]>,
}

impl Serialize for CanonicalDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.set.len()))?;

        for layer in self.set.iter() {
            let entry = EntryRef {
                kernel: layer.kernel.as_deref(),
                bias: layer.bias.as_deref(),
            };
            map.serialize_entry(&layer.name, &entry)?;
        }

        map.end()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    #[serde(default)]
    kernel: Option<Vec<f32>>,
    #[serde(default)]
    bias: Option<Vec<f32>>,
}

/// Document as read from JSON, before the finiteness check.
struct RawDocument(ExportSet);

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = RawDocument;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of layer names to kernel and bias arrays")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut set = ExportSet::new();

        while let Some((name, entry)) = access.next_entry::<String, Entry>()? {
            let record = LayerRecord {
                name,
                kernel: entry.kernel,
                bias: entry.bias,
            };
            set.push(record).map_err(de::Error::custom)?;
        }

        Ok(RawDocument(set))
    }
}
