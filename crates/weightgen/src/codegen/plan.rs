use std::collections::HashMap;

use weightgen_store::ParamKind;

use super::{array_identifier, fixed, CodegenOptions, EmptyArrayPolicy, NumericFormat};
use crate::{CanonicalDocument, CodegenError};

/// Declarations of one layer, in kernel then bias order.
#[derive(Debug)]
pub(crate) struct LayerDecls<'a> {
    pub layer: &'a str,
    pub arrays: Vec<ArrayDecl<'a>>,
}

#[derive(Debug)]
pub(crate) struct ArrayDecl<'a> {
    pub identifier: String,
    pub values: ArrayValues<'a>,
}

#[derive(Debug)]
pub(crate) enum ArrayValues<'a> {
    Float(&'a [f32]),
    Fixed(Vec<i32>),
}

impl ArrayValues<'_> {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Float(values) => values.len(),
            ArrayValues::Fixed(values) => values.len(),
        }
    }

    /// Each element as written in the initializer.
    pub fn rendered(&self) -> Vec<String> {
        match self {
            ArrayValues::Float(values) => values.iter().map(|value| format!("{value:.8}")).collect(),
            ArrayValues::Fixed(values) => values.iter().map(|value| value.to_string()).collect(),
        }
    }
}

/// Plan every declaration of the document.
///
/// Layers left without any declaration are dropped, so the result never contains an empty
/// layer nor an empty array.
pub(crate) fn plan<'a>(
    document: &'a CanonicalDocument,
    options: &CodegenOptions,
) -> Result<Vec<LayerDecls<'a>>, CodegenError> {
    if let NumericFormat::Fixed { frac_bits } = options.numeric_format {
        fixed::check_frac_bits(frac_bits)?;
    }
    if let Some(comment) = &options.top_comment {
        if comment.contains(['\n', '\r']) {
            return Err(CodegenError::MultilineComment(comment.clone()));
        }
    }

    let mut owners: HashMap<String, &'a str> = HashMap::new();
    let mut layers = Vec::with_capacity(document.len());

    for layer in document.layers() {
        let mut arrays = Vec::new();

        for (kind, values) in layer.params() {
            if values.is_empty() {
                match options.empty_arrays {
                    EmptyArrayPolicy::Skip => {
                        log::warn!("Skipping empty {kind} array of layer {:?}", layer.name);
                        continue;
                    }
                    EmptyArrayPolicy::Error => {
                        return Err(CodegenError::EmptyArray {
                            layer: layer.name.clone(),
                            field: kind,
                        })
                    }
                }
            }

            let identifier = array_identifier(&layer.name, kind, options.numeric_format);
            if !is_c_identifier(&identifier) {
                return Err(CodegenError::InvalidIdentifier {
                    layer: layer.name.clone(),
                    identifier,
                });
            }
            if let Some(first) = owners.get(&identifier) {
                return Err(CodegenError::NameCollision {
                    identifier,
                    first: first.to_string(),
                    second: layer.name.clone(),
                });
            }
            owners.insert(identifier.clone(), &layer.name);

            let values = convert(&layer.name, kind, values, options.numeric_format)?;
            arrays.push(ArrayDecl { identifier, values });
        }

        if !arrays.is_empty() {
            layers.push(LayerDecls {
                layer: &layer.name,
                arrays,
            });
        }
    }

    Ok(layers)
}

fn convert<'a>(
    layer: &str,
    kind: ParamKind,
    values: &'a [f32],
    format: NumericFormat,
) -> Result<ArrayValues<'a>, CodegenError> {
    let frac_bits = match format {
        NumericFormat::Float => return Ok(ArrayValues::Float(values)),
        NumericFormat::Fixed { frac_bits } => frac_bits,
    };

    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            fixed::to_fixed(*value, frac_bits).ok_or_else(|| CodegenError::FixedPointOverflow {
                layer: layer.to_string(),
                field: kind,
                index,
                value: *value,
                frac_bits,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ArrayValues::Fixed)
}

fn is_c_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
