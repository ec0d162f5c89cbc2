//! Array declarations are generated in two steps. A document is first planned into
//! declarations, which is where identifiers are checked, empty arrays handled and fixed-point
//! values converted; [`SourceGen`] and [`HeaderGen`] then render that plan.

mod fixed;
mod header;
mod plan;
mod source;

pub use fixed::to_fixed;
pub use header::HeaderGen;
pub use source::SourceGen;

pub(crate) use header::guard_from_file_name;
pub(crate) use plan::plan;

use serde::{Deserialize, Serialize};
use weightgen_store::ParamKind;

/// What to do with a parameter that is present but holds no value.
///
/// `float NAME[] = {};` is not valid C, so an empty array is never emitted as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyArrayPolicy {
    /// Omit the declaration and log a warning.
    #[default]
    Skip,

    /// Fail with [`CodegenError::EmptyArray`](crate::CodegenError::EmptyArray).
    Error,
}

/// Numeric representation of the generated arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericFormat {
    /// `float` arrays, values written with 8 fractional digits.
    #[default]
    Float,

    /// `int32_t` arrays holding `trunc(value * 2^frac_bits)`.
    Fixed {
        /// Position of the binary point.
        frac_bits: u32,
    },
}

impl NumericFormat {
    /// Fractional bits used by the fixed-point kernels of the target C code.
    pub const DEFAULT_FRAC_BITS: u32 = 10;

    /// Largest supported number of fractional bits.
    pub const MAX_FRAC_BITS: u32 = 30;

    /// The C element type.
    pub fn c_type(&self) -> &'static str {
        match self {
            NumericFormat::Float => "float",
            NumericFormat::Fixed { .. } => "int32_t",
        }
    }
}

/// Options shared by every generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodegenOptions {
    /// Handling of empty parameters.
    pub empty_arrays: EmptyArrayPolicy,
    /// Element representation.
    pub numeric_format: NumericFormat,
    /// Comment written on the first line, without the leading `//`.
    pub top_comment: Option<String>,
}

/// Identifier of the array holding `kind` for `layer`.
///
/// The layer name is uppercased and the parameter suffix appended, e.g. `conv1` -> `CONV1_KERNEL`.
/// Fixed-point arrays get an extra `_FIXED` suffix.
pub fn array_identifier(layer: &str, kind: ParamKind, format: NumericFormat) -> String {
    let mut identifier = format!("{}_{}", layer.to_uppercase(), kind.suffix());

    if let NumericFormat::Fixed { .. } = format {
        identifier.push_str("_FIXED");
    }

    identifier
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("conv1", ParamKind::Kernel, NumericFormat::Float, "CONV1_KERNEL")]
    #[case("dense_1", ParamKind::Bias, NumericFormat::Float, "DENSE_1_BIAS")]
    #[case("Conv1", ParamKind::Bias, NumericFormat::Fixed { frac_bits: 10 }, "CONV1_BIAS_FIXED")]
    fn identifiers(
        #[case] layer: &str,
        #[case] kind: ParamKind,
        #[case] format: NumericFormat,
        #[case] expected: &str,
    ) {
        assert_eq!(array_identifier(layer, kind, format), expected);
    }

    #[test]
    fn numeric_format_json() {
        let fixed = NumericFormat::Fixed { frac_bits: 10 };

        assert_eq!(
            serde_json::to_string(&fixed).unwrap(),
            r#"{"kind":"fixed","frac_bits":10}"#
        );
        assert_eq!(
            serde_json::from_str::<NumericFormat>(r#"{"kind":"float"}"#).unwrap(),
            NumericFormat::Float
        );
    }
}
