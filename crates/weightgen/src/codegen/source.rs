use super::{
    plan::{plan, LayerDecls},
    CodegenOptions, EmptyArrayPolicy, NumericFormat,
};
use crate::{CanonicalDocument, CodegenError};

/// Generate C array definitions from a canonical document.
///
/// # Example
///
/// ```
/// use weightgen::{CanonicalDocument, SourceGen};
///
/// let document = CanonicalDocument::from_json(r#"{"dense":{"bias":[0.5]}}"#).unwrap();
/// let source = SourceGen::new().generate(&document).unwrap();
///
/// assert_eq!(source, "// Layer: dense\nfloat DENSE_BIAS[] = {\n    0.50000000\n};\n\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceGen {
    options: CodegenOptions,
}

impl SourceGen {
    /// Generator with float arrays, skipping empty arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator using the given options.
    pub fn from_options(options: CodegenOptions) -> Self {
        Self { options }
    }

    /// Set the handling of empty parameters.
    pub fn with_empty_arrays(mut self, policy: EmptyArrayPolicy) -> Self {
        self.options.empty_arrays = policy;
        self
    }

    /// Set the element representation.
    pub fn with_numeric_format(mut self, format: NumericFormat) -> Self {
        self.options.numeric_format = format;
        self
    }

    /// Write `// {comment}` as the first line.
    pub fn with_top_comment(mut self, comment: impl Into<String>) -> Self {
        self.options.top_comment = Some(comment.into());
        self
    }

    /// Generate the source text.
    ///
    /// Nothing is returned unless the whole document could be generated.
    pub fn generate(&self, document: &CanonicalDocument) -> Result<String, CodegenError> {
        let layers = plan(document, &self.options)?;

        Ok(self.render(&layers))
    }

    pub(crate) fn render(&self, layers: &[LayerDecls]) -> String {
        let c_type = self.options.numeric_format.c_type();
        let mut output = String::new();

        if let Some(comment) = &self.options.top_comment {
            output.push_str(&format!("// {comment}\n\n"));
        }
        if let NumericFormat::Fixed { .. } = self.options.numeric_format {
            output.push_str("#include <stdint.h>\n\n");
        }

        for layer in layers.iter() {
            output.push_str(&format!("// Layer: {}\n", layer.layer));

            for array in layer.arrays.iter() {
                output.push_str(&format!("{c_type} {}[] = {{\n", array.identifier));
                let elements = array.values.rendered().join(",\n    ");
                output.push_str(&format!("    {elements}\n"));
                output.push_str("};\n\n");
            }
        }

        output
    }
}
