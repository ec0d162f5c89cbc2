use super::{
    plan::{plan, LayerDecls},
    CodegenOptions, EmptyArrayPolicy, NumericFormat,
};
use crate::{CanonicalDocument, CodegenError};

/// Generate the C header declaring the arrays defined by [`SourceGen`](super::SourceGen).
///
/// Each array gets a `NAME_LEN` length macro and an `extern` declaration. Given the same options
/// and document, the header declares exactly the arrays the source defines.
#[derive(Debug, Clone)]
pub struct HeaderGen {
    options: CodegenOptions,
    guard: String,
}

impl Default for HeaderGen {
    fn default() -> Self {
        Self {
            options: CodegenOptions::default(),
            guard: Self::DEFAULT_GUARD.to_string(),
        }
    }
}

impl HeaderGen {
    /// Include guard used when none is set.
    pub const DEFAULT_GUARD: &'static str = "WEIGHTS_H";

    /// Generator with float arrays, skipping empty arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator using the given options.
    pub fn from_options(options: CodegenOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Set the include guard macro.
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = guard.into();
        self
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

    /// Generate the header text.
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
        output.push_str(&format!("#ifndef {0}\n#define {0}\n\n", self.guard));
        if let NumericFormat::Fixed { .. } = self.options.numeric_format {
            output.push_str("#include <stdint.h>\n\n");
        }

        for layer in layers.iter() {
            output.push_str(&format!("// Layer: {}\n", layer.layer));

            for array in layer.arrays.iter() {
                let id = &array.identifier;
                output.push_str(&format!("#define {id}_LEN {}\n", array.values.len()));
                output.push_str(&format!("extern {c_type} {id}[{id}_LEN];\n\n"));
            }
        }

        output.push_str(&format!("#endif /* {} */\n", self.guard));

        output
    }
}

/// Include guard derived from a header file name, e.g. `lenet-weights.h` -> `LENET_WEIGHTS_H`.
pub(crate) fn guard_from_file_name(file_name: &str) -> String {
    let guard: String = file_name
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c.to_ascii_uppercase(),
            _ => '_',
        })
        .collect();

    match guard.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => guard,
        Some(_) => format!("_{guard}"),
        None => HeaderGen::DEFAULT_GUARD.to_string(),
    }
}
