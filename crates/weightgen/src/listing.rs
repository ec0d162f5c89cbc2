use weightgen_store::{ExportSet, ParamKind};

/// Render the human-readable listing of an export set.
///
/// One block per layer, in export order:
///
/// ```text
/// Layer: conv1
///   Kernel: 1.0 2.0 3.0
///   Bias: 0.5
///
/// ```
///
/// Layers without parameters only get their header line. The listing is diagnostic and is never
/// read back.
pub fn render_listing(set: &ExportSet) -> String {
    let mut output = String::new();

    for layer in set.iter() {
        output.push_str(&format!("Layer: {}\n", layer.name));

        for (kind, values) in layer.params() {
            let label = match kind {
                ParamKind::Kernel => "Kernel",
                ParamKind::Bias => "Bias",
            };
            let values = values
                .iter()
                .map(|value| format!("{value:?}"))
                .collect::<Vec<_>>()
                .join(" ");

            output.push_str(&format!("  {label}: {values}\n"));
        }

        output.push('\n');
    }

    output
}
