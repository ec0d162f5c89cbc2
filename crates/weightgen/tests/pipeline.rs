use std::path::Path;

use pretty_assertions::assert_eq;
use safetensors::{tensor::TensorView, Dtype};
use weightgen::{CanonicalDocument, ExportConfig, ExportError, ExportGen, NumericFormat};

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// A LeNet-like container: two parametrised layers around a flatten layer, plus optimizer state.
fn write_container(path: &Path) {
    let tensors = vec![
        ("layers/dense/vars/0", vec![2, 1], f32_bytes(&[0.25, -0.75])),
        ("layers/dense/vars/1", vec![1], f32_bytes(&[0.1])),
        ("layers/conv1/vars/1", vec![1], f32_bytes(&[0.5])),
        ("layers/conv1/vars/0", vec![3, 1], f32_bytes(&[1.0, 2.0, 3.0])),
        ("layers/flatten/vars/0", vec![0], Vec::new()),
        ("optimizer/vars/0", vec![1], f32_bytes(&[42.0])),
    ];
    let views = tensors
        .iter()
        .map(|(name, shape, data)| {
            let view = TensorView::new(Dtype::F32, shape.clone(), data).unwrap();
            (name.to_string(), view)
        })
        .collect::<Vec<_>>();

    std::fs::write(path, safetensors::serialize(views, &None).unwrap()).unwrap();
}

const SOURCE: &str = "\
// Layer: conv1
float CONV1_KERNEL[] = {
    1.00000000,
    2.00000000,
    3.00000000
};

float CONV1_BIAS[] = {
    0.50000000
};

// Layer: dense
float DENSE_KERNEL[] = {
    0.25000000,
    -0.75000000
};

float DENSE_BIAS[] = {
    0.10000000
};

";

#[test]
fn container_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lenet.safetensors");
    write_container(&input);

    let summary = ExportGen::new()
        .input(&input)
        .listing(dir.path().join("weights.txt"))
        .document(dir.path().join("weights.json"))
        .source(dir.path().join("weights.c"))
        .run()
        .unwrap();

    assert_eq!(summary.layers, 3);
    assert_eq!(summary.declarations, 4);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("weights.json")).unwrap(),
        r#"{"conv1":{"kernel":[1.0,2.0,3.0],"bias":[0.5]},"dense":{"kernel":[0.25,-0.75],"bias":[0.1]},"flatten":{"kernel":[]}}"#
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("weights.txt")).unwrap(),
        "Layer: conv1\n  Kernel: 1.0 2.0 3.0\n  Bias: 0.5\n\n\
         Layer: dense\n  Kernel: 0.25 -0.75\n  Bias: 0.1\n\n\
         Layer: flatten\n  Kernel: \n\n"
    );
    assert_eq!(std::fs::read_to_string(dir.path().join("weights.c")).unwrap(), SOURCE);
}

#[test]
fn later_codegen_run_matches() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lenet.safetensors");
    let document = dir.path().join("weights.json");
    write_container(&input);

    ExportGen::new().input(&input).document(&document).run().unwrap();
    ExportGen::new()
        .document(&document)
        .source(dir.path().join("weights.c"))
        .run_codegen()
        .unwrap();

    assert_eq!(std::fs::read_to_string(dir.path().join("weights.c")).unwrap(), SOURCE);

    let decoded = CanonicalDocument::from_json(&std::fs::read_to_string(&document).unwrap()).unwrap();
    assert_eq!(decoded.len(), 3);
}

#[test]
fn configuration_file_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lenet.safetensors");
    write_container(&input);

    let config = ExportConfig {
        input: Some(input),
        source: Some(dir.path().join("weights.c")),
        header: Some(dir.path().join("lenet-weights.h")),
        numeric_format: NumericFormat::Fixed { frac_bits: 10 },
        ..Default::default()
    };
    config.save(dir.path().join("export.json")).unwrap();

    let config = ExportConfig::load(dir.path().join("export.json")).unwrap();
    ExportGen::from_config(&config).run().unwrap();

    let source = std::fs::read_to_string(dir.path().join("weights.c")).unwrap();
    let header = std::fs::read_to_string(dir.path().join("lenet-weights.h")).unwrap();
    assert!(source.contains("int32_t CONV1_KERNEL_FIXED[] = {\n    1024,\n    2048,\n    3072\n};"));
    assert!(header.starts_with("#ifndef LENET_WEIGHTS_H\n#define LENET_WEIGHTS_H\n"));
    assert!(header.contains("#define DENSE_KERNEL_FIXED_LEN 2\n"));
}

#[test]
fn missing_container() {
    let dir = tempfile::tempdir().unwrap();

    let err = ExportGen::new()
        .input(dir.path().join("missing.safetensors"))
        .source(dir.path().join("weights.c"))
        .run()
        .unwrap_err();

    assert!(matches!(err, ExportError::Store(_)));
    assert!(!dir.path().join("weights.c").exists());
}
