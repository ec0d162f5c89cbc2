use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::LevelFilter;
use weightgen_store::{SafetensorsContainer, WeightContainer, WeightExtractor};

use crate::{
    codegen::{guard_from_file_name, plan, CodegenOptions},
    io::OutputBatch,
    logger::init_log,
    render_listing, CanonicalDocument, EmptyArrayPolicy, ExportConfig, ExportError, HeaderGen,
    KeyRemap, NumericFormat, SourceGen,
};

/// Outcome of a successful run.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Layers in the document, including those without parameters.
    pub layers: usize,
    /// Arrays declared by the generated source, zero when no code was generated.
    pub declarations: usize,
    /// Files written, in write order.
    pub written: Vec<PathBuf>,
}

/// Export the weights of a container to a listing, a canonical document and C declarations.
///
/// Every output is rendered in memory first. Nothing is written unless the whole run succeeds,
/// and a failed write removes the files the run already wrote.
#[derive(Debug, Default)]
pub struct ExportGen {
    input: Option<PathBuf>,
    listing: Option<PathBuf>,
    document: Option<PathBuf>,
    source: Option<PathBuf>,
    header: Option<PathBuf>,
    options: CodegenOptions,
    key_remap: Vec<KeyRemap>,
}

impl ExportGen {
    /// Create a new `ExportGen`.
    pub fn new() -> Self {
        init_log(LevelFilter::Info).ok(); // Error when init multiple times are ignored.
        Self::default()
    }

    /// Create an `ExportGen` from a configuration.
    pub fn from_config(config: &ExportConfig) -> Self {
        let mut export = Self::new();

        export.input = config.input.clone();
        export.listing = config.listing.clone();
        export.document = config.document.clone();
        export.source = config.source.clone();
        export.header = config.header.clone();
        export.key_remap = config.key_remap.clone();
        export.options = CodegenOptions {
            empty_arrays: config.empty_arrays,
            numeric_format: config.numeric_format,
            top_comment: config.top_comment.clone(),
        };

        export
    }

    /// Set the weight container to read.
    pub fn input(&mut self, input: impl AsRef<Path>) -> &mut Self {
        self.input = Some(input.as_ref().into());
        self
    }

    /// Write the human-readable listing.
    pub fn listing(&mut self, listing: impl AsRef<Path>) -> &mut Self {
        self.listing = Some(listing.as_ref().into());
        self
    }

    /// Write the canonical document, or read it with [`run_codegen`](Self::run_codegen).
    pub fn document(&mut self, document: impl AsRef<Path>) -> &mut Self {
        self.document = Some(document.as_ref().into());
        self
    }

    /// Write the generated C source.
    pub fn source(&mut self, source: impl AsRef<Path>) -> &mut Self {
        self.source = Some(source.as_ref().into());
        self
    }

    /// Write the generated C header.
    ///
    /// The include guard is derived from the file name.
    pub fn header(&mut self, header: impl AsRef<Path>) -> &mut Self {
        self.header = Some(header.as_ref().into());
        self
    }

    /// Set the handling of empty parameters.
    pub fn empty_arrays(&mut self, policy: EmptyArrayPolicy) -> &mut Self {
        self.options.empty_arrays = policy;
        self
    }

    /// Set the element representation of the generated arrays.
    pub fn numeric_format(&mut self, format: NumericFormat) -> &mut Self {
        self.options.numeric_format = format;
        self
    }

    /// Rename groups matching `pattern`, see [`WeightExtractor::with_key_remap`].
    pub fn key_remap(&mut self, pattern: &str, replacement: &str) -> &mut Self {
        self.key_remap.push(KeyRemap::new(pattern.into(), replacement.into()));
        self
    }

    /// Set the first line comment of the generated files.
    pub fn top_comment(&mut self, comment: &str) -> &mut Self {
        self.options.top_comment = Some(comment.into());
        self
    }

    /// Run the export described by a configuration.
    ///
    /// The full pipeline runs when the configuration names an `input`; otherwise code is
    /// generated from its existing `document`.
    pub fn run_from_config(config: &ExportConfig) -> Result<ExportSummary, ExportError> {
        let export = Self::from_config(config);

        match config.input {
            Some(_) => export.run(),
            None => export.run_codegen(),
        }
    }

    /// Read the input container and write every requested output.
    pub fn run(&self) -> Result<ExportSummary, ExportError> {
        let input = self.input.as_ref().ok_or(ExportError::MissingPath("input"))?;

        log::info!("Reading {:?}", input);
        let container = SafetensorsContainer::from_file(input)?;

        self.run_with(&container)
    }

    /// Same as [`run`](Self::run), reading an already opened container.
    pub fn run_with<C: WeightContainer + ?Sized>(
        &self,
        container: &C,
    ) -> Result<ExportSummary, ExportError> {
        if self.listing.is_none() && self.document.is_none() && !self.generates_code() {
            return Err(ExportError::NoOutput);
        }

        let mut extractor = WeightExtractor::default();
        for remap in self.key_remap.iter() {
            extractor = extractor.with_key_remap(&remap.pattern, &remap.replacement)?;
        }
        let set = extractor.extract(container)?;

        let mut batch = OutputBatch::default();
        if let Some(path) = &self.listing {
            batch.push(path, render_listing(&set));
        }

        let document = CanonicalDocument::from_export_set(set)?;
        if let Some(path) = &self.document {
            let json = document.to_json().map_err(ExportError::Serialize)?;
            batch.push(path, json);
        }

        self.finish(&document, batch)
    }

    /// Generate code from the canonical document set with [`document`](Self::document).
    pub fn run_codegen(&self) -> Result<ExportSummary, ExportError> {
        let path = self.document.as_ref().ok_or(ExportError::MissingPath("document"))?;
        if !self.generates_code() {
            return Err(ExportError::NoOutput);
        }

        log::info!("Reading {:?}", path);
        let file = File::open(path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        let document = CanonicalDocument::from_reader(BufReader::new(file))?;

        self.finish(&document, OutputBatch::default())
    }

    fn generates_code(&self) -> bool {
        self.source.is_some() || self.header.is_some()
    }

    fn finish(
        &self,
        document: &CanonicalDocument,
        mut batch: OutputBatch,
    ) -> Result<ExportSummary, ExportError> {
        let mut declarations = 0;

        if self.generates_code() {
            let layers = plan(document, &self.options)?;
            declarations = layers.iter().map(|layer| layer.arrays.len()).sum();

            if let Some(path) = &self.source {
                let source = SourceGen::from_options(self.options.clone()).render(&layers);
                batch.push(path, source);
            }
            if let Some(path) = &self.header {
                let guard = path
                    .file_name()
                    .map(|name| guard_from_file_name(&name.to_string_lossy()))
                    .unwrap_or_else(|| HeaderGen::DEFAULT_GUARD.to_string());
                let header = HeaderGen::from_options(self.options.clone())
                    .with_guard(guard)
                    .render(&layers);
                batch.push(path, header);
            }
        }

        let written = batch.write()?;
        log::info!(
            "Exported {} layers and {} declarations to {} files",
            document.len(),
            declarations,
            written.len()
        );

        Ok(ExportSummary::new(document.len(), declarations, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodegenError, DecodeError};
    use pretty_assertions::assert_eq;
    use weightgen_store::{ContainerGroup, MemoryContainer};

    fn container() -> MemoryContainer {
        MemoryContainer::new()
            .with_group(
                ContainerGroup::new("conv1")
                    .with_tensor(0, vec![3, 1], vec![1.0, 2.0, 3.0])
                    .with_tensor(1, vec![1], vec![0.5]),
            )
            .with_group(ContainerGroup::new("flatten"))
    }

    const CONV1_SOURCE: &str = "// Layer: conv1\nfloat CONV1_KERNEL[] = {\n    1.00000000,\n    \
                                2.00000000,\n    3.00000000\n};\n\nfloat CONV1_BIAS[] = {\n    \
                                0.50000000\n};\n\n";

    #[test]
    fn writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();

        let summary = ExportGen::new()
            .listing(out.join("weights.txt"))
            .document(out.join("weights.json"))
            .source(out.join("weights.c"))
            .header(out.join("weights.h"))
            .run_with(&container())
            .unwrap();

        assert_eq!(summary.layers, 2);
        assert_eq!(summary.declarations, 2);
        assert_eq!(summary.written.len(), 4);
        assert_eq!(
            std::fs::read_to_string(out.join("weights.json")).unwrap(),
            r#"{"conv1":{"kernel":[1.0,2.0,3.0],"bias":[0.5]},"flatten":{}}"#
        );
        assert_eq!(
            std::fs::read_to_string(out.join("weights.txt")).unwrap(),
            "Layer: conv1\n  Kernel: 1.0 2.0 3.0\n  Bias: 0.5\n\nLayer: flatten\n\n"
        );
        assert_eq!(std::fs::read_to_string(out.join("weights.c")).unwrap(), CONV1_SOURCE);
        assert!(std::fs::read_to_string(out.join("weights.h"))
            .unwrap()
            .contains("extern float CONV1_KERNEL[CONV1_KERNEL_LEN];"));
    }

    #[test]
    fn codegen_from_an_earlier_document() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("weights.json");
        ExportGen::new().document(&document).run_with(&container()).unwrap();

        let summary = ExportGen::new()
            .document(&document)
            .source(dir.path().join("weights.c"))
            .run_codegen()
            .unwrap();

        assert_eq!(summary.written, vec![dir.path().join("weights.c")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("weights.c")).unwrap(),
            CONV1_SOURCE
        );
    }

    #[test]
    fn non_finite_values_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let container = MemoryContainer::new()
            .with_group(ContainerGroup::new("dense").with_tensor(0, vec![2], vec![1.0, f32::NAN]));

        let err = ExportGen::new()
            .listing(dir.path().join("weights.txt"))
            .document(dir.path().join("weights.json"))
            .run_with(&container)
            .unwrap_err();

        assert!(matches!(err, ExportError::Encoding(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn codegen_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let container = MemoryContainer::new()
            .with_group(ContainerGroup::new("Dense").with_tensor(1, vec![1], vec![1.0]))
            .with_group(ContainerGroup::new("dense").with_tensor(1, vec![1], vec![2.0]));

        let err = ExportGen::new()
            .document(dir.path().join("weights.json"))
            .source(dir.path().join("weights.c"))
            .run_with(&container)
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Codegen(CodegenError::NameCollision { .. })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn multiline_top_comment_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            document: Some(dir.path().join("weights.json")),
            header: Some(dir.path().join("weights.h")),
            top_comment: Some("LeNet\n#define CONV1_KERNEL_LEN 0".into()),
            ..ExportConfig::default()
        };

        let err = ExportGen::from_config(&config)
            .run_with(&container())
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Codegen(CodegenError::MultilineComment(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn applies_key_remap() {
        let dir = tempfile::tempdir().unwrap();
        let container = MemoryContainer::new()
            .with_group(ContainerGroup::new("conv2d_1").with_tensor(1, vec![1], vec![0.25]));

        ExportGen::new()
            .key_remap("conv2d_(\\d+)", "conv$1")
            .document(dir.path().join("weights.json"))
            .run_with(&container)
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("weights.json")).unwrap(),
            r#"{"conv1":{"bias":[0.25]}}"#
        );
    }

    #[test]
    fn from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            source: Some(dir.path().join("weights.c")),
            numeric_format: NumericFormat::Fixed { frac_bits: 10 },
            top_comment: Some("LeNet".into()),
            ..Default::default()
        };

        ExportGen::from_config(&config).run_with(&container()).unwrap();

        let source = std::fs::read_to_string(dir.path().join("weights.c")).unwrap();
        assert!(source.starts_with("// LeNet\n\n#include <stdint.h>\n\n// Layer: conv1\n"));
        assert!(source.contains("int32_t CONV1_BIAS_FIXED[] = {\n    512\n};"));
    }

    #[test]
    fn document_only_config_generates_code() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("weights.json");
        ExportGen::new().document(&document).run_with(&container()).unwrap();

        let config = ExportConfig {
            document: Some(document.clone()),
            source: Some(dir.path().join("weights.c")),
            ..Default::default()
        };
        let summary = ExportGen::run_from_config(&config).unwrap();

        assert_eq!(summary, ExportSummary::new(2, 2, vec![dir.path().join("weights.c")]));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("weights.c")).unwrap(),
            CONV1_SOURCE
        );
    }

    #[test]
    fn config_without_input_nor_document() {
        let config = ExportConfig {
            source: Some("weights.c".into()),
            ..Default::default()
        };

        assert!(matches!(
            ExportGen::run_from_config(&config),
            Err(ExportError::MissingPath("document"))
        ));
    }

    #[test]
    fn missing_paths() {
        assert!(matches!(
            ExportGen::new().source("weights.c").run(),
            Err(ExportError::MissingPath("input"))
        ));
        assert!(matches!(
            ExportGen::new().source("weights.c").run_codegen(),
            Err(ExportError::MissingPath("document"))
        ));
    }

    #[test]
    fn no_output() {
        assert!(matches!(
            ExportGen::new().run_with(&container()),
            Err(ExportError::NoOutput)
        ));
        assert!(matches!(
            ExportGen::new().document("weights.json").run_codegen(),
            Err(ExportError::NoOutput)
        ));
    }

    #[test]
    fn invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("weights.json");
        std::fs::write(&document, r#"{"conv1":{"kernel":"#).unwrap();

        let err = ExportGen::new()
            .document(&document)
            .source(dir.path().join("weights.c"))
            .run_codegen()
            .unwrap_err();

        assert!(matches!(err, ExportError::Decode(DecodeError::Json(_))));
        assert!(!dir.path().join("weights.c").exists());
    }
}
