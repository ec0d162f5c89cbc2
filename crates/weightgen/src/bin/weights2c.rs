use std::{path::PathBuf, process::ExitCode};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use weightgen::{
    init_log, EmptyArrayPolicy, ExportConfig, ExportError, ExportGen, ExportSummary, NumericFormat,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logs
    #[clap(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the weights of a safetensors container
    Extract(ExtractArgs),
    /// Generate C declarations from a canonical document
    Codegen(CodegenArgs),
    /// Run the export described by a JSON configuration file
    Run {
        /// Configuration file
        #[clap(short = 'c', long = "config", value_name = "FILE")]
        config: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct ExtractArgs {
    /// Weight container, with `layers/<name>/vars/<slot>` keys
    #[clap(value_name = "INPUT")]
    input: PathBuf,

    /// Write the human-readable listing
    #[clap(short = 'l', long = "listing", value_name = "FILE")]
    listing: Option<PathBuf>,

    /// Write the canonical JSON document
    #[clap(short = 'd', long = "document", value_name = "FILE")]
    document: Option<PathBuf>,

    /// Rename groups matching PATTERN, first matching rule wins
    #[clap(long = "remap", value_name = "PATTERN=REPLACEMENT", value_parser = parse_remap)]
    remap: Vec<(String, String)>,

    #[clap(flatten)]
    codegen: CodegenOutputs,
}

#[derive(ClapArgs, Debug)]
struct CodegenArgs {
    /// Canonical JSON document produced by `extract`
    #[clap(value_name = "DOCUMENT")]
    document: PathBuf,

    #[clap(flatten)]
    codegen: CodegenOutputs,
}

#[derive(ClapArgs, Debug)]
struct CodegenOutputs {
    /// Write the C source
    #[clap(short = 's', long = "source", value_name = "FILE")]
    source: Option<PathBuf>,

    /// Write the C header
    #[clap(short = 'H', long = "header", value_name = "FILE")]
    header: Option<PathBuf>,

    /// Handling of empty weight arrays
    #[clap(long = "empty-arrays", value_enum, default_value_t = EmptyArrays::Skip)]
    empty_arrays: EmptyArrays,

    /// Emit int32_t fixed-point arrays with FRAC_BITS fractional bits
    #[clap(
        long = "fixed-point",
        value_name = "FRAC_BITS",
        num_args = 0..=1,
        default_missing_value = "10"
    )]
    fixed_point: Option<u32>,

    /// Comment written on the first line of the generated files
    #[clap(long = "comment", value_name = "TEXT")]
    comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmptyArrays {
    /// Omit the declaration
    Skip,
    /// Fail the run
    Error,
}

impl From<EmptyArrays> for EmptyArrayPolicy {
    fn from(value: EmptyArrays) -> Self {
        match value {
            EmptyArrays::Skip => EmptyArrayPolicy::Skip,
            EmptyArrays::Error => EmptyArrayPolicy::Error,
        }
    }
}

fn parse_remap(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(pattern, replacement)| (pattern.to_string(), replacement.to_string()))
        .ok_or_else(|| format!("expected PATTERN=REPLACEMENT, got `{value}`"))
}

impl CodegenOutputs {
    fn apply(&self, export: &mut ExportGen) {
        if let Some(source) = &self.source {
            export.source(source);
        }
        if let Some(header) = &self.header {
            export.header(header);
        }
        if let Some(frac_bits) = self.fixed_point {
            export.numeric_format(NumericFormat::Fixed { frac_bits });
        }
        if let Some(comment) = &self.comment {
            export.top_comment(comment);
        }
        export.empty_arrays(self.empty_arrays.into());
    }
}

fn execute(command: Commands) -> Result<ExportSummary, ExportError> {
    match command {
        Commands::Extract(args) => {
            let mut export = ExportGen::new();
            export.input(&args.input);
            if let Some(listing) = &args.listing {
                export.listing(listing);
            }
            if let Some(document) = &args.document {
                export.document(document);
            }
            for (pattern, replacement) in args.remap.iter() {
                export.key_remap(pattern, replacement);
            }
            args.codegen.apply(&mut export);

            export.run()
        }
        Commands::Codegen(args) => {
            let mut export = ExportGen::new();
            export.document(&args.document);
            args.codegen.apply(&mut export);

            export.run_codegen()
        }
        Commands::Run { config } => ExportGen::run_from_config(&ExportConfig::load(config)?),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_log(level).ok();

    match execute(args.command) {
        Ok(summary) => {
            for path in summary.written.iter() {
                log::info!("Wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
