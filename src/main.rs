use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tagsweep::{
    AnonymizationSpec, Driver, ExternalTools, MissingTagPolicy, RunConfig, RunError,
};

#[derive(Parser, Debug)]
#[command(
    name = "tagsweep",
    version,
    about = "Anonymize and convert trees of medical image metadata"
)]
struct Cli {
    /// Root of the input tree
    #[arg(short = 'i', long)]
    input_dir: PathBuf,

    /// Root of the mirrored output tree (created if absent)
    #[arg(short = 'o', long)]
    output_dir: PathBuf,

    /// Inline JSON substitution spec, e.g. '{"PatientName": "anon"}'
    #[arg(long, conflicts_with = "spec_file")]
    spec: Option<String>,

    /// Path to a JSON substitution spec file
    #[arg(long)]
    spec_file: Option<PathBuf>,

    /// Skip anonymization; convert and describe only
    #[arg(long)]
    no_anon: bool,

    /// Only read input files with this extension
    #[arg(short = 'e', long)]
    extension: Option<String>,

    /// What to do when a template references an absent tag
    #[arg(long, value_enum, default_value_t = MissingTagPolicy::FailRecord)]
    on_missing_tag: MissingTagPolicy,

    /// Concurrent node workers (defaults to the CPU count)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Raster conversion executable
    #[arg(long, default_value = "dcmj2pnm")]
    convert_exec: PathBuf,

    /// Thumbnail resize executable
    #[arg(long, default_value = "mogrify")]
    resize_exec: PathBuf,

    /// Preview strip compositing executable
    #[arg(long, default_value = "convert")]
    composite_exec: PathBuf,

    /// Geometry for preview thumbnails
    #[arg(long, default_value = "96x96")]
    thumb_size: String,

    /// Write the run report here instead of printing it
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn,tagsweep=info",
        1 => "info,tagsweep=debug",
        _ => "debug,tagsweep=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

async fn run(cli: Cli) -> Result<bool, RunError> {
    let spec = match (&cli.spec, &cli.spec_file) {
        (Some(raw), _) => AnonymizationSpec::from_json(raw)?,
        (None, Some(path)) => AnonymizationSpec::from_file(path)?,
        (None, None) => AnonymizationSpec::default(),
    };

    let tools = ExternalTools {
        convert: cli.convert_exec,
        resize: cli.resize_exec,
        composite: cli.composite_exec,
    };

    let mut config = RunConfig::new(cli.input_dir, cli.output_dir)
        .with_spec(spec)
        .with_anonymize(!cli.no_anon)
        .with_missing_tag(cli.on_missing_tag)
        .with_extension(cli.extension)
        .with_tools(tools)
        .with_thumbnail_geometry(cli.thumb_size);
    if let Some(jobs) = cli.jobs {
        config = config.with_workers(jobs);
    }

    let report = Driver::new(config).run().await?;

    match &cli.report {
        Some(path) => report.write_to(path)?,
        None => {
            let rendered =
                serde_json::to_string_pretty(&report).map_err(|e| RunError::ReportWrite {
                    path: PathBuf::from("-"),
                    source: io::Error::new(io::ErrorKind::InvalidData, e),
                })?;
            println!("{rendered}");
        }
    }
    Ok(report.status)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}
