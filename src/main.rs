use adfps::{
    cli::{Cli, OutputFormat},
    config::AnalysisConfig,
    pipeline::{self, PipelineConfig},
};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber on stderr
///
/// Warnings are always shown; `--debug` raises the level to trace and
/// `RUST_LOG` overrides both.
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut analysis = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::embedded()?,
    };
    if let Some(policy) = args.missing_signal {
        analysis.missing_signal_policy = policy;
    }
    if let Some(policy) = args.duplicates {
        analysis.duplicate_policy = policy;
    }

    let config = PipelineConfig {
        input: args.input,
        output: args.output,
        analysis,
        format: args.format,
        expect_files: args.expect_files,
    };

    let report = pipeline::run(&config)?;

    if matches!(config.format, OutputFormat::Json) {
        println!("{}", report.to_json()?);
    }

    let failed: Vec<&str> = report.failed_artifacts().map(|a| a.name.as_str()).collect();
    if !failed.is_empty() {
        anyhow::bail!(
            "{} artifact(s) could not be written: {}",
            failed.len(),
            failed.join(", ")
        );
    }

    Ok(())
}
