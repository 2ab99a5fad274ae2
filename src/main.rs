use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use enroll::api::Submitter;
use enroll::backoff::{BackoffController, TokioDelay};
use enroll::cli::{Cli, Command};
use enroll::config::EnrollConfig;
use enroll::logging::{self, EventSink, TracingSink};
use enroll::pipeline::{Pipeline, load_records};
use enroll::ui::RunProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EnrollConfig::load_from(path)?,
        None => EnrollConfig::load()?,
    };
    config.apply_cli(&cli);

    let _guard = logging::init(&config.log_file, cli.verbose)?;
    println!(
        "Errors and logs are being written to: {}",
        config.log_file.display()
    );

    match &cli.command {
        Command::Import { file } => import(&config, file, cli.verbose).await,
        Command::Check { file } => check(file),
    }
}

async fn import(config: &EnrollConfig, file: &Path, verbose: bool) -> Result<()> {
    config.validate()?;

    let sink: Arc<dyn EventSink> = Arc::new(TracingSink);
    let submitter = Submitter::with_timeout(config.timeout(), sink.clone())?;
    let backoff = BackoffController::new(
        config.max_retries,
        config.base_interval(),
        TokioDelay,
        sink.clone(),
    );
    let pipeline = Pipeline::new(submitter, backoff, sink);

    let mut progress = RunProgress::new();
    let summary = pipeline
        .run_file(file, &config.endpoint_url, &config.api_token, &mut progress)
        .await?;

    if let Some(err) = &summary.source_error {
        progress.source_error(err);
    }
    progress.finish(&summary);
    if verbose && !summary.is_empty() {
        progress.print_report(&summary);
    }
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    let mut ui = RunProgress::new();
    let (records, source_error) = load_records(file, &TracingSink);
    if let Some(err) = &source_error {
        ui.source_error(err);
    }
    tracing::info!(records = records.len(), "Checking records");
    ui.print_check(&records);
    Ok(())
}
