//! Shipping handler: read lines, extract, index, drain on shutdown.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use logship_core::config::LogshipConfig;
use logship_core::pipeline::Sink;
use logship_pipeline::{
    BulkSink, BulkSinkConfig, FileFollower, FileFollowerConfig, HttpBulkTransport, LogPipeline,
    LogPipelineBuilder, LogPipelineError, OutputMode, PipelineConfig, PipelineReport,
    ReaderSource, StartPosition,
};

use crate::cli::Cli;
use crate::error::CliError;

/// Per-invocation options that do not live in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub output_mode: OutputMode,
    pub follow: Option<PathBuf>,
    pub start_at: StartPosition,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let output_mode = OutputMode::from_flags(cli.verbose, cli.echo)
            .map_err(|e| CliError::Usage(e.to_string()))?;
        let start_at = if cli.from_beginning {
            StartPosition::Beginning
        } else {
            StartPosition::End
        };
        Ok(Self {
            output_mode,
            follow: cli.follow.clone(),
            start_at,
        })
    }
}

/// Build the pipeline for `sink`, resolving the pattern and index template up front.
pub fn build_pipeline<S: Sink>(
    config: &LogshipConfig,
    output_mode: OutputMode,
    sink: S,
) -> Result<LogPipeline<S>, CliError> {
    let pipeline_config = PipelineConfig::from_core(config).with_output_mode(output_mode);
    Ok(LogPipelineBuilder::new(sink).config(pipeline_config).build()?)
}

/// Ship lines from stdin or the followed file until end of input or a stop signal.
pub async fn execute(
    config: &LogshipConfig,
    options: &RunOptions,
) -> Result<PipelineReport, CliError> {
    let transport =
        HttpBulkTransport::from_core(&config.sink).map_err(|e| CliError::Config(e.to_string()))?;
    info!(endpoints = ?transport.endpoints(), "bulk transport ready");

    let sink = BulkSink::spawn(BulkSinkConfig::from_core(&config.sink), transport);
    let pipeline = build_pipeline(config, options.output_mode, sink)?;

    let report = match &options.follow {
        Some(path) => {
            let follower_config =
                FileFollowerConfig::from_core(path, &config.source).start_at(options.start_at);
            let follower = FileFollower::open(follower_config)
                .await
                .map_err(LogPipelineError::from)?;
            pipeline.run(follower, shutdown_signal()).await?
        }
        None => pipeline.run(ReaderSource::stdin(), shutdown_signal()).await?,
    };

    info!(
        lines = report.stats.lines_read,
        unmatched = report.stats.lines_unmatched,
        dispatched = report.drain.dispatched,
        acknowledged = report.drain.acknowledged,
        stopped_by = ?report.stopped_by,
        "logship finished"
    );
    if !report.drain.acknowledged {
        tracing::warn!("sink did not confirm the drain before the grace period ended");
    }

    Ok(report)
}

/// Resolves when SIGINT or SIGTERM arrives.
///
/// If the handlers cannot be installed the future never resolves and the
/// pipeline runs until end of input.
pub async fn shutdown_signal() {
    match wait_for_shutdown_signal().await {
        Ok(signal) => info!(signal, "shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "signal handlers unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl-C handler: {}", e))?;
    Ok("SIGINT")
}
