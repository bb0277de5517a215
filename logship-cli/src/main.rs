use clap::Parser;

use logship_cli::cli::Cli;
use logship_cli::commands::run::RunOptions;
use logship_cli::error::CliError;
use logship_cli::output::OutputWriter;
use logship_cli::{commands, config, logging, metrics_server};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "logship failed");
            eprintln!("logship: {e}");
            e.exit_code()
        }
    };

    // stdin 읽기 스레드를 기다리지 않고 종료
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if cli.list {
        let writer = OutputWriter::new(cli.output);
        return commands::patterns::execute(&writer);
    }

    let options = RunOptions::from_cli(&cli)?;
    let config = config::load_effective(&cli).await?;

    logging::init_tracing(&config.general).map_err(|e| CliError::Setup(e.to_string()))?;
    tracing::info!(
        config = ?cli.config,
        follow = ?options.follow,
        "logship starting"
    );

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)
            .map_err(|e| CliError::Setup(e.to_string()))?;
    }

    commands::run::execute(&config, &options).await?;
    Ok(())
}
