//! Effective configuration assembly
//!
//! Layers the configuration sources in precedence order:
//! CLI flags > `LOGSHIP_*` environment variables > TOML file > defaults.

use logship_core::config::LogshipConfig;

use crate::cli::Cli;
use crate::error::CliError;

/// Load the file (if any), apply env overrides, then CLI flags, then validate.
pub async fn load_effective(cli: &Cli) -> Result<LogshipConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => LogshipConfig::from_file(path).await?,
        None => LogshipConfig::default(),
    };
    config.apply_env_overrides()?;
    apply_cli_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

/// Apply command-line flags on top of an already-loaded configuration.
///
/// `--regexp` clears a named pattern from lower layers so the freeform
/// pattern takes effect; `--pattern` wins when both flags are given.
pub fn apply_cli_overrides(config: &mut LogshipConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
    if let Some(template) = &cli.index {
        config.index.template = template.clone();
    }
    if let Some(hosts) = &cli.hosts {
        config.sink.hosts = hosts
            .iter()
            .map(|h| h.trim().to_owned())
            .filter(|h| !h.is_empty())
            .collect();
    }
    if let Some(regexp) = &cli.regexp {
        config.pattern.regexp = regexp.clone();
        config.pattern.name.clear();
    }
    if let Some(name) = &cli.pattern {
        config.pattern.name = name.clone();
    }
}
