//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// logship -- extract fields from log lines and ship them to a bulk indexing endpoint.
///
/// Reads lines from stdin (or follows a file), applies a regular expression with
/// named capture groups, and indexes one document per line.
#[derive(Parser, Debug)]
#[command(name = "logship", version, about, long_about = None)]
pub struct Cli {
    /// Path to a logship.toml configuration file (optional).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Destination index name template (strftime layout, e.g. logstash-%Y%m%d).
    #[arg(short, long)]
    pub index: Option<String>,

    /// Comma-separated bulk endpoint hosts (e.g. es1:9200,es2:9200).
    #[arg(long, value_delimiter = ',')]
    pub hosts: Option<Vec<String>>,

    /// Named built-in pattern (see --list).
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Freeform regular expression with named capture groups.
    #[arg(short, long)]
    pub regexp: Option<String>,

    /// Trace every stage (raw line, destination, fields) to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Echo each input line to stdout.
    #[arg(short, long, conflicts_with = "verbose")]
    pub echo: bool,

    /// List the built-in patterns and exit.
    #[arg(short, long)]
    pub list: bool,

    /// Follow a growing file instead of reading stdin.
    #[arg(short, long, value_name = "PATH")]
    pub follow: Option<PathBuf>,

    /// Start following from the beginning of the file instead of its end.
    #[arg(long, requires = "follow")]
    pub from_beginning: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Output format for listings.
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["logship"]).expect("parse succeeded");
        assert!(cli.config.is_none());
        assert!(cli.index.is_none());
        assert!(cli.hosts.is_none());
        assert!(cli.pattern.is_none());
        assert!(cli.regexp.is_none());
        assert!(!cli.verbose);
        assert!(!cli.echo);
        assert!(!cli.list);
        assert!(cli.follow.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parse_hosts_comma_separated() {
        let cli = Cli::try_parse_from(["logship", "--hosts", "es1:9200,es2:9200"])
            .expect("parse succeeded");
        assert_eq!(
            cli.hosts,
            Some(vec!["es1:9200".to_owned(), "es2:9200".to_owned()])
        );
    }

    #[test]
    fn test_cli_parse_pattern_and_index() {
        let cli = Cli::try_parse_from(["logship", "-p", "apache-access", "-i", "web-%Y.%m"])
            .expect("parse succeeded");
        assert_eq!(cli.pattern.as_deref(), Some("apache-access"));
        assert_eq!(cli.index.as_deref(), Some("web-%Y.%m"));
    }

    #[test]
    fn test_cli_parse_regexp() {
        let cli = Cli::try_parse_from(["logship", "--regexp", r"^(?P<level>\w+) (?P<msg>.*)$"])
            .expect("parse succeeded");
        assert_eq!(cli.regexp.as_deref(), Some(r"^(?P<level>\w+) (?P<msg>.*)$"));
    }

    #[test]
    fn test_cli_verbose_and_echo_conflict() {
        let err = Cli::try_parse_from(["logship", "--verbose", "--echo"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_cli_from_beginning_requires_follow() {
        let err = Cli::try_parse_from(["logship", "--from-beginning"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_parse_follow() {
        let cli = Cli::try_parse_from([
            "logship",
            "--follow",
            "/var/log/app.log",
            "--from-beginning",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.follow, Some(PathBuf::from("/var/log/app.log")));
        assert!(cli.from_beginning);
    }

    #[test]
    fn test_cli_parse_list_json() {
        let cli = Cli::try_parse_from(["logship", "--list", "--output", "json"])
            .expect("parse succeeded");
        assert!(cli.list);
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["logship", "--output", "yaml"]).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), "logship");
    }
}
