//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// webcal - query events of iCalendar feeds
#[derive(Debug, Parser)]
#[command(name = "webcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "WEBCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Nearest occurrence of every event at or before WHEN
    Before {
        #[command(flatten)]
        source: SourceArgs,

        /// Date, date-time, RFC 3339 instant or `now`
        when: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Nearest occurrence of every event at or after WHEN
    After {
        #[command(flatten)]
        source: SourceArgs,

        /// Date, date-time, RFC 3339 instant or `now`
        when: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Every occurrence between START and END, inclusive
    Between {
        #[command(flatten)]
        source: SourceArgs,

        /// Range start
        start: String,

        /// Range end
        end: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the time zones defined by the calendar
    Timezones {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List the events of the calendar
    Events {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Which calendar to load.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Calendar URL (http, https, webcal), file:// URL or path
    pub locator: String,

    /// Login used for the calendar; part of the cache identity
    #[arg(long, short, env = "WEBCAL_USER")]
    pub user: Option<String>,

    /// Fetch the calendar even if the cached copy is fresh
    #[arg(long)]
    pub refresh: bool,

    /// Serve cached copies up to this many hours old
    #[arg(long)]
    pub staleness_hours: Option<u64>,
}

/// Output options.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_between() {
        let cli = Cli::try_parse_from([
            "webcal",
            "-vv",
            "between",
            "https://example.com/team.ics",
            "2024-03-01",
            "2024-03-31",
            "--json",
            "--user",
            "alice",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Between {
                source,
                start,
                end,
                output,
            } => {
                assert_eq!(source.locator, "https://example.com/team.ics");
                assert_eq!(source.user.as_deref(), Some("alice"));
                assert!(!source.refresh);
                assert_eq!(start, "2024-03-01");
                assert_eq!(end, "2024-03-31");
                assert!(output.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_after_with_cache_flags() {
        let cli = Cli::try_parse_from([
            "webcal",
            "after",
            "cal.ics",
            "now",
            "--refresh",
            "--staleness-hours",
            "2",
        ])
        .unwrap();

        match cli.command {
            Command::After { source, when, output } => {
                assert_eq!(when, "now");
                assert!(source.refresh);
                assert_eq!(source.staleness_hours, Some(2));
                assert!(!output.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["webcal", "config", "path", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn between_requires_both_bounds() {
        assert!(Cli::try_parse_from(["webcal", "between", "cal.ics", "2024-03-01"]).is_err());
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["webcal"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
