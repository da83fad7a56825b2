//! webcal CLI entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use webcal_client::cli::{Cli, Command, ConfigAction};
use webcal_client::commands;
use webcal_client::commands::query::{Window, parse_when};
use webcal_client::config::ClientConfig;
use webcal_client::error::ClientResult;
use webcal_client::webcal::WebCal;
use webcal_core::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let verbosity = if config.debug {
        cli.verbose.max(2)
    } else {
        cli.verbose
    };
    if let Err(e) = init_tracing(TracingConfig::for_verbosity(verbosity)) {
        eprintln!("warning: {}", e);
    }

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &ClientConfig) -> ClientResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Config { action } => {
            let path = cli.config.unwrap_or_else(ClientConfig::default_path);
            match action {
                ConfigAction::Dump => commands::config::dump(config, &path, &mut out),
                ConfigAction::Validate => commands::config::validate(config, &mut out),
                ConfigAction::Path => commands::config::path(config, &path, &mut out),
            }
        }
        Command::Before {
            source,
            when,
            output,
        } => {
            let window = Window::Before(parse_when(&when)?);
            let mut webcal = WebCal::from_config(config)?;
            commands::query::run(&mut webcal, &source, window, output, &mut out)
        }
        Command::After {
            source,
            when,
            output,
        } => {
            let window = Window::After(parse_when(&when)?);
            let mut webcal = WebCal::from_config(config)?;
            commands::query::run(&mut webcal, &source, window, output, &mut out)
        }
        Command::Between {
            source,
            start,
            end,
            output,
        } => {
            let window = Window::Between(parse_when(&start)?, parse_when(&end)?);
            let mut webcal = WebCal::from_config(config)?;
            commands::query::run(&mut webcal, &source, window, output, &mut out)
        }
        Command::Timezones { source } => {
            let mut webcal = WebCal::from_config(config)?;
            commands::calendar::timezones(&mut webcal, &source, &mut out)
        }
        Command::Events { source, output } => {
            let mut webcal = WebCal::from_config(config)?;
            commands::calendar::events(&mut webcal, &source, output, &mut out)
        }
    }?;

    out.flush()?;
    Ok(())
}
