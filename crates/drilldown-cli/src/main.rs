//! Drilldown CLI - compile dashboard drill-down filters from the command line
//!
//! This is the main entry point for the `drilldown` binary. It compiles
//! recorded drill-down requests, lists the report registry and manages the
//! configuration file.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

fn main() {
    let cli = Cli::parse_args();

    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error::format_error_chain(&e, cli.use_color()));
            process::exit(e.exit_code());
        }
    };

    control::set_override(cli.use_color() && config.output.color);

    let guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    if let Err(e) = run(cli, config) {
        eprintln!(
            "{}",
            error::format_error_chain(&e, control::SHOULD_COLORIZE.should_colorize())
        );

        if e.should_show_help() {
            eprintln!("\nFor more information, try '--help'");
        }

        // process::exit skips destructors; flush file logs first
        drop(guard);
        process::exit(e.exit_code());
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = cli.output_format(&config.output.format);
    let use_color = cli.use_color() && config.output.color;
    let mut output = OutputWriter::new(format, use_color, cli.quiet, config.output.progress);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Compile(args) => handlers::handle_compile(args, &config, &mut output),
        Commands::Reports(args) => handlers::handle_reports(args, &config, &mut output),
        Commands::Config(args) => {
            handlers::handle_config(args, &config, cli.config.as_deref(), &mut output)
        }
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system from flags, config file and environment
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);
    logging_config.apply_file_defaults(verbosity, &config.logging);
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["drilldown", "-vv", "compile", "click.json"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["drilldown", "--quiet", "compile", "click.json"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
