use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{exit_for_error, init, list, run as run_cmd, schedule, test};
use crate::types::RunMode;

const CONFIG_FILE: &str = "/etc/ftpvault.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const LICENSE_NAME: &str = "GNU GPL v3 or later";

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    if cli.help {
        print_banner();
        print_help();
        return Ok(());
    }
    if cli.version {
        print_banner();
        println!("License: {}", LICENSE_NAME);
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let run_mode = RunMode {
        dry_run: cli.dry_run,
    };

    let command = cli.command.clone().unwrap_or(Command::Schedule);
    let result = match command {
        Command::Schedule => schedule::run_schedule(&config_path, run_mode),
        Command::Run(args) => run_cmd::run_job_command(&config_path, &args.job, run_mode),
        Command::Test(args) => test::run_test(&config_path, args.profile.as_deref()),
        Command::List => list::run_list(&config_path),
        Command::Init(args) => init::run_init(&config_path, args.force),
    };
    if let Err(err) = result {
        exit_for_error(&err);
    }
    Ok(())
}

fn parse_cli() -> Cli {
    match Cli::try_parse_from(env::args()) {
        Ok(cli) => cli,
        Err(err) => {
            if err.kind() == ErrorKind::DisplayHelp {
                print_banner();
                println!("{}", err);
                std::process::exit(0);
            }
            if err.kind() == ErrorKind::UnknownArgument {
                if let Some(arg) = err.context().find_map(|c| {
                    if let clap::error::ContextKind::InvalidArg = c.0 {
                        Some(c.1.to_string())
                    } else {
                        None
                    }
                }) {
                    println!("unknown option {}", arg);
                    std::process::exit(2);
                }
            }
            println!("{}", err);
            std::process::exit(2);
        }
    }
}

fn print_banner() {
    println!("ftpvault {}", VERSION);
}

fn print_help() {
    println!("Usage:");
    println!("  ftpvault [schedule] [options]");
    println!("  ftpvault run <job> [options]");
    println!("  ftpvault test [<profile>] [options]");
    println!("  ftpvault list [options]");
    println!("  ftpvault init [--force] [options]");
    println!("  ftpvault --version");
    println!();
    println!("Options:");
    println!("  --config <path>        Config file path (default {})", CONFIG_FILE);
    println!("  --dry-run              Log what would be downloaded, write nothing");
    println!("  --verbose              Debug logging (RUST_LOG overrides)");
    println!("  --force                Overwrite an existing config (init)");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
