use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ftpvault", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, global = true)]
    pub dry_run: bool,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'h')]
    pub help: bool,
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    Schedule,
    Run(RunArgs),
    Test(TestArgs),
    List,
    Init(InitArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    pub job: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TestArgs {
    pub profile: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    #[arg(long)]
    pub force: bool,
}
