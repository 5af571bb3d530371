use std::process::ExitCode;

use anyhow::Result;
use env_logger::Env;

use idlc::cli;

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    cli::run()
}
