mod app;
mod cli;
mod config;
mod effects;
mod history;
mod render;

use std::process::ExitCode;

use clap::Parser;
use narrator_logging::narrator_error;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match app::run(cli) {
        Ok(code) => code,
        Err(err) => {
            narrator_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
