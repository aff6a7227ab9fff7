// Copyright 2022 Oxide Computer Company

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".bright_red(), e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every table was lowered.
fn run() -> Result<bool> {
    let opts = x4c::Opts::parse();
    let log = x4c::logger();
    let outcome = x4c::compile(&opts, &log)?;
    Ok(outcome.failed.is_empty())
}
