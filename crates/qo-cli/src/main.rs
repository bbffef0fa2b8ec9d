//! qopt CLI - inspect the operator catalog, check and evaluate YAML plans

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{check, eval, ops};

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Ops(args) => ops::execute(args, &cli.global),
        cli::Commands::Check(args) => check::execute(args, &cli.global),
        cli::Commands::Eval(args) => eval::execute(args, &cli.global),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        if let Some(ExitCode(code)) = err.downcast_ref::<ExitCode>() {
            std::process::exit(*code);
        }
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
