use clap::Parser;
use cluster_dynamics::cluster::list;
use cluster_dynamics::{cli, cli::Cli, run};
use color_eyre::eyre::{Report, Result};

fn main() -> Result<(), Report> {
    // ------------------------------------------------------------------------
    // CLI Setup

    // Parse CLI parameters
    let args = Cli::parse();

    // initialize color_eyre crate for colorized logs
    color_eyre::install()?;

    // initialize env_logger crate for logging/verbosity level
    env_logger::Builder::new().filter_level(args.verbosity.into()).init();

    // check which CLI command we're running (run, list)
    match args.command {
        cli::Command::Run(args) => _ = run::run(&args)?,
        cli::Command::List(args) => _ = list::clusters(&args)?,
    }

    Ok(())
}
