//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::{cluster::list, run, Verbosity};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function. This is achieved with the `parse` function, which parses the command line arguments from [`std::env::args`](https://doc.rust-lang.org/std/env/fn.args.html).
/// ```no_run
/// use clap::Parser;
/// let args = cluster_dynamics::Cli::parse();
/// ```
/// The command-line arguments from `std::env::args` are simply a vector of space separated strings. Here is a manual example of setting the command-line input:
/// ```rust
/// # use clap::Parser;
/// use cluster_dynamics::cli::Command;
///
/// let input = ["cluster-dynamics", "run", "--clusters", "S501", "--write-files", "false", "--min-sequences", "10"];
/// let args = cluster_dynamics::Cli::parse_from(input);
/// match args.command {
///     Command::Run(args) => {
///         assert_eq!(args.clusters.as_deref(), Some("S501"));
///         assert_eq!(args.write_files, Some(false));
///         assert_eq!(args.min_sequences, 10);
///         assert_eq!(args.plot_cutoff, 100);
///     }
///     Command::List(_) => unreachable!(),
/// }
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "cluster-dynamics", author, version)]
#[clap(about = "cluster-dynamics tracks the spread of mutation clusters in genomic surveillance data.")]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants). Used to decide which runtime [Command](#variants) the CLI arguments should be passed to.
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    /// Pass CLI arguments to the [run](crate::run::run()) method.
    #[clap(about = "Match sequences to clusters and write cluster reports.")]
    Run(run::Args),

    /// Pass CLI arguments to the cluster [list](crate::cluster::list::clusters()) method.
    #[clap(about = "List clusters in the catalog.")]
    List(list::Args),
}
