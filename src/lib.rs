//! `cluster-dynamics` tracks how named mutation **clusters** spread across countries over time.
//!
//! Given sequence metadata and a table of per-sequence mutation diagnostics, it:
//!
//! 1. Matches sequences to clusters defined by substitutions, deletions, or host.
//! 1. Removes known bad sequences and sequences with incomplete collection dates.
//! 1. Counts cluster and total sequences per country and ISO week.
//! 1. Smooths the weekly counts and trims a trailing week that looks incomplete.
//! 1. Writes strain lists, country tables, markdown pages, and JSON series for plotting.

pub mod cli;
pub mod cluster;
pub mod export;
pub mod metadata;
pub mod prompt;
pub mod run;
pub mod sequence;
pub mod summary;
pub mod table;
pub mod timeseries;
pub mod utils;

#[doc(inline)]
pub use crate::cli::Cli;
#[doc(inline)]
pub use table::Table;
#[doc(inline)]
pub use utils::verbosity::Verbosity;
