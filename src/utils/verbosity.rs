use clap::ValueEnum;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// The output verbosity level of the logger.
///
/// ```
/// use cluster_dynamics::Verbosity;
/// use log::LevelFilter;
///
/// assert_eq!(Verbosity::Debug.to_string(), "debug");
/// assert_eq!(LevelFilter::from(Verbosity::Warn), LevelFilter::Warn);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
pub enum Verbosity {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // lowercase, same spelling as the RUST_LOG levels
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Error => LevelFilter::Error,
            Verbosity::Warn => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }
}
