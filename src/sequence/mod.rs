//! Per-sequence mutation diagnostics.


use crate::utils;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::default::Default;
use std::fmt::Debug;
use std::path::Path;

// ----------------------------------------------------------------------------
// Diagnostic
// ----------------------------------------------------------------------------

/// Reduced representation of a sequence, as the genomic coordinates of its mutations.
///
/// Coordinates are 1-based nucleotide positions, relative to the reference.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Unique sequence identifier.
    pub strain: String,
    /// Coordinates of single-nucleotide substitutions.
    pub substitutions: BTreeSet<usize>,
    /// Coordinates of deleted bases.
    pub deletions: BTreeSet<usize>,
}

impl Diagnostic {
    /// Parse a diagnostic record from its comma-separated substitution and gap lists.
    ///
    /// ```
    /// use cluster_dynamics::sequence::Diagnostic;
    ///
    /// let diagnostic = Diagnostic::new("Spain/VC-1/2020", "22227,28932,29645", "")?;
    /// assert!(diagnostic.substitutions.contains(&22227));
    /// assert!(diagnostic.deletions.is_empty());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new(strain: &str, all_snps: &str, gap_list: &str) -> Result<Self, Report> {
        let substitutions = parse_coords(all_snps)
            .wrap_err_with(|| format!("Failed to parse all_snps of {strain}: {all_snps:?}"))?;
        let deletions = parse_coords(gap_list)
            .wrap_err_with(|| format!("Failed to parse gap_list of {strain}: {gap_list:?}"))?;
        Ok(Diagnostic { strain: strain.to_string(), substitutions, deletions })
    }
}

/// Parse a comma-separated list of coordinates. An empty list has no mutations.
pub fn parse_coords(text: &str) -> Result<BTreeSet<usize>, Report> {
    text.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.parse::<usize>().wrap_err_with(|| format!("Invalid coordinate: {c:?}")))
        .collect()
}

// ----------------------------------------------------------------------------
// Reader
// ----------------------------------------------------------------------------

/// Stream the records of a diagnostics table (`strain`, `all_snps`, `gap_list`).
///
/// The table is never held in memory all at once. If `progress` is true,
/// a spinner counts the records as they are read.
pub fn read_diagnostics<P>(
    path: &P,
    progress: bool,
) -> Result<impl Iterator<Item = Result<Diagnostic, Report>>, Report>
where
    P: AsRef<Path> + Debug,
{
    let delim = utils::get_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .flexible(true)
        .quoting(false)
        .from_reader(utils::open_reader(path)?);

    let progress_bar = match progress {
        true => {
            let style = ProgressStyle::with_template(
                "{spinner} {pos} sequences | Sequences / Second: {per_sec} | Elapsed: {elapsed_precise}",
            )
            .wrap_err("Failed to create progress bar from template.")?;
            ProgressBar::new_spinner().with_style(style)
        }
        false => ProgressBar::hidden(),
    };

    let headers = reader.headers().wrap_err_with(|| format!("Failed to read table headers: {path:?}"))?;
    let position = |name: &str| headers.iter().position(|h| h == name);
    let strain_i = position("strain")
        .ok_or_else(|| eyre!("Column 'strain' was not found in diagnostics: {path:?}"))
        .suggestion("Diagnostics tables need a 'strain' column.")?;
    let (snps_i, gaps_i) = (position("all_snps"), position("gap_list"));

    // missing columns and trailing values read as empty
    let value = |record: &StringRecord, i: Option<usize>| -> String {
        i.and_then(|i| record.get(i)).unwrap_or_default().to_string()
    };

    let path = path.as_ref().to_path_buf();
    let records = reader.into_records().map(move |record| {
        progress_bar.inc(1);
        let record = record.wrap_err_with(|| format!("Failed to read diagnostics row: {path:?}"))?;
        let strain = value(&record, Some(strain_i));
        Diagnostic::new(&strain, &value(&record, snps_i), &value(&record, gaps_i))
    });

    Ok(records)
}
