//! Sequence metadata (collection date and location) and the bad-sequence denylist.


use crate::utils;
use crate::Table;
use color_eyre::eyre::{Report, Result, WrapErr};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fmt::Debug;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// Columns used to acknowledge the labs and authors behind each sequence.
pub const ACKNOWLEDGEMENT_HEADERS: &[&str] =
    &["strain", "gisaid_epi_isl", "originating_lab", "submitting_lab", "authors"];

// ----------------------------------------------------------------------------
// Subdivision

/// Sub-national regions that are reported on their own instead of under their parent country.
///
/// A sequence whose `division` is a subdivision is counted under the
/// subdivision, never under its parent `country`.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, PartialEq)]
pub enum Subdivision {
    England,
    Scotland,
    Wales,
    #[strum(serialize = "Northern Ireland")]
    NorthernIreland,
}

impl Subdivision {
    /// Return true if the region name is a subdivision.
    ///
    /// ```
    /// use cluster_dynamics::metadata::Subdivision;
    ///
    /// assert!(Subdivision::contains("Northern Ireland"));
    /// assert!(!Subdivision::contains("United Kingdom"));
    /// ```
    pub fn contains(region: &str) -> bool {
        Subdivision::from_str(region).is_ok()
    }
}

// ----------------------------------------------------------------------------
// Record

/// The metadata fields of one sequence needed for matching and aggregation.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Record {
    pub strain: String,
    /// Collection date, `YYYY-MM-DD` when complete.
    pub date: String,
    pub country: String,
    pub division: String,
    pub host: String,
    /// Row index (0-based) in the source metadata table.
    pub row: usize,
}

impl Record {
    /// The reporting region: the division for [`Subdivision`]s, otherwise the country.
    pub fn region(&self) -> &str {
        match Subdivision::contains(&self.division) {
            true => &self.division,
            false => &self.country,
        }
    }

    /// Return true if the collection date is a complete, real calendar date.
    pub fn has_valid_date(&self) -> bool {
        utils::parse_date(&self.date).is_some()
    }
}

// ----------------------------------------------------------------------------
// Metadata

/// A metadata table, with typed records for the columns of interest.
///
/// All source columns are kept in [`Metadata::table`] so that subsets can be
/// written out unchanged.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    pub table: Table<String>,
    pub records: Vec<Record>,
}

impl Metadata {
    /// Read metadata from a delimited (and optionally zstd-compressed) file.
    pub fn read<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug,
    {
        info!("Reading metadata: {path:?}");
        let table = Table::read(path, None)?;
        let metadata = Metadata::from_table(table)
            .wrap_err_with(|| format!("Failed to parse metadata: {path:?}"))?;
        info!("Metadata sequences: {}", metadata.records.len());
        Ok(metadata)
    }

    /// Parse metadata records from a table.
    ///
    /// The `strain`, `date`, and `country` columns are required, `division` and `host`
    /// default to empty values when missing.
    pub fn from_table(table: Table<String>) -> Result<Self, Report> {
        let strain_i = table.get_header_index("strain")?;
        let date_i = table.get_header_index("date")?;
        let country_i = table.get_header_index("country")?;
        let division_i = table.get_header_index("division").ok();
        let host_i = table.get_header_index("host").ok();

        let optional = |row: &[String], i: Option<usize>| -> String {
            i.and_then(|i| row.get(i)).cloned().unwrap_or_default()
        };

        let records: Vec<Record> = table
            .rows
            .iter()
            .enumerate()
            .map(|(row_i, row)| Record {
                strain: row[strain_i].clone(),
                date: row[date_i].clone(),
                country: row[country_i].clone(),
                division: optional(row, division_i),
                host: optional(row, host_i),
                row: row_i,
            })
            .collect();

        Ok(Metadata { table, records })
    }

    /// Strains whose host matches exactly, in table order.
    pub fn filter_host(&self, host: &str) -> Vec<String> {
        self.records.iter().filter(|r| r.host == host).map(|r| r.strain.clone()).collect()
    }

    /// The source table rows of these records, with all columns.
    pub fn subset(&self, records: &[&Record]) -> Table<String> {
        Table {
            headers: self.table.headers.clone(),
            rows: records.iter().map(|r| self.table.rows[r.row].clone()).collect(),
            path: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Denylist

/// Known bad sequences, mapping strain to the collection date that makes it bad.
///
/// A sequence is only excluded while its metadata still carries the bad date,
/// a later metadata release may correct the date.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Denylist(pub BTreeMap<String, String>);

impl Denylist {
    /// Read the denylist from a JSON object of strain to date.
    pub fn read<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let denylist = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read file: {path:?}."))?;
        let denylist: Denylist = serde_json::from_str(&denylist)
            .wrap_err_with(|| format!("Failed to parse file: {path:?}"))?;
        debug!("Denylist sequences: {}", denylist.0.len());
        Ok(denylist)
    }

    /// Return true if the record is denylisted with its current date.
    pub fn contains(&self, record: &Record) -> bool {
        self.0.get(&record.strain).is_some_and(|date| *date == record.date)
    }
}
