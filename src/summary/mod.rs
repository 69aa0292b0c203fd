//! Per-country summary of the sequences in a cluster.


use crate::metadata::Record;
use crate::utils;
use crate::Table;
use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Headers of the summary table.
pub const HEADERS: &[&str] = &["country", "first_seq", "num_seqs", "last_seq"];

/// When, and how often, a cluster was sampled in one region.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CountrySummary {
    /// Reporting region, see [`Record::region`].
    pub country: String,
    pub first_seq: NaiveDate,
    pub num_seqs: usize,
    pub last_seq: NaiveDate,
}

/// Country summaries of a cluster, ordered by the date of their first sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub countries: Vec<CountrySummary>,
}

impl Summary {
    /// Summarize cluster records by region.
    ///
    /// Regions sampled first come first, ties keep the order the regions first
    /// appear in. Records without a complete date are skipped.
    pub fn new(records: &[&Record]) -> Self {
        let dated = records
            .iter()
            .filter_map(|r| Some((r.region(), utils::parse_date(&r.date)?)))
            .collect_vec();
        let order = dated.iter().map(|(region, _)| *region).unique().collect_vec();
        let groups = dated.into_iter().into_group_map();

        let mut countries = order
            .into_iter()
            .filter_map(|country| {
                let dates = groups.get(country)?;
                let (first_seq, last_seq) = dates.iter().minmax().into_option()?;
                Some(CountrySummary {
                    country: country.to_string(),
                    first_seq: *first_seq,
                    num_seqs: dates.len(),
                    last_seq: *last_seq,
                })
            })
            .collect_vec();
        countries.sort_by_key(|c| c.first_seq);

        Summary { countries }
    }

    pub fn get(&self, country: &str) -> Option<&CountrySummary> {
        self.countries.iter().find(|c| c.country == country)
    }

    /// Regions with at least `min_sequences` sequences, in summary order.
    pub fn countries_with(&self, min_sequences: usize) -> Vec<&str> {
        self.countries
            .iter()
            .filter(|c| c.num_seqs >= min_sequences)
            .map(|c| c.country.as_str())
            .collect()
    }

    /// Convert to a table, one row per region.
    pub fn to_table(&self) -> Table<String> {
        let mut table = Table::new();
        table.headers = HEADERS.iter().map(|h| h.to_string()).collect();
        table.rows = self
            .countries
            .iter()
            .map(|c| {
                vec![
                    c.country.clone(),
                    c.first_seq.to_string(),
                    c.num_seqs.to_string(),
                    c.last_seq.to_string(),
                ]
            })
            .collect();
        table
    }
}
