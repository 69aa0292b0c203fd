//! Weekly sequence counts per region, smoothed and trimmed for plotting.
//!
//! Sequences are binned into ISO-8601 weeks, so the week-year of a date can
//! differ from its calendar year (`2021-01-01` is in `2020-W53`). Counts are
//! kept in ordered maps and only zero-filled when a series is smoothed.

#[cfg(test)]
mod tests;

use crate::metadata::{Metadata, Record};
use crate::utils;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use color_eyre::eyre::{eyre, Report, Result};
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Number of weeks on either side of the center of the smoothing kernel.
pub const KERNEL_HALF_WIDTH: usize = 10;
/// Standard deviation (in weeks) of the smoothing kernel.
pub const KERNEL_SD: f64 = 1.0;

// ----------------------------------------------------------------------------
// Week

/// An ISO-8601 week, ordered by week-year then week number.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Week {
    /// ISO week-year, which is not always the calendar year of the date.
    pub year: i32,
    /// ISO week number, 1-53.
    pub week: u32,
}

impl Week {
    /// Create a week, checking that it exists in the week-year.
    pub fn new(year: i32, week: u32) -> Result<Self, Report> {
        match NaiveDate::from_isoywd_opt(year, week, Weekday::Mon) {
            Some(_) => Ok(Week { year, week }),
            None => Err(eyre!("Week {week} does not exist in year {year}.")),
        }
    }

    /// The ISO week containing a date.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use cluster_dynamics::timeseries::Week;
    ///
    /// let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    /// assert_eq!(Week::from_date(date), Week { year: 2020, week: 53 });
    /// ```
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Week { year: iso.year(), week: iso.week() }
    }

    /// The Monday that starts the week.
    pub fn start(&self) -> Result<NaiveDate, Report> {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .ok_or_else(|| eyre!("Week {self} does not exist."))
    }

    /// The following week.
    pub fn next(&self) -> Result<Week, Report> {
        Ok(Week::from_date(self.start()? + Duration::days(7)))
    }

    /// Every week from `first` to `last`, inclusive.
    pub fn range(first: Week, last: Week) -> Result<Vec<Week>, Report> {
        let mut weeks = Vec::new();
        let mut week = first;
        while week <= last {
            weeks.push(week);
            week = week.next()?;
        }
        Ok(weeks)
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

// ----------------------------------------------------------------------------
// Weekly Counts

/// Sequence counts per region, per week. Weeks without sequences are absent.
pub type WeeklyCounts = BTreeMap<String, BTreeMap<Week, usize>>;

/// Count sequences per ISO week, skipping incomplete dates.
///
/// If `start` is given, weeks before it are not counted.
pub fn count_weeks<'r, I>(records: I, start: Option<Week>) -> BTreeMap<Week, usize>
where
    I: IntoIterator<Item = &'r Record>,
{
    records
        .into_iter()
        .filter_map(|r| utils::parse_date(&r.date))
        .map(Week::from_date)
        .filter(|week| start.map_or(true, |start| *week >= start))
        .counts()
        .into_iter()
        .collect()
}

/// Tabulate cluster and total weekly counts for each region.
///
/// Cluster counts cover every week with a cluster sequence. Total counts
/// cover all metadata sequences of the region from the `start` week onwards.
pub fn aggregate(
    cluster: &[&Record],
    metadata: &Metadata,
    regions: &[&str],
    start: Week,
) -> (WeeklyCounts, WeeklyCounts) {
    let cluster_counts: WeeklyCounts = regions
        .iter()
        .map(|region| {
            let records = cluster.iter().copied().filter(|r| r.region() == *region);
            (region.to_string(), count_weeks(records, None))
        })
        .collect();

    let wanted: HashSet<&str> = regions.iter().copied().collect();
    let by_region = metadata
        .records
        .iter()
        .filter(|r| wanted.contains(r.region()))
        .map(|r| (r.region(), r))
        .into_group_map();
    let total_counts: WeeklyCounts = regions
        .iter()
        .map(|region| {
            let records = by_region.get(region).into_iter().flatten().copied();
            (region.to_string(), count_weeks(records, Some(start)))
        })
        .collect();

    (cluster_counts, total_counts)
}

// ----------------------------------------------------------------------------
// Smoothing

/// A symmetric Gaussian kernel of `2 * half_width + 1` points, normalized to sum to 1.
///
/// ```
/// use cluster_dynamics::timeseries::gaussian_kernel;
///
/// let kernel = gaussian_kernel(10, 1.0);
/// assert_eq!(kernel.len(), 21);
/// assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
pub fn gaussian_kernel(half_width: usize, sd: f64) -> Vec<f64> {
    let half_width = half_width as i64;
    let kernel = (-half_width..=half_width)
        .map(|x| (-(x as f64).powi(2) / 2.0 / sd.powi(2)).exp())
        .collect_vec();
    let total: f64 = kernel.iter().sum();
    kernel.into_iter().map(|k| k / total).collect()
}

/// Convolve a signal with an odd-length kernel, keeping the length of the signal.
///
/// Values beyond either end of the signal are treated as zero.
pub fn convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let half_width = (kernel.len() / 2) as i64;
    (0..signal.len() as i64)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(k, weight)| {
                    let j = i + half_width - k as i64;
                    usize::try_from(j).ok().and_then(|j| signal.get(j)).map(|v| v * weight)
                })
                .sum::<f64>()
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Country Series

/// Serialize smoothed counts as whole sequences, truncating the fraction.
fn truncate<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(values.iter().map(|v| v.trunc() as i64))
}

/// The weekly series of one region, aligned by week.
///
/// Only weeks with a smoothed total above zero are kept, so the cluster
/// frequency is always defined.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CountrySeries {
    /// Start date (Monday) of each week.
    pub week: Vec<NaiveDate>,
    #[serde(serialize_with = "truncate")]
    pub total_sequences: Vec<f64>,
    #[serde(serialize_with = "truncate")]
    pub cluster_sequences: Vec<f64>,
    pub unsmoothed_cluster_sequences: Vec<usize>,
    pub unsmoothed_total_sequences: Vec<usize>,
}

impl CountrySeries {
    /// Zero-fill, smooth, and align the cluster and total counts of a region.
    ///
    /// The series spans every week from the first to the last week present
    /// in either set of counts.
    pub fn new(
        cluster: &BTreeMap<Week, usize>,
        total: &BTreeMap<Week, usize>,
        kernel: &[f64],
    ) -> Result<Self, Report> {
        let bounds = cluster.keys().chain(total.keys()).minmax().into_option();
        let weeks = match bounds {
            Some((first, last)) => Week::range(*first, *last)?,
            None => return Ok(CountrySeries::default()),
        };

        let fill = |counts: &BTreeMap<Week, usize>| {
            weeks.iter().map(|w| counts.get(w).copied().unwrap_or(0)).collect_vec()
        };
        let unsmoothed_cluster = fill(cluster);
        let unsmoothed_total = fill(total);

        let as_f64 = |counts: &[usize]| counts.iter().map(|c| *c as f64).collect_vec();
        let smoothed_cluster = convolve(&as_f64(&unsmoothed_cluster), kernel);
        let smoothed_total = convolve(&as_f64(&unsmoothed_total), kernel);

        let mut series = CountrySeries::default();
        for (i, week) in weeks.iter().enumerate() {
            if smoothed_total[i] <= 0.0 {
                continue;
            }
            series.week.push(week.start()?);
            series.total_sequences.push(smoothed_total[i]);
            series.cluster_sequences.push(smoothed_cluster[i]);
            series.unsmoothed_cluster_sequences.push(unsmoothed_cluster[i]);
            series.unsmoothed_total_sequences.push(unsmoothed_total[i]);
        }

        Ok(series)
    }

    /// Number of weeks in the series.
    pub fn len(&self) -> usize {
        self.week.len()
    }

    pub fn is_empty(&self) -> bool {
        self.week.is_empty()
    }

    /// Smoothed cluster frequency per week.
    pub fn frequencies(&self) -> Vec<f64> {
        self.cluster_sequences.iter().zip(&self.total_sequences).map(|(c, t)| c / t).collect()
    }

    /// Drop the last week if its total looks incomplete.
    ///
    /// The last week is removed when its unsmoothed total is below `frac` times
    /// the previous week's, and the previous week has at least `keep_count`
    /// sequences. At most one week is removed. Returns true if it was.
    pub fn trim_last(&mut self, frac: f64, keep_count: usize) -> bool {
        let (last, previous) = match self.unsmoothed_total_sequences.iter().rev().next_tuple() {
            Some((last, previous)) => (*last, *previous),
            None => return false,
        };
        if !((last as f64) < frac * previous as f64 && previous >= keep_count) {
            return false;
        }
        self.week.pop();
        self.total_sequences.pop();
        self.cluster_sequences.pop();
        self.unsmoothed_cluster_sequences.pop();
        self.unsmoothed_total_sequences.pop();
        true
    }
}

// ----------------------------------------------------------------------------
// Cluster Series

/// The series of every reported region of a cluster, in insertion order.
///
/// Serializes as a JSON object keyed by region.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterSeries {
    pub countries: Vec<(String, CountrySeries)>,
}

impl ClusterSeries {
    pub fn push(&mut self, country: &str, series: CountrySeries) {
        self.countries.push((country.to_string(), series));
    }

    pub fn get(&self, country: &str) -> Option<&CountrySeries> {
        self.countries.iter().find(|(c, _)| c == country).map(|(_, s)| s)
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl Serialize for ClusterSeries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.countries.iter().map(|(country, series)| (country, series)))
    }
}

// ----------------------------------------------------------------------------
// Options

/// Parameters of the weekly aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// First week included in the total counts.
    pub start: Week,
    pub kernel: Vec<f64>,
    pub trim_frac: f64,
    pub trim_keep_count: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            start: Week { year: 2020, week: 20 },
            kernel: gaussian_kernel(KERNEL_HALF_WIDTH, KERNEL_SD),
            trim_frac: 0.1,
            trim_keep_count: 10,
        }
    }
}

impl Options {
    /// Build the trimmed series of each region from its weekly counts.
    pub fn series(
        &self,
        cluster_counts: &WeeklyCounts,
        total_counts: &WeeklyCounts,
        regions: &[&str],
    ) -> Result<ClusterSeries, Report> {
        let empty = BTreeMap::new();
        let mut output = ClusterSeries::default();
        for region in regions {
            let cluster = cluster_counts.get(*region).unwrap_or(&empty);
            let total = total_counts.get(*region).unwrap_or(&empty);
            let mut series = CountrySeries::new(cluster, total, &self.kernel)?;
            series.trim_last(self.trim_frac, self.trim_keep_count);
            output.push(region, series);
        }
        Ok(output)
    }
}
