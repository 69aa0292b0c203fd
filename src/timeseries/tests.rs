use crate::cluster::MatchedCluster;
use crate::metadata::{Denylist, Metadata};
use crate::timeseries::{aggregate, convolve, gaussian_kernel, ClusterSeries, CountrySeries, Options, Week};
use crate::Table;

use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result};
use std::collections::BTreeMap;

fn week(year: i32, week: u32) -> Week {
    Week { year, week }
}

fn date(text: &str) -> Result<NaiveDate, Report> {
    Ok(NaiveDate::parse_from_str(text, "%Y-%m-%d")?)
}

#[test]
fn iso_week_at_year_boundary() -> Result<(), Report> {
    assert_eq!(Week::from_date(date("2020-12-31")?), week(2020, 53));
    assert_eq!(Week::from_date(date("2021-01-01")?), week(2020, 53));
    assert_eq!(Week::from_date(date("2021-01-04")?), week(2021, 1));
    assert_eq!(week(2020, 53).start()?, date("2020-12-28")?);
    assert_eq!(week(2020, 53).next()?, week(2021, 1));
    assert_eq!(week(2020, 53).to_string(), "2020-W53");
    assert!(Week::new(2021, 53).is_err());
    Ok(())
}

#[test]
fn week_range_is_contiguous() -> Result<(), Report> {
    let weeks = Week::range(week(2020, 52), week(2021, 2))?;
    assert_eq!(weeks, vec![week(2020, 52), week(2020, 53), week(2021, 1), week(2021, 2)]);
    Ok(())
}

#[test]
fn kernel_is_symmetric() {
    let kernel = gaussian_kernel(10, 1.0);
    assert_eq!(kernel.len(), 21);
    assert!(kernel.iter().zip(kernel.iter().rev()).all(|(a, b)| (a - b).abs() < 1e-15));
    assert!(kernel.iter().all(|k| *k <= kernel[10]));
}

#[test]
fn convolve_keeps_length() {
    let kernel = [0.25, 0.5, 0.25];
    let observed = convolve(&[0.0, 4.0, 0.0, 0.0], &kernel);
    assert_eq!(observed, vec![1.0, 2.0, 1.0, 0.0]);
    // edges are zero padded
    let observed = convolve(&[4.0], &kernel);
    assert_eq!(observed, vec![2.0]);
}

#[test]
fn series_json() -> Result<(), Report> {
    let options = Options::default();
    let cluster = BTreeMap::from([(week(2020, 30), 3)]);
    let total = BTreeMap::from([(week(2020, 30), 10)]);

    let mut output = ClusterSeries::default();
    output.push("Spain", CountrySeries::new(&cluster, &total, &options.kernel)?);

    let observed = serde_json::to_string(&output)?;
    let expected = concat!(
        r#"{"Spain":{"week":["2020-07-20"],"total_sequences":[3],"cluster_sequences":[1],"#,
        r#""unsmoothed_cluster_sequences":[3],"unsmoothed_total_sequences":[10]}}"#
    );
    assert_eq!(expected, observed);
    Ok(())
}

#[test]
fn zero_total_weeks_are_excluded() -> Result<(), Report> {
    let options = Options::default();
    let cluster = BTreeMap::from([(week(2020, 10), 1)]);
    let total = BTreeMap::from([(week(2020, 40), 5)]);

    let series = CountrySeries::new(&cluster, &total, &options.kernel)?;

    // only weeks within the kernel reach of week 40 have a total
    assert_eq!(series.len(), 11);
    assert_eq!(series.week[0], week(2020, 30).start()?);
    assert!(series.unsmoothed_cluster_sequences.iter().all(|c| *c == 0));
    assert_eq!(series.unsmoothed_total_sequences.last(), Some(&5));
    assert!(series.frequencies().iter().all(|f| f.is_finite()));
    Ok(())
}

#[test]
fn trim_incomplete_last_week() -> Result<(), Report> {
    let options = Options::default();
    let cluster = BTreeMap::from([(week(2020, 30), 5)]);

    let total = BTreeMap::from([(week(2020, 30), 50), (week(2020, 31), 3)]);
    let mut series = CountrySeries::new(&cluster, &total, &options.kernel)?;
    assert!(series.trim_last(0.1, 10));
    assert_eq!(series.len(), 1);
    assert_eq!(series.total_sequences.len(), 1);
    assert_eq!(series.cluster_sequences.len(), 1);
    assert_eq!(series.unsmoothed_cluster_sequences, vec![5]);
    assert_eq!(series.unsmoothed_total_sequences, vec![50]);

    // only one week is ever removed
    assert!(!series.trim_last(0.1, 10));

    let total = BTreeMap::from([(week(2020, 30), 50), (week(2020, 31), 30)]);
    let mut series = CountrySeries::new(&cluster, &total, &options.kernel)?;
    assert!(!series.trim_last(0.1, 10));
    assert_eq!(series.len(), 2);
    Ok(())
}

#[test]
fn trim_needs_enough_previous_sequences() -> Result<(), Report> {
    let options = Options::default();
    let cluster = BTreeMap::from([(week(2020, 31), 1)]);
    let total = BTreeMap::from([(week(2020, 30), 9)]);

    let mut series = CountrySeries::new(&cluster, &total, &options.kernel)?;
    assert_eq!(series.unsmoothed_total_sequences, vec![9, 0]);
    assert!(!series.trim_last(0.1, 10));
    Ok(())
}

#[test]
fn aggregate_regions() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = vec!["strain", "date", "country", "division"];
    table.rows = vec![
        vec!["A", "2020-05-10", "Spain", "Valencia"],
        vec!["B", "2020-07-20", "Spain", "Valencia"],
        vec!["C", "2020-07-21", "Spain", "Aragon"],
        vec!["D", "2020-07-22", "Spain", "Valencia"],
        vec!["E", "2020-XX-22", "Spain", "Valencia"],
        vec!["F", "2020-07-20", "United Kingdom", "England"],
        vec!["G", "2020-07-20", "United Kingdom", "Scotland"],
        vec!["H", "2020-07-20", "United Kingdom", ""],
        vec!["I", "2020-7-23", "Spain", "Valencia"],
        vec!["J", "2020-02-30", "Spain", "Valencia"],
    ];
    let metadata = Metadata::from_table(table.to_string_values())?;
    let strains = ["A", "B", "C", "F", "I", "J"].map(String::from);
    let matched = MatchedCluster::new(&strains, &metadata, &Denylist::default());
    assert_eq!(matched.bad_dates, 2);
    let regions = matched.regions();
    assert_eq!(regions, vec!["Spain", "England"]);

    let (cluster, total) = aggregate(&matched.records, &metadata, &regions, week(2020, 20));

    let expected_cluster = BTreeMap::from([
        ("England".to_string(), BTreeMap::from([(week(2020, 30), 1)])),
        ("Spain".to_string(), BTreeMap::from([(week(2020, 19), 1), (week(2020, 30), 2)])),
    ]);
    let expected_total = BTreeMap::from([
        ("England".to_string(), BTreeMap::from([(week(2020, 30), 1)])),
        ("Spain".to_string(), BTreeMap::from([(week(2020, 30), 3)])),
    ]);
    assert_eq!(expected_cluster, cluster);
    assert_eq!(expected_total, total);
    Ok(())
}

#[test]
fn options_series_trims_each_region() -> Result<(), Report> {
    let options = Options::default();
    let cluster = BTreeMap::from([("Spain".to_string(), BTreeMap::from([(week(2020, 30), 5)]))]);
    let total = BTreeMap::from([(
        "Spain".to_string(),
        BTreeMap::from([(week(2020, 30), 50), (week(2020, 31), 3)]),
    )]);

    let output = options.series(&cluster, &total, &["Spain", "Italy"])?;
    assert_eq!(output.get("Spain").map(|s| s.len()), Some(1));
    assert!(output.get("Italy").is_some_and(|s| s.is_empty()));
    Ok(())
}
