use crate::utils;

use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result};
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn partial_dates_are_invalid() {
    assert!(utils::is_valid_date("2021-01-01"));
    assert!(!utils::is_valid_date("2020-XX-15"));
    assert!(!utils::is_valid_date("2020-XX-XX"));
    assert!(!utils::is_valid_date("2020-3-1"));
    assert!(!utils::is_valid_date("2020"));
    assert!(!utils::is_valid_date(""));
}

#[test]
fn parse_date_rejects_impossible_days() {
    assert_eq!(utils::parse_date("2020-12-31"), NaiveDate::from_ymd_opt(2020, 12, 31));
    assert_eq!(utils::parse_date("2020-02-30"), None);
    assert_eq!(utils::parse_date("2020-XX-15"), None);
}

#[test]
fn dated_copy_path() -> Result<(), Report> {
    let path = PathBuf::from("clusters/cluster_20A.EU1.txt");
    let observed = utils::with_suffix(&path, "-2021-01-08")?;
    assert_eq!(observed, PathBuf::from("clusters/cluster_20A.EU1-2021-01-08.txt"));
    Ok(())
}

#[test]
fn read_zstd_compressed() -> Result<(), Report> {
    let dir = TempDir::new()?;
    let path = dir.path().join("metadata.tsv.zst");
    let content = "strain\tdate\nA\t2020-06-01\n";
    let compressed = zstd::stream::encode_all(content.as_bytes(), 0)?;
    std::fs::File::create(&path)?.write_all(&compressed)?;

    assert_eq!(utils::get_delimiter(&path)?, b'\t');
    let mut observed = String::new();
    utils::open_reader(&path)?.read_to_string(&mut observed)?;
    assert_eq!(observed, content);
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    let path = PathBuf::from("this/path/does/not/exist.tsv");
    assert!(utils::open_reader(&path).is_err());
}
