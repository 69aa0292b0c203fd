use crate::Table;

use color_eyre::eyre::{Report, Result};
use indoc::indoc;
use std::io::Write;
use tempfile::Builder;

fn countries() -> Result<Table<&'static str>, Report> {
    let mut table = Table::new();
    table.headers = vec!["country", "first_seq", "num_seqs", "last_seq"];
    table.add_row(vec!["Spain", "2020-06-20", "1203", "2020-12-01"])?;
    table.add_row(vec!["Norway", "2020-07-10", "45", "2020-11-28"])?;
    Ok(table)
}

#[test]
fn add_row_wrong_length() -> Result<(), Report> {
    let mut table = countries()?;
    assert!(table.add_row(vec!["France"]).is_err());
    assert_eq!(table.rows.len(), 2);
    Ok(())
}

#[test]
fn markdown() -> Result<(), Report> {
    let observed = countries()?.to_markdown();
    let expected = indoc! {"
        | country | first_seq  | num_seqs |  last_seq  |
        |---------|------------|----------|------------|
        |  Spain  | 2020-06-20 |   1203   | 2020-12-01 |
        | Norway  | 2020-07-10 |    45    | 2020-11-28 |
    "};
    assert_eq!(expected, observed);
    Ok(())
}

#[test]
fn select_columns() -> Result<(), Report> {
    let table = countries()?;
    let observed = table.select(&["num_seqs", "country"])?;
    assert_eq!(observed.headers, vec!["num_seqs", "country"]);
    assert_eq!(observed.rows, vec![vec!["1203", "Spain"], vec!["45", "Norway"]]);
    assert!(table.select(&["host"]).is_err());
    Ok(())
}

#[test]
fn write_then_read_pads_missing_values() -> Result<(), Report> {
    let mut file = Builder::new().suffix(".tsv").tempfile()?;
    writeln!(file, "strain\tdate\thost\nA\t2020-06-01\tHuman\nB\t2020-06-02")?;
    let table = Table::read(&file.path(), None)?;

    assert_eq!(table.headers, vec!["strain", "date", "host"]);
    assert_eq!(table.rows, vec![vec!["A", "2020-06-01", "Human"], vec!["B", "2020-06-02", ""]]);

    let output = Builder::new().suffix(".tsv").tempfile()?;
    table.write(&output.path(), None)?;
    let observed = std::fs::read_to_string(output.path())?;
    assert_eq!(observed, "strain\tdate\thost\nA\t2020-06-01\tHuman\nB\t2020-06-02\t\n");
    Ok(())
}

#[test]
fn quotes_are_written_unchanged() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = vec!["strain", "authors"];
    table.add_row(vec!["A", "Smith \"J\", Jones"])?;

    let mut observed = Vec::new();
    table.write_to(&mut observed, b'\t')?;
    assert_eq!(String::from_utf8(observed)?, "strain\tauthors\nA\tSmith \"J\", Jones\n");
    Ok(())
}
