//! Shared file and date helpers.

pub mod verbosity;

#[cfg(test)]
mod tests;

use chrono::NaiveDate;
use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use log::debug;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use zstd::stream::read::Decoder;

/// Compression formats that can be read transparently.
pub enum Decompress {
    Zst,
}

impl FromStr for Decompress {
    type Err = Report;
    fn from_str(s: &str) -> Result<Self, Report> {
        match s {
            "zst" => Ok(Decompress::Zst),
            _ext => Err(eyre!("Decompression for {_ext:?} is not implemented yet.")),
        }
    }
}

/// Get the file extension as a str.
fn get_extension<P>(path: &P) -> Result<&str, Report>
where
    P: AsRef<Path> + Debug,
{
    path.as_ref()
        .extension()
        .wrap_err_with(|| format!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| format!("Failed to convert file extension to str: {path:?}"))
}

/// Get delimiter based on file extension.
///
/// A trailing compression extension is skipped, so `metadata.tsv.zst`
/// is tab-delimited.
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// ```rust
/// use cluster_dynamics::utils::get_delimiter;
///
/// assert_eq!(get_delimiter(&"file.tsv")?, b'\t');
/// assert_eq!(get_delimiter(&"file.csv")?, b',');
/// assert_eq!(get_delimiter(&"file.tsv.zst")?, b'\t');
/// assert!(get_delimiter(&"file").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn get_delimiter<P>(path: &P) -> Result<u8, Report>
where
    P: AsRef<Path> + Debug,
{
    let path = path.as_ref();
    let inner = match get_extension(&path).map(Decompress::from_str) {
        Ok(Ok(_)) => path.with_extension(""),
        _ => path.to_path_buf(),
    };
    match get_extension(&inner)? {
        "tsv" | "txt" => Ok(b'\t'),
        "csv" => Ok(b','),
        _ext => {
            Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt"))
        }
    }
}

/// Open a file for reading, decompressing on the fly if the extension is a known codec.
pub fn open_reader<P>(path: &P) -> Result<Box<dyn Read>, Report>
where
    P: AsRef<Path> + Debug,
{
    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to read file: {path:?}"))
        .suggestion("Check that the input path exists, relative paths are resolved from the current directory.")?;

    let reader: Box<dyn Read> = match get_extension(path).map(Decompress::from_str) {
        Ok(Ok(Decompress::Zst)) => {
            debug!("Decompressing: {path:?}");
            let decoder = Decoder::new(file).wrap_err(format!("Failed to decode: {path:?}"))?;
            Box::new(decoder)
        }
        _ => Box::new(BufReader::new(file)),
    };

    Ok(reader)
}

/// Create a directory (and parents) if it does not already exist.
pub fn create_dir<P>(path: &P) -> Result<PathBuf, Report>
where
    P: AsRef<Path> + Debug,
{
    let path = path.as_ref().to_path_buf();
    if !path.exists() {
        debug!("Creating output directory: {path:?}");
        std::fs::create_dir_all(&path)
            .wrap_err_with(|| format!("Failed to create directory: {path:?}"))?;
    }
    Ok(path)
}

/// Write a value to a JSON file.
pub fn write_json<P, T>(path: &P, value: &T, pretty: bool) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
    T: Serialize + ?Sized,
{
    let mut file =
        File::create(path).wrap_err_with(|| format!("Failed to create file: {path:?}"))?;
    let output = match pretty {
        true => serde_json::to_string_pretty(value),
        false => serde_json::to_string(value),
    }
    .wrap_err_with(|| format!("Failed to serialize JSON for: {path:?}"))?;
    file.write_all(output.as_bytes())
        .wrap_err_with(|| format!("Failed to write file: {path:?}"))?;
    Ok(())
}

/// Return true if a metadata date is a complete `YYYY-MM-DD` date.
///
/// Partial dates are either short (`2020-3-1`, `2020-03`) or carry
/// `XX` placeholders (`2020-XX-15`).
///
/// ```rust
/// use cluster_dynamics::utils::is_valid_date;
///
/// assert!(is_valid_date("2020-03-01"));
/// assert!(!is_valid_date("2020-3-1"));
/// assert!(!is_valid_date("2020-XX-15"));
/// ```
pub fn is_valid_date(date: &str) -> bool {
    date.len() == 10 && !date.contains("XX")
}

/// Parse a well-formed metadata date.
///
/// Returns [`None`] for dates rejected by [`is_valid_date`] or that are not real calendar days.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    if !is_valid_date(date) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Insert a suffix before the file extension(s), ex. `cluster_S.N501.txt` => `cluster_S.N501-2021-01-01.txt`.
///
/// The file name is treated as `{stem}.{ext}` where `ext` is the final extension only.
pub fn with_suffix<P>(path: &P, suffix: &str) -> Result<PathBuf, Report>
where
    P: AsRef<Path> + Debug,
{
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .wrap_err_with(|| format!("Failed to get file stem: {path:?}"))?
        .to_string_lossy();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    Ok(path.with_file_name(file_name))
}
