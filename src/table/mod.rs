//! Create, read, write, and render the row-based [Table].

#[cfg(test)]
mod tests;

use crate::utils;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// A row-based table of generic data.
///
/// # Examples
///
/// ```
/// use cluster_dynamics::Table;
///
/// let mut table = Table::new();
/// table.headers = vec!["1", "2", "3"];
/// table.add_row(vec!["A", "B", "C"])?;
///
/// println!("{}", table.to_markdown());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
///
/// | 1 | 2 | 3 |
/// |---|---|---|
/// | A | B | C |
///
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Table<T> {
    /// Names of the table columns.
    pub headers: Vec<T>,
    /// Rows of table values.
    pub rows: Vec<Vec<T>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T> {
    /// Create a new table with empty headers and rows.
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }

    /// Add a new row to the table.
    ///
    /// The row must have one value per header.
    pub fn add_row(&mut self, row: Vec<T>) -> Result<(), Report> {
        let (new, ex) = (row.len(), self.headers.len());
        if new != ex {
            return Err(eyre!("New row size ({new}) does not match the table headers ({ex})."));
        }
        self.rows.push(row);
        Ok(())
    }
}

/// Methods for when the table data can be compared to strings and displayed.
impl<T> Table<T>
where
    T: AsRef<str> + std::fmt::Display,
{
    /// Get the column index (0-based) corresponding to the header.
    ///
    /// ```
    /// use cluster_dynamics::Table;
    ///
    /// let mut table = Table::new();
    /// table.headers = vec!["strain", "date", "country"];
    /// assert_eq!(table.get_header_index("country")?, 2);
    /// assert!(table.get_header_index("host").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_header_index(&self, header: &str) -> Result<usize, Report> {
        self.headers.iter().position(|h| h.as_ref() == header).ok_or_else(|| {
            eyre!("Column '{header}' was not found in table: {:?}.", self.path)
                .suggestion(format!("Available columns: {}", self.headers.iter().join(", ")))
        })
    }

    /// Return a new table restricted to the named columns, in the order given.
    pub fn select(&self, headers: &[&str]) -> Result<Table<T>, Report>
    where
        T: Clone,
    {
        let indices = headers.iter().map(|h| self.get_header_index(h)).collect::<Result<Vec<_>, Report>>()?;
        let table = Table {
            headers: indices.iter().map(|i| self.headers[*i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|i| row[*i].clone()).collect())
                .collect(),
            path: None,
        };
        Ok(table)
    }

    /// Write table to file.
    ///
    /// If not provided, the delimiter is identified from the path suffix (.tsv or .csv).
    ///
    /// ```
    /// use cluster_dynamics::Table;
    /// use tempfile::NamedTempFile;
    ///
    /// let mut table = Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(vec!["A", "B", "C"])?;
    ///
    /// let file = NamedTempFile::new()?;
    /// table.write(&file.path(), Some(b'\t'))?;
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P, delim: Option<u8>) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = match delim {
            Some(c) => c,
            None => utils::get_delimiter(path)?,
        };
        let file = std::fs::File::create(path)
            .wrap_err_with(|| format!("Unable to create file: {path:?}"))?;
        self.write_to(file, delim).wrap_err_with(|| format!("Unable to write table: {path:?}"))
    }

    /// Write table rows (with headers) to any writer, such as a file opened for appending.
    ///
    /// Values are written unquoted, the same way [Table::read] reads them.
    pub fn write_to<W>(&self, writer: W, delim: u8) -> Result<(), Report>
    where
        W: std::io::Write,
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delim)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        writer.write_record(self.headers.iter().map(|h| h.as_ref()))?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.as_ref()))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Convert table to markdown format.
    ///
    /// Columns are padded to their widest value, with one space on either side.
    pub fn to_markdown(&self) -> String {
        // get the maximum width of each column
        let col_widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(col_i, header)| {
                let header_width = header.as_ref().len();
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col_i))
                    .map(|value| value.as_ref().len())
                    .chain(std::iter::once(header_width))
                    .max()
                    .unwrap_or(header_width)
                    + 2
            })
            .collect_vec();

        let mut markdown = String::from("|");
        // frame in between headers and rows
        let mut header_frame = String::from("|");

        for (header, col_width) in self.headers.iter().zip(col_widths.iter()) {
            markdown.push_str(&format!("{:^width$}|", header.as_ref(), width = col_width));
            header_frame.push_str(&format!("{}|", "-".repeat(*col_width)));
        }
        markdown.push('\n');
        markdown.push_str(&header_frame);
        markdown.push('\n');

        for row in &self.rows {
            markdown.push('|');
            for (col_i, col_width) in col_widths.iter().enumerate() {
                let value = row.get(col_i).map(|v| v.as_ref()).unwrap_or("");
                markdown.push_str(&format!("{:^width$}|", value, width = col_width));
            }
            markdown.push('\n');
        }

        markdown
    }
}

impl Table<String> {
    /// Read a delimited (and optionally zstd-compressed) file into a Table.
    ///
    /// Rows shorter than the header are padded with empty strings, so
    /// missing values always read as `""`.
    ///
    /// ```
    /// use cluster_dynamics::Table;
    /// use std::io::Write;
    /// use tempfile::Builder;
    ///
    /// let mut file = Builder::new().suffix(".tsv").tempfile()?;
    /// writeln!(file, "strain\tdate\nA\t2020-06-01\nB")?;
    /// let table = Table::read(&file.path(), None)?;
    /// assert_eq!(table.rows[1], vec!["B", ""]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P, delim: Option<u8>) -> Result<Table<String>, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = match delim {
            Some(c) => c,
            None => utils::get_delimiter(path)?,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delim)
            .flexible(true)
            .quoting(false)
            .from_reader(utils::open_reader(path)?);

        let mut table = Table::new();
        table.headers = reader
            .headers()
            .wrap_err_with(|| format!("Failed to read table headers: {path:?}"))?
            .iter()
            .map(String::from)
            .collect();

        for (i, record) in reader.records().enumerate() {
            let record = record.wrap_err_with(|| format!("Failed to read row {i} of: {path:?}"))?;
            let mut row = record.iter().map(String::from).collect_vec();
            row.resize(table.headers.len(), String::new());
            table.rows.push(row);
        }

        table.path = Some(path.as_ref().to_path_buf());

        Ok(table)
    }
}

impl<T> Table<T>
where
    T: ToString,
{
    /// Create a new table with all values converted to owned String.
    pub fn to_string_values(&self) -> Table<String> {
        Table {
            headers: self.headers.iter().map(|s| s.to_string()).collect(),
            rows: self.rows.iter().map(|row| row.iter().map(|s| s.to_string()).collect()).collect(),
            path: self.path.clone(),
        }
    }
}
