//! Report files: strain lists, markdown pages, overview tables and plotting data.


use crate::cluster::Cluster;
use crate::metadata::{Metadata, Record, ACKNOWLEDGEMENT_HEADERS};
use crate::utils;
use crate::Table;
use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result, WrapErr};
use color_eyre::Help;
use indoc::formatdoc;
use log::debug;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Base url of the focal builds of each cluster.
pub const FOCAL_BUILD_URL: &str = "https://nextstrain.org/groups/neherlab/ncov";
/// Focal build query parameters, when a cluster does not set its own.
pub const DEFAULT_URL_PARAMS: &str = "f_region=Europe";
/// Site path of the rendered trend figures.
pub const TRENDS_FIGURE_DIR: &str = "/overall_trends_figures";

// ----------------------------------------------------------------------------
// Strain Lists

/// Write one strain per line, plus a copy with `-{date}` inserted before the extension.
///
/// Returns the path of the dated copy.
pub fn strain_list<P>(path: &P, strains: &[&str], date: NaiveDate) -> Result<PathBuf, Report>
where
    P: AsRef<Path> + Debug,
{
    let mut file = File::create(path).wrap_err_with(|| format!("Failed to create file: {path:?}"))?;
    for strain in strains {
        writeln!(file, "{strain}").wrap_err_with(|| format!("Failed to write file: {path:?}"))?;
    }

    let dated = utils::with_suffix(path, &format!("-{}", date.format("%Y-%m-%d")))?;
    std::fs::copy(path, &dated).wrap_err_with(|| format!("Failed to copy {path:?} to {dated:?}"))?;
    debug!("Strain list: {path:?}, {dated:?}");
    Ok(dated)
}

/// Write the strain list and metadata subset of a set of cluster records.
///
/// - `{cluster_dir}/clusters/cluster_{name}.txt` (and its dated copy)
/// - `{cluster_dir}/cluster_info/cluster_{name}_meta.tsv`
pub fn cluster_files(
    cluster_dir: &Path,
    name: &str,
    records: &[&Record],
    metadata: &Metadata,
    date: NaiveDate,
) -> Result<(), Report> {
    let list_dir = utils::create_dir(&cluster_dir.join("clusters"))?;
    let info_dir = utils::create_dir(&cluster_dir.join("cluster_info"))?;

    let strains: Vec<&str> = records.iter().map(|r| r.strain.as_str()).collect();
    strain_list(&list_dir.join(format!("cluster_{name}.txt")), &strains, date)?;

    let meta_path = info_dir.join(format!("cluster_{name}_meta.tsv"));
    metadata.subset(records).write(&meta_path, Some(b'\t'))?;

    Ok(())
}

/// Write the acknowledgement table (strain, accession, labs, authors) of cluster records.
pub fn acknowledgements<P>(path: &P, records: &[&Record], metadata: &Metadata) -> Result<Table<String>, Report>
where
    P: AsRef<Path> + Debug,
{
    let table = metadata
        .subset(records)
        .select(ACKNOWLEDGEMENT_HEADERS)
        .wrap_err("Failed to create acknowledgement table.")
        .suggestion(format!("Metadata needs the columns: {}", ACKNOWLEDGEMENT_HEADERS.join(", ")))?;
    table.write(path, Some(b'\t'))?;
    Ok(table)
}

// ----------------------------------------------------------------------------
// Markdown

/// Heading anchor used by GitHub markdown, ex. `20A.EU1` => `20aeu1`.
///
/// ```
/// use cluster_dynamics::export::anchor;
///
/// assert_eq!(anchor("20A.EU1"), "20aeu1");
/// assert_eq!(anchor("S.H69-"), "sh69-");
/// ```
pub fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Link to the focal build of a cluster.
pub fn focal_build_url(cluster: &Cluster) -> String {
    let params = cluster.url_params.as_deref().unwrap_or(DEFAULT_URL_PARAMS);
    format!("{FOCAL_BUILD_URL}/{}?{params}", cluster.build_name)
}

/// Markdown section of a cluster: focal build link, notes, country table, and trends figure.
pub fn cluster_markdown(cluster: &Cluster, table: &Table<String>) -> String {
    let build = &cluster.build_name;
    let notes: String = cluster.notes.iter().map(|note| format!("{note}\n")).collect();
    formatdoc! {"


        ## {build}
        [Focal Build]({url})

        {notes}{table}

        ![Overall trends {build}]({TRENDS_FIGURE_DIR}/overall_trends_{build}.png)",
        url = focal_build_url(cluster),
        table = table.to_markdown(),
    }
}

/// Header of the all-cluster overview page, with a table of contents.
pub fn overview_header(clusters: &[&Cluster], min_sequences: usize) -> String {
    let contents: String = clusters
        .iter()
        .map(|c| {
            let description = c.description.as_ref().map(|d| format!(" _({d})_")).unwrap_or_default();
            format!("- [{}](#{}){description}\n", c.build_name, anchor(&c.build_name))
        })
        .collect();

    formatdoc! {"

        # Overview of Clusters/Mutations in Europe
        [Overview of proportion of clusters in selected countries](country_overview.md)

        In the graphs below, countries are displayed in the chart if the country has at least {min_sequences} sequences present in the cluster.

        # Mutation Tables and Graphs
        {contents}
    "}
}

/// Append text to a file, creating it if needed.
pub fn append<P>(path: &P, text: &str) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Failed to open file for appending: {path:?}"))?;
    file.write_all(text.as_bytes()).wrap_err_with(|| format!("Failed to write file: {path:?}"))?;
    Ok(())
}

/// Append a cluster's country table to the overall TSV under a `## {build}` heading.
pub fn append_table<P>(path: &P, build_name: &str, table: &Table<String>) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    append(path, &format!("\n\n## {build_name}\n"))?;
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Failed to open file for appending: {path:?}"))?;
    table.write_to(file, b'\t').wrap_err_with(|| format!("Failed to write table: {path:?}"))
}

// ----------------------------------------------------------------------------
// Countries To Plot

/// Whether each country is plotted in at least one cluster.
///
/// Serializes as a JSON object of country to `"True"` or `"False"`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountriesToPlot(pub BTreeMap<String, bool>);

impl CountriesToPlot {
    /// Record a country, once plotted it stays plotted.
    pub fn insert(&mut self, country: &str, plotted: bool) {
        let entry = self.0.entry(country.to_string()).or_insert(false);
        *entry |= plotted;
    }
}

impl Serialize for CountriesToPlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let label = |plotted: bool| if plotted { "True" } else { "False" };
        serializer.collect_map(self.0.iter().map(|(country, plotted)| (country, label(*plotted))))
    }
}
