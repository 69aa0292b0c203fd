//! Match clusters, summarize them by country, and write the reports.

#[cfg(test)]
mod tests;

use crate::cluster::{match_clusters, sarscov2, Catalog, Cluster, MatchedCluster};
use crate::export::{self, CountriesToPlot};
use crate::metadata::{Denylist, Metadata, Subdivision};
use crate::prompt::{Prompt, Selection};
use crate::sequence::{read_diagnostics, Diagnostic};
use crate::summary::Summary;
use crate::timeseries::{aggregate, ClusterSeries, Options, Week};
use crate::utils;
use chrono::{Local, NaiveDate};
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

// ----------------------------------------------------------------------------
// Args

/// Match sequences to clusters and write cluster reports.
///
/// Choices that are not set here (which clusters, and whether to write
/// files) are asked for interactively.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
pub struct Args {
    /// Sequence diagnostics table (strain, all_snps, gap_list).
    #[clap(long, default_value_os_t = Args::default().diagnostics)]
    pub diagnostics: PathBuf,

    /// Sequence metadata table.
    #[clap(long, default_value_os_t = Args::default().metadata)]
    pub metadata: PathBuf,

    /// Output directory of strain lists and metadata subsets.
    #[clap(long, default_value_os_t = Args::default().cluster_dir)]
    pub cluster_dir: PathBuf,

    /// Output directory of country tables, markdown pages, and plotting data.
    #[clap(long, default_value_os_t = Args::default().tables_dir)]
    pub tables_dir: PathBuf,

    /// Output directory of acknowledgement tables.
    #[clap(long, default_value_os_t = Args::default().acknowledgements_dir)]
    pub acknowledgements_dir: PathBuf,

    /// Clusters to run: a cluster name, 'all', or 'all mink'.
    #[clap(long)]
    pub clusters: Option<String>,

    /// Write out files.
    #[clap(long)]
    pub write_files: Option<bool>,

    /// Write out acknowledgements.
    #[clap(long)]
    pub write_acknowledgements: Option<bool>,

    /// Cluster catalog (JSON), the built-in SARS-CoV-2 catalog if not set.
    #[clap(long)]
    pub catalog: Option<PathBuf>,

    /// Known bad sequences (JSON object of strain to bad date).
    #[clap(long)]
    pub bad_sequences: Option<PathBuf>,

    /// Minimum sequences in a country for its weekly series to be reported.
    #[clap(long, default_value_t = Args::default().min_sequences)]
    pub min_sequences: usize,

    /// A country is plotted if it has more than this many sequences in any cluster.
    #[clap(long, default_value_t = Args::default().plot_cutoff)]
    pub plot_cutoff: usize,

    /// First ISO week of total counts.
    #[clap(long, default_value_t = Args::default().start_week)]
    pub start_week: u32,

    /// ISO week-year of the start week.
    #[clap(long, default_value_t = Args::default().start_year)]
    pub start_year: i32,

    /// Drop the last week if its total is below this fraction of the previous week.
    #[clap(long, default_value_t = Args::default().trim_frac)]
    pub trim_frac: f64,

    /// Only drop the last week if the previous week has at least this many sequences.
    #[clap(long, default_value_t = Args::default().trim_keep_count)]
    pub trim_keep_count: usize,

    /// Show a progress spinner while reading diagnostics.
    #[clap(long)]
    pub progress: bool,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            diagnostics: PathBuf::from("results/sequence-diagnostics.tsv"),
            metadata: PathBuf::from("data/metadata.tsv"),
            cluster_dir: PathBuf::from("../ncov_cluster/cluster_profile/"),
            tables_dir: PathBuf::from("../covariants/cluster_tables/"),
            acknowledgements_dir: PathBuf::from("../covariants/acknowledgements/"),
            clusters: None,
            write_files: None,
            write_acknowledgements: None,
            catalog: None,
            bad_sequences: None,
            min_sequences: 20,
            plot_cutoff: 100,
            start_week: 20,
            start_year: 2020,
            trim_frac: 0.1,
            trim_keep_count: 10,
            progress: false,
        }
    }
}

impl Args {
    /// Aggregation parameters.
    pub fn options(&self) -> Result<Options, Report> {
        Ok(Options {
            start: Week::new(self.start_year, self.start_week)?,
            trim_frac: self.trim_frac,
            trim_keep_count: self.trim_keep_count,
            ..Default::default()
        })
    }
}

// ----------------------------------------------------------------------------
// Analysis

/// The results of one cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub name: String,
    pub build_name: String,
    /// Cluster is part of the overview reports and the plot list.
    pub overview: bool,
    /// Strains that passed all filters, in metadata order.
    pub strains: Vec<String>,
    pub summary: Summary,
    /// Weekly series of countries with enough sequences.
    pub series: ClusterSeries,
}

/// The results of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    pub analyses: Vec<Analysis>,
    pub countries_to_plot: CountriesToPlot,
}

impl Outcome {
    pub fn get(&self, name: &str) -> Option<&Analysis> {
        self.analyses.iter().find(|a| a.name == name)
    }
}

/// Which outputs to write.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Outputs {
    files: bool,
    acknowledgements: bool,
    /// All clusters were selected, write the overview reports too.
    overview: bool,
}

// ----------------------------------------------------------------------------
// Run

/// Run the cluster analysis, asking on the terminal for missing choices.
pub fn run(args: &Args) -> Result<Outcome, Report> {
    let mut prompt = Prompt::stdin();
    run_with(args, &mut prompt, Local::now().date_naive())
}

/// Run the cluster analysis with a given prompt, and `date` stamped on dated copies.
pub fn run_with<R, W>(args: &Args, prompt: &mut Prompt<R, W>, date: NaiveDate) -> Result<Outcome, Report>
where
    R: BufRead,
    W: Write,
{
    let options = args.options()?;

    // ------------------------------------------------------------------------
    // Configuration

    let catalog = match &args.catalog {
        Some(path) => Catalog::read(path)?,
        None => sarscov2::build()?,
    };

    let files = match args.write_files {
        Some(answer) => answer,
        None => prompt.confirm("Write out files?")?,
    };
    info!("Writing out files? {files}");

    let acknowledgements = match args.write_acknowledgements {
        Some(answer) => answer,
        None => prompt.confirm("Write out acknowledgements?")?,
    };
    info!("Writing out acknowledgements? {acknowledgements}");

    let selection = match &args.clusters {
        Some(answer) => Selection::parse(answer, &catalog).ok_or_else(|| {
            eyre!("Cluster not found: {answer}")
                .suggestion(format!("Options are: {}, all", catalog.names().join(", ")))
        })?,
        None => prompt.select_clusters(&catalog)?,
    };
    let outputs = Outputs { files, acknowledgements, overview: selection.all };

    let clusters = selection.clusters.iter().filter_map(|name| catalog.get(name)).collect_vec();

    let denylist = match &args.bad_sequences {
        Some(path) => Denylist::read(path)?,
        None => Denylist::default(),
    };
    let metadata = Metadata::read(&args.metadata)?;

    if outputs.files {
        prepare_outputs(args, &clusters, &outputs)?;
    }
    if outputs.acknowledgements {
        utils::create_dir(&args.acknowledgements_dir)?;
    }

    // ------------------------------------------------------------------------
    // Matching

    let matches = match clusters.iter().any(|c| !c.is_host()) {
        true => {
            info!("Reading diagnostics: {:?}", args.diagnostics);
            let diagnostics = read_diagnostics(&args.diagnostics, args.progress)?;
            match_clusters(&clusters, diagnostics, &metadata)?
        }
        false => match_clusters(&clusters, std::iter::empty::<Result<Diagnostic, Report>>(), &metadata)?,
    };

    // ------------------------------------------------------------------------
    // Clusters

    let mut outcome = Outcome::default();
    for cluster in &clusters {
        info!("Running cluster {}", cluster.name);
        let strains = matches.get(cluster.name.as_str()).map(Vec::as_slice).unwrap_or_default();
        let matched = MatchedCluster::new(strains, &metadata, &denylist);
        matched.log(cluster);

        let analysis = analyze(args, &options, cluster, &matched, &metadata, &outputs, date)?;
        outcome.analyses.push(analysis);
    }

    // ------------------------------------------------------------------------
    // Plotting Data

    let plotted = plot_countries(&outcome.analyses, args.min_sequences, args.plot_cutoff);
    info!("Countries with more than {} sequences in any cluster: {}", args.plot_cutoff, plotted.iter().sorted().join(", "));

    for analysis in &outcome.analyses {
        for (country, _) in &analysis.series.countries {
            outcome.countries_to_plot.insert(country, plotted.contains(country.as_str()));
        }
        if outputs.files {
            let path = args.tables_dir.join(format!("{}_data.json", analysis.build_name));
            utils::write_json(&path, &analysis.series, false)?;
        }
    }

    if outputs.files && outputs.overview {
        let path = args.tables_dir.join("perVariant_countries_toPlot.json");
        utils::write_json(&path, &outcome.countries_to_plot, false)?;
    }

    Ok(outcome)
}

/// Create output directories, and start the overview reports afresh.
fn prepare_outputs(args: &Args, clusters: &[&Cluster], outputs: &Outputs) -> Result<(), Report> {
    utils::create_dir(&args.cluster_dir)?;
    utils::create_dir(&args.tables_dir)?;

    if outputs.overview {
        let overview = clusters.iter().copied().filter(|c| c.overview && !c.is_host()).collect_vec();
        let header = export::overview_header(&overview, args.min_sequences);
        let path = args.tables_dir.join("all_tables.md");
        std::fs::write(&path, header)
            .wrap_err_with(|| format!("Failed to write file: {path:?}"))?;

        let path = args.tables_dir.join("all_tables.tsv");
        std::fs::write(&path, "\n").wrap_err_with(|| format!("Failed to write file: {path:?}"))?;
    }

    Ok(())
}

/// Summarize, export, and aggregate one matched cluster.
fn analyze(
    args: &Args,
    options: &Options,
    cluster: &Cluster,
    matched: &MatchedCluster,
    metadata: &Metadata,
    outputs: &Outputs,
    date: NaiveDate,
) -> Result<Analysis, Report> {
    let build = &cluster.build_name;
    let regions = matched.regions();
    info!("The cluster is found in: {}", regions.join(", "));

    let summary = Summary::new(&matched.records);
    let table = summary.to_table();
    info!("Ordered list by first_seq date:\n{}", table.to_markdown());

    if outputs.files {
        export::cluster_files(&args.cluster_dir, build, &matched.records, metadata, date)?;

        if let Some(exclusion) = &cluster.without_country {
            let records = matched.records.iter().copied().filter(|r| r.country != exclusion.country).collect_vec();
            let name = format!("{build}-{}", exclusion.suffix);
            export::cluster_files(&args.cluster_dir, &name, &records, metadata, date)?;
        }

        table.write(&args.tables_dir.join(format!("{build}_table.tsv")), Some(b'\t'))?;
        let markdown = export::cluster_markdown(cluster, &table);
        let path = args.tables_dir.join(format!("{build}_table.md"));
        std::fs::write(&path, &markdown).wrap_err_with(|| format!("Failed to write file: {path:?}"))?;

        if outputs.overview {
            export::append_table(&args.tables_dir.join("all_tables.tsv"), build, &table)?;
            if cluster.overview && !cluster.is_host() {
                export::append(&args.tables_dir.join("all_tables.md"), &markdown)?;
            }
        }
    }

    if outputs.acknowledgements {
        let path = args.acknowledgements_dir.join(format!("{}_acknowledgement_table.tsv", cluster.name));
        export::acknowledgements(&path, &matched.records, metadata)?;
    }

    let (cluster_counts, total_counts) = aggregate(&matched.records, metadata, &regions, options.start);
    let countries = summary.countries_with(args.min_sequences);
    let series = options.series(&cluster_counts, &total_counts, &countries)?;
    if series.is_empty() {
        warn!("No country has at least {} sequences in cluster {}.", args.min_sequences, cluster.name);
    }

    Ok(Analysis {
        name: cluster.name.clone(),
        build_name: build.clone(),
        overview: cluster.overview,
        strains: matched.strains().into_iter().map(String::from).collect(),
        summary,
        series,
    })
}

/// Countries to plot: more than `plot_cutoff` sequences in any overview cluster
/// with at least one country of `min_sequences` or more, excluding subdivisions.
pub fn plot_countries(analyses: &[Analysis], min_sequences: usize, plot_cutoff: usize) -> HashSet<&str> {
    analyses
        .iter()
        .filter(|a| a.overview && !a.summary.countries_with(min_sequences).is_empty())
        .flat_map(|a| &a.summary.countries)
        .filter(|c| c.num_seqs > plot_cutoff && !Subdivision::contains(&c.country))
        .map(|c| c.country.as_str())
        .collect()
}
