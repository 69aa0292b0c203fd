//! Interactive questions for run choices missing from the command line.


use crate::cluster::Catalog;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use itertools::Itertools;
use log::info;
use std::io::{BufRead, Stdout, StdinLock, Write};

/// Answers accepted as yes, anything else is no.
pub const YES: &[&str] = &["y", "Y", "yes", "YES", "Yes"];

// ----------------------------------------------------------------------------
// Selection

/// The clusters chosen for a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// Cluster names, in catalog order.
    pub clusters: Vec<String>,
    /// Whether every cluster was requested, which enables the overview reports.
    pub all: bool,
}

impl Selection {
    /// Resolve an answer to a set of clusters.
    ///
    /// - An empty answer selects the first catalog cluster.
    /// - A cluster name selects that cluster.
    /// - An answer containing `all` selects every mutation cluster, plus
    ///   any host cluster named in the answer (ex. `all mink`).
    /// - A host cluster name in any case (ex. `Mink`) selects that cluster.
    ///
    /// Returns [`None`] if the answer matches nothing.
    ///
    /// ```
    /// use cluster_dynamics::cluster::sarscov2;
    /// use cluster_dynamics::prompt::Selection;
    ///
    /// let catalog = sarscov2::build()?;
    /// let selection = Selection::parse("all mink", &catalog).unwrap();
    /// assert_eq!(selection.clusters.len(), catalog.clusters.len());
    /// assert!(Selection::parse("S999", &catalog).is_none());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn parse(answer: &str, catalog: &Catalog) -> Option<Selection> {
        let answer = answer.trim();
        let single = |name: &str| Selection { clusters: vec![name.to_string()], all: false };

        if answer.is_empty() {
            return catalog.clusters.first().map(|c| single(&c.name));
        }
        if let Some(cluster) = catalog.get(answer) {
            return Some(single(&cluster.name));
        }

        let mentions = |name: &str| answer.to_lowercase().contains(&name.to_lowercase());
        let hosts = catalog.clusters.iter().filter(|c| c.is_host()).collect_vec();

        if answer.contains("all") {
            let clusters = catalog
                .clusters
                .iter()
                .filter(|c| !c.is_host() || mentions(&c.name))
                .map(|c| c.name.clone())
                .collect();
            return Some(Selection { clusters, all: true });
        }

        hosts.into_iter().find(|c| c.name.eq_ignore_ascii_case(answer)).map(|c| single(&c.name))
    }
}

// ----------------------------------------------------------------------------
// Prompt

/// Asks questions on a writer and reads answers, one per line, from a reader.
pub struct Prompt<R, W> {
    reader: R,
    writer: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
    /// Prompt on the terminal.
    pub fn stdin() -> Self {
        Prompt::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R, W> Prompt<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(reader: R, writer: W) -> Self {
        Prompt { reader, writer }
    }

    /// Ask a question and read one line. The end of input reads as an empty answer.
    pub fn ask(&mut self, question: &str) -> Result<String, Report> {
        write!(self.writer, "\n{question}")?;
        self.writer.flush().wrap_err("Failed to write prompt.")?;
        let mut answer = String::new();
        self.reader.read_line(&mut answer).wrap_err("Failed to read answer.")?;
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask a yes/no question, Enter is no.
    pub fn confirm(&mut self, question: &str) -> Result<bool, Report> {
        let answer = self.ask(&format!("{question}(y/n) (Enter is no): "))?;
        Ok(YES.contains(&answer.as_str()))
    }

    /// Ask which clusters to run until the answer matches the catalog.
    pub fn select_clusters(&mut self, catalog: &Catalog) -> Result<Selection, Report> {
        if catalog.clusters.is_empty() {
            return Err(eyre!("The cluster catalog is empty."));
        }
        let default = catalog.names().first().copied().unwrap_or_default();
        let hosts = catalog.clusters.iter().filter(|c| c.is_host()).map(|c| &c.name).join(", ");
        let question = match hosts.is_empty() {
            true => format!("What cluster to run? (Enter for {default}) Type 'all' for all: "),
            false => format!(
                "What cluster to run? (Enter for {default}) Type 'all' for all, type 'all {hosts}' for all+{hosts}: "
            ),
        };

        loop {
            let answer = self.ask(&question)?;
            match Selection::parse(&answer, catalog) {
                Some(selection) => {
                    info!("These clusters will be run: {}", selection.clusters.join(", "));
                    return Ok(selection);
                }
                None => {
                    writeln!(self.writer, "Not found. Options are: {}", catalog.names().join(", "))?;
                }
            }
        }
    }
}
