//! Named mutation clusters, and matching sequences to them.
//!
//! A cluster is defined by a [`Rule`]: substitutions that must (or must not) be
//! present, deleted positions, or a host species. Matching is boolean, with no
//! partial matches or scores.

pub mod list;
pub mod sarscov2;


use crate::metadata::{Denylist, Metadata, Record};
use crate::sequence::Diagnostic;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::default::Default;
use std::fmt::Debug;
use std::path::Path;

// ----------------------------------------------------------------------------
// Definition

/// The mutation criteria of a cluster, as written in a catalog file.
///
/// Every field is optional and defaults to empty. Which fields are non-empty
/// decides the [`Rule`] the definition is evaluated with.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Definition {
    /// Substitution coordinates that must all be present.
    #[serde(default, alias = "snps")]
    pub required_snps: BTreeSet<usize>,
    /// Substitution coordinates that satisfy the cluster in place of `required_snps`.
    #[serde(default, alias = "snps2")]
    pub alternate_snps: BTreeSet<usize>,
    /// Substitution coordinates that must all be absent.
    #[serde(default, alias = "exclude_snps")]
    pub excluded_snps: BTreeSet<usize>,
    /// Deleted coordinates that must all be present.
    #[serde(default, alias = "gaps")]
    pub required_gaps: BTreeSet<usize>,
    /// Host species, matched against metadata instead of mutations.
    #[serde(default)]
    pub host: Option<String>,
}

// ----------------------------------------------------------------------------
// Rule

/// How a sequence is tested for cluster membership.
///
/// Exactly one variant applies to a [`Definition`], picked in this order:
///
/// 1. [`Rule::Exclusive`]: required and excluded substitutions are both given.
/// 2. [`Rule::Substitutions`]: required substitutions are given.
/// 3. [`Rule::Deletions`]: required deletions are given.
///
/// A `host` overrides all of the above with [`Rule::Host`].
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    /// All `required` present and all `excluded` absent.
    Exclusive { required: BTreeSet<usize>, excluded: BTreeSet<usize> },
    /// All `required` present, or all of a non-empty `alternate` present.
    Substitutions { required: BTreeSet<usize>, alternate: BTreeSet<usize> },
    /// All `required` deletions present.
    Deletions { required: BTreeSet<usize> },
    /// Metadata `host` equal to this value.
    Host(String),
}

impl TryFrom<Definition> for Rule {
    type Error = Report;

    fn try_from(definition: Definition) -> Result<Self, Report> {
        let Definition { required_snps, alternate_snps, excluded_snps, required_gaps, host } =
            definition;

        let rule = if let Some(host) = host {
            Rule::Host(host)
        } else if !required_snps.is_empty() && !excluded_snps.is_empty() {
            Rule::Exclusive { required: required_snps, excluded: excluded_snps }
        } else if !required_snps.is_empty() {
            Rule::Substitutions { required: required_snps, alternate: alternate_snps }
        } else if !required_gaps.is_empty() {
            Rule::Deletions { required: required_gaps }
        } else {
            return Err(eyre!("Cluster definition has no criteria.")
                .suggestion("Set at least one of: snps, gaps, or host."));
        };

        Ok(rule)
    }
}

impl Rule {
    /// Return true if the sequence diagnostic satisfies this rule.
    ///
    /// [`Rule::Host`] never matches a diagnostic, see [`Metadata::filter_host`].
    ///
    /// ```
    /// use cluster_dynamics::cluster::Rule;
    /// use cluster_dynamics::sequence::Diagnostic;
    /// use std::collections::BTreeSet;
    ///
    /// let rule = Rule::Substitutions { required: BTreeSet::from([23063]), alternate: BTreeSet::from([23064]) };
    /// assert!(rule.matches(&Diagnostic::new("A", "241,23063", "")?));
    /// assert!(rule.matches(&Diagnostic::new("B", "241,23064", "")?));
    /// assert!(!rule.matches(&Diagnostic::new("C", "241", "")?));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn matches(&self, diagnostic: &Diagnostic) -> bool {
        let subs = &diagnostic.substitutions;
        match self {
            Rule::Exclusive { required, excluded } => {
                required.is_subset(subs) && excluded.is_disjoint(subs)
            }
            Rule::Substitutions { required, alternate } => {
                required.is_subset(subs) || (!alternate.is_empty() && alternate.is_subset(subs))
            }
            Rule::Deletions { required } => required.is_subset(&diagnostic.deletions),
            Rule::Host(_) => false,
        }
    }
}

// ----------------------------------------------------------------------------
// Cluster

/// Country removed from a cluster to write an additional, reduced strain list.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CountryExclusion {
    /// Country (or subdivision) to drop.
    pub country: String,
    /// File name suffix of the reduced outputs, ex. `noUK`.
    pub suffix: String,
}

/// Catalog file entry, as deserialized before the [`Rule`] is resolved.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Entry {
    pub name: String,
    pub build_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub definition: Definition,
    #[serde(default)]
    pub url_params: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default = "default_overview")]
    pub overview: bool,
    #[serde(default)]
    pub without_country: Option<CountryExclusion>,
}

fn default_overview() -> bool {
    true
}

/// A named mutation cluster.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(try_from = "Entry")]
pub struct Cluster {
    /// Name used to select the cluster, ex. `S222`.
    pub name: String,
    /// Display name used in reports and output file names, ex. `20A.EU1`.
    pub build_name: String,
    /// Short label shown next to the build name, ex. `S:A222V`.
    pub description: Option<String>,
    pub rule: Rule,
    /// Query string of the focal build link, `f_region=Europe` if not set.
    pub url_params: Option<String>,
    /// Free text lines added to the cluster's markdown report.
    pub notes: Vec<String>,
    /// Whether the cluster contributes to the all-cluster overview reports.
    pub overview: bool,
    pub without_country: Option<CountryExclusion>,
}

impl TryFrom<Entry> for Cluster {
    type Error = Report;

    fn try_from(entry: Entry) -> Result<Self, Report> {
        let rule = Rule::try_from(entry.definition)
            .wrap_err_with(|| format!("Invalid definition for cluster: {}", entry.name))?;
        Ok(Cluster {
            name: entry.name,
            build_name: entry.build_name,
            description: entry.description,
            rule,
            url_params: entry.url_params,
            notes: entry.notes,
            overview: entry.overview,
            without_country: entry.without_country,
        })
    }
}

impl Cluster {
    /// Create a new cluster with default report settings.
    pub fn new(name: &str, build_name: &str, rule: Rule) -> Self {
        Cluster {
            name: name.to_string(),
            build_name: build_name.to_string(),
            description: None,
            rule,
            url_params: None,
            notes: Vec::new(),
            overview: true,
            without_country: None,
        }
    }

    /// Return true if membership comes from metadata rather than mutations.
    pub fn is_host(&self) -> bool {
        matches!(self.rule, Rule::Host(_))
    }
}

// ----------------------------------------------------------------------------
// Catalog

/// The immutable, ordered collection of clusters available for a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub clusters: Vec<Cluster>,
}

impl Catalog {
    /// Create a catalog, checking that cluster and build names are unique.
    pub fn new(clusters: Vec<Cluster>) -> Result<Self, Report> {
        for (label, names) in [
            ("name", clusters.iter().map(|c| &c.name).collect_vec()),
            ("build name", clusters.iter().map(|c| &c.build_name).collect_vec()),
        ] {
            if let Some(name) = names.iter().duplicates().next() {
                return Err(eyre!("Duplicate cluster {label}: {name}"));
            }
        }
        Ok(Catalog { clusters })
    }

    /// Read a catalog from a JSON list of cluster entries.
    pub fn read<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let catalog = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read file: {path:?}."))?;
        let clusters: Vec<Cluster> = serde_json::from_str(&catalog)
            .wrap_err_with(|| format!("Failed to parse file: {path:?}"))?;
        debug!("Catalog clusters: {}", clusters.iter().map(|c| &c.name).join(", "));
        Catalog::new(clusters)
    }

    /// Get a cluster by name.
    pub fn get(&self, name: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Cluster names, in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.clusters.iter().map(|c| c.name.as_str()).collect()
    }
}

// ----------------------------------------------------------------------------
// Matching

/// Find the strains that satisfy each cluster's rule.
///
/// Diagnostics are consumed once, testing every mutation-based cluster per record.
/// Host clusters are taken straight from the metadata. Strains are returned in
/// the order they were encountered.
pub fn match_clusters<'c, I>(
    clusters: &[&'c Cluster],
    diagnostics: I,
    metadata: &Metadata,
) -> Result<BTreeMap<&'c str, Vec<String>>, Report>
where
    I: IntoIterator<Item = Result<Diagnostic, Report>>,
{
    let mut matches: BTreeMap<&str, Vec<String>> =
        clusters.iter().map(|c| (c.name.as_str(), Vec::new())).collect();

    let (host, mutation): (Vec<&Cluster>, Vec<&Cluster>) =
        clusters.iter().copied().partition(|c| c.is_host());

    if !mutation.is_empty() {
        for diagnostic in diagnostics {
            let diagnostic = diagnostic?;
            for cluster in mutation.iter().filter(|c| c.rule.matches(&diagnostic)) {
                if let Some(strains) = matches.get_mut(cluster.name.as_str()) {
                    strains.push(diagnostic.strain.clone());
                }
            }
        }
    }

    for cluster in host {
        if let Rule::Host(host) = &cluster.rule {
            matches.insert(cluster.name.as_str(), metadata.filter_host(host));
        }
    }

    Ok(matches)
}

/// The sequences of a cluster that pass the denylist and collection date filters.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedCluster<'m> {
    /// Metadata records of the cluster sequences, in metadata table order.
    pub records: Vec<&'m Record>,
    /// Number of sequences removed by the denylist.
    pub denylisted: usize,
    /// Number of sequences removed for an incomplete date (or no metadata).
    pub bad_dates: usize,
}

impl<'m> MatchedCluster<'m> {
    /// Filter the matched strains of a cluster against metadata and the denylist.
    pub fn new(strains: &[String], metadata: &'m Metadata, denylist: &Denylist) -> Self {
        let wanted: HashSet<&str> = strains.iter().map(String::as_str).collect();

        let (denylisted, candidates): (Vec<&Record>, Vec<&Record>) = metadata
            .records
            .iter()
            .filter(|r| wanted.contains(r.strain.as_str()))
            .partition(|r| denylist.contains(r));

        let denylisted = denylisted.into_iter().map(|r| r.strain.as_str()).unique().count();
        let remaining = wanted.len() - denylisted;
        let records = candidates.into_iter().filter(|r| r.has_valid_date()).collect_vec();
        let bad_dates = remaining.saturating_sub(records.len());

        MatchedCluster { records, denylisted, bad_dates }
    }

    /// Strain names, in metadata table order.
    pub fn strains(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.strain.as_str()).collect()
    }

    /// Reporting regions, in order of first appearance.
    pub fn regions(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.region()).unique().collect()
    }

    /// Log the number of sequences found and removed.
    pub fn log(&self, cluster: &Cluster) {
        info!("Sequences found for {}: {}", cluster.name, self.records.len());
        if self.denylisted > 0 {
            info!("Sequences on the denylist (excluded): {}", self.denylisted);
        }
        if self.bad_dates > 0 {
            info!("Sequences with bad dates (excluded): {}", self.bad_dates);
        }
    }
}
