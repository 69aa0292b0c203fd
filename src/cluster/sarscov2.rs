//! Built-in SARS-CoV-2 cluster catalog.
//!
//! Spike mutation clusters that spread through Europe in the second half of
//! 2020, plus the mink-associated sequences selected by host.

use crate::cluster::{Catalog, Cluster, CountryExclusion, Definition, Rule};
use color_eyre::eyre::{Report, Result};
use std::collections::BTreeSet;

/// Name, build name, description, substitutions, alternate substitutions, deletions.
type Row = (&'static str, &'static str, &'static str, &'static [usize], &'static [usize], &'static [usize]);

const CLUSTERS: &[Row] = &[
    ("S222", "20A.EU1", "S:A222V", &[22227, 28932, 29645], &[], &[]),
    ("S477", "20A.EU2", "S:S477N", &[22992], &[], &[]),
    ("S501", "S.N501", "S:N501", &[23063], &[23064], &[]),
    ("S69", "S.H69-", "S:H69-", &[], &[], &[21765, 21766, 21767, 21768, 21769, 21770]),
    ("S439", "S.N439K", "S:N439K", &[22879], &[], &[]),
    ("S453", "S.Y453F", "S:Y453F", &[22920], &[], &[]),
    ("S98", "S.S98F", "S:S98F", &[21855], &[], &[]),
    ("S484", "S.E484", "S:E484", &[23012], &[], &[]),
    ("S80", "S.D80Y", "S:D80Y", &[21800], &[], &[]),
    ("S626", "S.A626S", "S:A626S", &[23438], &[], &[]),
    ("S1122", "S.V1122L", "S:V1122L", &[24926], &[], &[]),
];

const S501_NOTES: &[&str] = &[
    "Note any pre-2020 Chinese sequences are from SARS-like viruses in bats (not SARS-CoV-2).",
    "Note that this mutation has multiple amino-acid mutants - these numbers refer to _all_ these mutations (Y, S, T).",
];

/// Create the SARS-CoV-2 cluster catalog.
///
/// ```
/// use cluster_dynamics::cluster::sarscov2;
///
/// let catalog = sarscov2::build()?;
/// assert_eq!(catalog.names()[0], "S222");
/// assert!(catalog.get("mink").is_some_and(|c| c.is_host()));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn build() -> Result<Catalog, Report> {
    let mut clusters = CLUSTERS
        .iter()
        .map(|(name, build_name, description, snps, snps2, gaps)| {
            let definition = Definition {
                required_snps: BTreeSet::from_iter(snps.iter().copied()),
                alternate_snps: BTreeSet::from_iter(snps2.iter().copied()),
                required_gaps: BTreeSet::from_iter(gaps.iter().copied()),
                ..Default::default()
            };
            let mut cluster = Cluster::new(name, build_name, Rule::try_from(definition)?);
            cluster.description = Some(description.to_string());
            Ok(cluster)
        })
        .collect::<Result<Vec<_>, Report>>()?;

    for cluster in clusters.iter_mut().filter(|c| c.name == "S501") {
        cluster.notes = S501_NOTES.iter().map(|n| n.to_string()).collect();
        cluster.without_country = Some(CountryExclusion {
            country: "United Kingdom".to_string(),
            suffix: "noUK".to_string(),
        });
    }

    clusters.push(Cluster::new("mink", "mink", Rule::Host("Mink".to_string())));

    Catalog::new(clusters)
}
