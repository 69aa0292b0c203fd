
use crate::cluster::{sarscov2, Catalog, Rule};
use crate::Table;
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ----------------------------------------------------------------------------
// Structs

/// Arguments for list clusters.
#[derive(Clone, Debug, Default, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct Args {
    /// Cluster name.
    #[clap(short = 'n', long)]
    pub name: Option<String>,

    /// Cluster catalog (JSON), the built-in SARS-CoV-2 catalog if not set.
    #[clap(short = 'c', long)]
    pub catalog: Option<PathBuf>,
}

// ----------------------------------------------------------------------------
// Functions

/// Render a cluster's rule as short text, ex. `22227,28932,29645` or `host=Mink`.
pub fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::Exclusive { required, excluded } => {
            format!("{} not {}", required.iter().join(","), excluded.iter().join(","))
        }
        Rule::Substitutions { required, alternate } if alternate.is_empty() => {
            required.iter().join(",")
        }
        Rule::Substitutions { required, alternate } => {
            format!("{} or {}", required.iter().join(","), alternate.iter().join(","))
        }
        Rule::Deletions { required } => format!("del:{}", required.iter().join(",")),
        Rule::Host(host) => format!("host={host}"),
    }
}

/// List clusters
pub fn clusters(args: &Args) -> Result<Table<String>, Report> {
    let catalog = match &args.catalog {
        Some(path) => Catalog::read(path)?,
        None => sarscov2::build()?,
    };

    if let Some(name) = &args.name {
        if catalog.get(name).is_none() {
            return Err(eyre!("Cluster {name} was not found in the catalog.")
                .suggestion(format!("Available clusters: {}", catalog.names().join(", "))));
        }
    }

    let mut table = Table::new();
    table.headers = ["Name", "Build Name", "Description", "Rule"].into_iter().map(String::from).collect();

    for cluster in &catalog.clusters {
        if args.name.as_ref().is_some_and(|name| name != &cluster.name) {
            continue;
        }
        let row = vec![
            cluster.name.clone(),
            cluster.build_name.clone(),
            cluster.description.clone().unwrap_or_default(),
            describe_rule(&cluster.rule),
        ];
        table.add_row(row)?;
    }

    println!("\n{}", table.to_markdown());

    Ok(table)
}
