use crate::prompt::Prompt;
use crate::run::{self, Args};

use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result};
use indoc::indoc;
use std::path::Path;
use tempfile::TempDir;

const METADATA: &str = indoc! {"
    strain\tdate\tcountry\tdivision\thost\tgisaid_epi_isl\toriginating_lab\tsubmitting_lab\tauthors
    A\t2020-07-20\tSpain\tValencia\tHuman\tEPI_1\tLab A\tLab B\tAuthor A
    B\t2020-07-21\tSpain\tValencia\tHuman\tEPI_2\tLab A\tLab B\tAuthor A
    C\t2020-07-28\tSpain\tValencia\tHuman\tEPI_3\tLab A\tLab B\tAuthor A
    D\t2020-07-28\tSpain\tValencia\tHuman\tEPI_4\tLab A\tLab B\tAuthor A
    E\t2020-07-22\tUnited Kingdom\tWales\tHuman\tEPI_5\tLab C\tLab D\tAuthor B
    F\t2020-XX-01\tSpain\tValencia\tHuman\tEPI_6\tLab A\tLab B\tAuthor A
    G\t2020-08-03\tDenmark\tHovedstaden\tHuman\tEPI_7\tLab E\tLab F\tAuthor C
    H\t2020-08-04\tUnited Kingdom\tEngland\tHuman\tEPI_8\tLab C\tLab D\tAuthor B
    M\t2020-10-01\tNetherlands\tLimburg\tMink\tEPI_9\tLab G\tLab H\tAuthor D
"};

const DIAGNOSTICS: &str = indoc! {"
    strain\tall_snps\tgap_list
    A\t22227,28932,29645\t
    B\t22227,28932,29645\t
    C\t241,22227,28932,29645\t
    D\t241\t
    E\t22227,28932,29645\t
    F\t22227,28932,29645\t
    G\t23063\t
    H\t23064\t
    M\t\t
"};

fn setup(dir: &Path) -> Result<Args, Report> {
    std::fs::write(dir.join("metadata.tsv"), METADATA)?;
    std::fs::write(dir.join("sequence-diagnostics.tsv"), DIAGNOSTICS)?;
    std::fs::write(dir.join("bad_sequences.json"), r#"{"G": "2020-08-03"}"#)?;

    Ok(Args {
        diagnostics: dir.join("sequence-diagnostics.tsv"),
        metadata: dir.join("metadata.tsv"),
        cluster_dir: dir.join("cluster_profile"),
        tables_dir: dir.join("cluster_tables"),
        acknowledgements_dir: dir.join("acknowledgements"),
        bad_sequences: Some(dir.join("bad_sequences.json")),
        min_sequences: 2,
        plot_cutoff: 2,
        ..Default::default()
    })
}

fn date() -> Result<NaiveDate, Report> {
    NaiveDate::from_ymd_opt(2021, 1, 8).ok_or_else(|| Report::msg("invalid date"))
}

#[test]
fn run_all_clusters() -> Result<(), Report> {
    let dir = TempDir::new()?;
    let mut args = setup(dir.path())?;
    args.clusters = Some("all mink".to_string());
    args.write_files = Some(true);
    args.write_acknowledgements = Some(true);

    let mut prompt = Prompt::new("".as_bytes(), Vec::new());
    let outcome = run::run_with(&args, &mut prompt, date()?)?;
    assert_eq!(outcome.analyses.len(), 12);

    // matching and filters
    let s222 = outcome.get("S222").ok_or_else(|| Report::msg("S222 missing"))?;
    assert_eq!(s222.strains, vec!["A", "B", "C", "E"]);
    let s501 = outcome.get("S501").ok_or_else(|| Report::msg("S501 missing"))?;
    assert_eq!(s501.strains, vec!["H"]);
    let mink = outcome.get("mink").ok_or_else(|| Report::msg("mink missing"))?;
    assert_eq!(mink.strains, vec!["M"]);

    // weekly series
    let spain = s222.series.get("Spain").ok_or_else(|| Report::msg("Spain missing"))?;
    assert_eq!(spain.unsmoothed_cluster_sequences, vec![2, 1]);
    assert_eq!(spain.unsmoothed_total_sequences, vec![2, 2]);
    assert!(s222.series.get("Wales").is_none());
    assert!(s501.series.is_empty());

    // strain lists
    let cluster_dir = &args.cluster_dir;
    let list = std::fs::read_to_string(cluster_dir.join("clusters/cluster_20A.EU1.txt"))?;
    assert_eq!(list, "A\nB\nC\nE\n");
    assert!(cluster_dir.join("clusters/cluster_20A.EU1-2021-01-08.txt").exists());
    assert!(cluster_dir.join("cluster_info/cluster_20A.EU1_meta.tsv").exists());
    let no_uk = std::fs::read_to_string(cluster_dir.join("clusters/cluster_S.N501-noUK.txt"))?;
    assert_eq!(no_uk, "");
    assert!(cluster_dir.join("clusters/cluster_S.N501-noUK-2021-01-08.txt").exists());
    assert!(cluster_dir.join("cluster_info/cluster_S.N501-noUK_meta.tsv").exists());

    // tables and markdown
    let tables_dir = &args.tables_dir;
    let table = std::fs::read_to_string(tables_dir.join("20A.EU1_table.tsv"))?;
    assert_eq!(
        table,
        "country\tfirst_seq\tnum_seqs\tlast_seq\nSpain\t2020-07-20\t3\t2020-07-28\nWales\t2020-07-22\t1\t2020-07-22\n"
    );
    let all_md = std::fs::read_to_string(tables_dir.join("all_tables.md"))?;
    assert!(all_md.starts_with("\n# Overview of Clusters/Mutations in Europe"));
    assert!(all_md.contains("\n## 20A.EU1\n"));
    assert!(all_md.contains("\n## S.N501\n"));
    assert!(!all_md.contains("## mink"));
    let all_tsv = std::fs::read_to_string(tables_dir.join("all_tables.tsv"))?;
    assert!(all_tsv.contains("\n## mink\n"));

    // plotting data
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(tables_dir.join("20A.EU1_data.json"))?)?;
    assert_eq!(json["Spain"]["week"], serde_json::json!(["2020-07-20", "2020-07-27"]));
    assert_eq!(json["Spain"]["unsmoothed_cluster_sequences"], serde_json::json!([2, 1]));
    let plot = std::fs::read_to_string(tables_dir.join("perVariant_countries_toPlot.json"))?;
    assert_eq!(plot, r#"{"Spain":"True"}"#);

    // acknowledgements
    let acks = std::fs::read_to_string(args.acknowledgements_dir.join("S222_acknowledgement_table.tsv"))?;
    assert_eq!(acks.lines().count(), 5);
    assert!(acks.starts_with("strain\tgisaid_epi_isl\toriginating_lab\tsubmitting_lab\tauthors\nA\tEPI_1"));
    Ok(())
}

#[test]
fn run_prompted_without_files() -> Result<(), Report> {
    let dir = TempDir::new()?;
    let args = setup(dir.path())?;

    let mut output = Vec::new();
    let mut prompt = Prompt::new("n\n\nS999\nS501\n".as_bytes(), &mut output);
    let outcome = run::run_with(&args, &mut prompt, date()?)?;

    assert_eq!(outcome.analyses.len(), 1);
    assert_eq!(outcome.analyses[0].strains, vec!["H"]);
    assert!(!args.cluster_dir.exists());
    assert!(!args.tables_dir.exists());

    let output = String::from_utf8(output)?;
    assert!(output.contains("Write out files?(y/n) (Enter is no): "));
    assert!(output.contains("Not found."));
    Ok(())
}

#[test]
fn run_unknown_cluster() -> Result<(), Report> {
    let dir = TempDir::new()?;
    let mut args = setup(dir.path())?;
    args.clusters = Some("S999".to_string());
    args.write_files = Some(false);
    args.write_acknowledgements = Some(false);

    let mut prompt = Prompt::new("".as_bytes(), Vec::new());
    assert!(run::run_with(&args, &mut prompt, date()?).is_err());
    Ok(())
}

#[test]
fn run_host_cluster_skips_diagnostics() -> Result<(), Report> {
    let dir = TempDir::new()?;
    let mut args = setup(dir.path())?;
    args.diagnostics = dir.path().join("missing.tsv");
    args.clusters = Some("mink".to_string());
    args.write_files = Some(false);
    args.write_acknowledgements = Some(false);

    let mut prompt = Prompt::new("".as_bytes(), Vec::new());
    let outcome = run::run_with(&args, &mut prompt, date()?)?;
    assert_eq!(outcome.analyses[0].strains, vec!["M"]);
    Ok(())
}

#[test]
fn run_catalog_without_overview() -> Result<(), Report> {
    let dir = TempDir::new()?;
    let mut args = setup(dir.path())?;
    args.plot_cutoff = 1;
    args.clusters = Some("all".to_string());
    args.write_files = Some(true);
    args.write_acknowledgements = Some(false);

    // rows without trailing empty gap_list values
    let diagnostics = "strain\tall_snps\tgap_list\nA\t22227,28932,29645\nC\t241,22227\nD\t241\n";
    std::fs::write(&args.diagnostics, diagnostics)?;

    let catalog = dir.path().join("catalog.json");
    std::fs::write(
        &catalog,
        r#"[
            {"name": "S222", "build_name": "20A.EU1", "snps": [99999]},
            {"name": "Danish", "build_name": "DanishCluster", "snps": [241], "overview": false}
        ]"#,
    )?;
    args.catalog = Some(catalog);

    let mut prompt = Prompt::new("".as_bytes(), Vec::new());
    let outcome = run::run_with(&args, &mut prompt, date()?)?;

    let danish = outcome.get("Danish").ok_or_else(|| Report::msg("Danish missing"))?;
    assert_eq!(danish.strains, vec!["C", "D"]);
    assert!(!danish.overview);
    assert!(run::plot_countries(&outcome.analyses, 2, 1).is_empty());

    let tables_dir = &args.tables_dir;
    let all_md = std::fs::read_to_string(tables_dir.join("all_tables.md"))?;
    assert!(!all_md.contains("## DanishCluster"));
    let plot = std::fs::read_to_string(tables_dir.join("perVariant_countries_toPlot.json"))?;
    assert_eq!(plot, r#"{"Spain":"False"}"#);
    Ok(())
}
