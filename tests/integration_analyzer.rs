use census::core::{
    Catalog, DiagnosticKind, Granularity, ScanConfig, TieBreakPolicy, UsageAnalyzer,
};
use census::formatters::JsonReportFormatter;
use std::fs;
use std::path::{Path, PathBuf};

fn catalog() -> Catalog {
    Catalog::from_json_str(
        r#"{
            "col": [{"owner_module": "pkg.functions", "min_arity": 1, "max_arity": 1}],
            "sum": [{"owner_module": "pkg.functions", "min_arity": 1, "max_arity": 1}],
            "table": [{"owner_module": "pkg.session", "returns": "pkg.frame"}],
            "filter": [{"owner_module": "pkg.frame", "chain_returning": true}],
            "select": [{"owner_module": "pkg.frame", "chain_returning": true}]
        }"#,
    )
    .unwrap()
}

fn job(i: usize) -> String {
    format!(
        "\
from pkg import functions as F

frame = spark.table(\"events_{i}\")
frame = frame.filter(F.col(\"day\") > {i}).select(F.sum(F.col(\"amount\")))
"
    )
}

fn write_project(root: &Path, files: usize) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for i in 0..files {
        let dir = root.join(format!("jobs_{}", i % 3));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("job_{i}.py"));
        fs::write(&path, job(i)).unwrap();
        paths.push(path);
    }
    paths.sort();
    paths
}

#[test]
fn analyzer_end_to_end_on_small_project() {
    let dir = tempfile::TempDir::new().unwrap();
    write_project(dir.path(), 1);

    let catalog = catalog();
    let outcome = UsageAnalyzer::new(&catalog)
        .analyze_directory(dir.path())
        .unwrap();

    assert_eq!(outcome.result.total_files_analyzed, 1);
    assert_eq!(outcome.files_skipped(), 0);

    let names: Vec<_> = outcome
        .result
        .matches
        .iter()
        .map(|m| m.qualified_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "pkg.session.table",
            "pkg.frame.filter",
            "pkg.functions.col",
            "pkg.frame.select",
            "pkg.functions.sum",
            "pkg.functions.col",
        ]
    );
    assert_eq!(outcome.result.total_matches, 6);
    assert!(outcome
        .result
        .matches
        .iter()
        .all(|m| !m.context.contains("events") && !m.context.contains("amount")));
}

#[test]
fn frequency_table_orders_by_count_then_name() {
    let dir = tempfile::TempDir::new().unwrap();
    write_project(dir.path(), 2);

    let catalog = catalog();
    let outcome = UsageAnalyzer::new(&catalog)
        .analyze_directory(dir.path())
        .unwrap();

    let rows: Vec<(&str, usize)> = outcome
        .frequencies
        .rows()
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("pkg.functions.col", 4),
            ("pkg.frame.filter", 2),
            ("pkg.frame.select", 2),
            ("pkg.functions.sum", 2),
            ("pkg.session.table", 2),
        ]
    );

    let by_function = UsageAnalyzer::new(&catalog)
        .with_config(ScanConfig::new().with_granularity(Granularity::Function))
        .analyze_directory(dir.path())
        .unwrap();
    assert_eq!(by_function.frequencies.get("col"), Some(4));
    assert_eq!(by_function.frequencies.get("pkg.functions.col"), None);
}

#[test]
fn results_are_identical_across_worker_counts() {
    let dir = tempfile::TempDir::new().unwrap();
    let files = write_project(dir.path(), 24);
    let catalog = catalog();

    let single = UsageAnalyzer::new(&catalog)
        .with_config(ScanConfig::new().with_workers(1))
        .analyze(&files)
        .unwrap();
    let many = UsageAnalyzer::new(&catalog)
        .with_config(ScanConfig::new().with_workers(8))
        .analyze(&files)
        .unwrap();
    let again = UsageAnalyzer::new(&catalog)
        .with_config(ScanConfig::new().with_workers(8))
        .analyze(&files)
        .unwrap();

    assert_eq!(single.result.total_files_analyzed, 24);
    assert_eq!(single.result.matches, many.result.matches);
    assert_eq!(many.result.matches, again.result.matches);

    let formatter = JsonReportFormatter::new();
    assert_eq!(
        formatter.format_result(&single.result).unwrap(),
        formatter.format_result(&many.result).unwrap()
    );
}

#[test]
fn invalid_file_is_skipped_without_failing_the_scan() {
    let dir = tempfile::TempDir::new().unwrap();
    let valid = write_project(dir.path(), 3);
    let broken = dir.path().join("broken.py");
    fs::write(&broken, "def broken(:\n    return F.col(x)\n").unwrap();

    let catalog = catalog();
    let analyzer = UsageAnalyzer::new(&catalog);
    let with_broken = analyzer.analyze_directory(dir.path()).unwrap();
    let valid_only = analyzer.analyze(&valid).unwrap();

    assert_eq!(with_broken.result.total_files_analyzed, 3);
    assert_eq!(with_broken.files_skipped(), 1);
    assert_eq!(with_broken.diagnostics[0].file, broken);
    assert_eq!(with_broken.diagnostics[0].kind, DiagnosticKind::Parse);
    assert_eq!(with_broken.result.matches, valid_only.result.matches);
}

#[test]
fn unreadable_file_becomes_an_io_diagnostic() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("gone.py");

    let catalog = catalog();
    let outcome = UsageAnalyzer::new(&catalog).analyze(&[missing]).unwrap();

    assert_eq!(outcome.result.total_files_analyzed, 0);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::Io);
}

#[test]
fn duplicate_paths_are_analyzed_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let files = write_project(dir.path(), 1);
    let doubled = vec![files[0].clone(), files[0].clone()];

    let catalog = catalog();
    let outcome = UsageAnalyzer::new(&catalog).analyze(&doubled).unwrap();

    assert_eq!(outcome.result.total_files_analyzed, 1);
    assert_eq!(outcome.result.total_matches, 6);
}

#[test]
fn tie_break_policy_reaches_the_workers() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join("job.py"),
        "frame = spark.table(name)\nframe.count(a)\n",
    )
    .unwrap();

    let catalog = Catalog::from_json_str(
        r#"{
            "table": [{"owner_module": "pkg.session", "returns": "pkg.frame"}],
            "count": [
                {"owner_module": "pkg.frame", "min_arity": 0, "max_arity": 0},
                {"owner_module": "pkg.functions", "min_arity": 1, "max_arity": 1}
            ]
        }"#,
    )
    .unwrap();

    let modules = |policy| {
        UsageAnalyzer::new(&catalog)
            .with_config(ScanConfig::new().with_tie_break(policy))
            .analyze_directory(dir.path())
            .unwrap()
            .result
            .matches
            .into_iter()
            .map(|m| m.module)
            .collect::<Vec<_>>()
    };

    assert_eq!(modules(TieBreakPolicy::OwnerFirst), vec!["pkg.session", "pkg.frame"]);
    assert_eq!(modules(TieBreakPolicy::ArityFirst), vec!["pkg.session", "pkg.functions"]);
}
