use census::core::{ArgCount, Arity, Catalog, CatalogEntry, CatalogLoadError};
use std::fs;
use std::path::Path;

#[test]
fn catalog_loads_json_entries_with_arity_and_chaining() {
    let catalog = Catalog::from_json_str(
        r#"{
            "sum": [{"owner_module": "pkg.functions", "min_arity": 1, "max_arity": 1}],
            "agg": [{"module": "pkg.frame", "min_arity": 1, "chain_returning": true}],
            "table": [{"owner_module": "pkg.session", "returns": "pkg.frame"}]
        }"#,
    )
    .unwrap();

    assert_eq!(catalog.len(), 3);

    let sum = catalog.get("sum", "pkg.functions").unwrap();
    assert_eq!(sum.arity, Arity::exactly(1));
    assert!(!sum.is_chain_returning());

    let agg = catalog.get("agg", "pkg.frame").unwrap();
    assert_eq!(agg.arity, Arity::new(1, None));
    assert_eq!(agg.returns.as_deref(), Some("pkg.frame"));

    let table = catalog.get("table", "pkg.session").unwrap();
    assert_eq!(table.arity, Arity::unbounded());
    assert_eq!(table.returns.as_deref(), Some("pkg.frame"));
}

#[test]
fn catalog_keeps_every_owner_of_a_shared_name() {
    let catalog = Catalog::from_json_str(
        r#"{"count": [
            {"owner_module": "pkg.frame", "min_arity": 0, "max_arity": 0},
            {"owner_module": "pkg.functions", "min_arity": 1, "max_arity": 1}
        ]}"#,
    )
    .unwrap();

    let owners: Vec<_> = catalog
        .lookup("count")
        .iter()
        .map(|e| e.owner_module.as_str())
        .collect();
    assert_eq!(owners, vec!["pkg.frame", "pkg.functions"]);
    assert!(catalog.lookup("missing").is_empty());
}

#[test]
fn catalog_duplicate_owner_last_one_wins() {
    let catalog = Catalog::from_json_str(
        r#"{"sum": [
            {"owner_module": "pkg.functions", "min_arity": 1},
            {"owner_module": "pkg.functions", "min_arity": 2}
        ]}"#,
    )
    .unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.lookup("sum")[0].arity.min, 2);
}

#[test]
fn catalog_listing_skips_bare_names() {
    let catalog = Catalog::from_json_str(
        r#"{"functions": ["pkg.functions.sum", "sum", "pkg.frame.agg"], "classes": []}"#,
    )
    .unwrap();

    assert_eq!(catalog.len(), 2);
    let sum = catalog.get("sum", "pkg.functions").unwrap();
    assert_eq!(sum.arity, Arity::unbounded());
    assert!(!sum.is_chain_returning());
    assert!(catalog.contains("agg", "pkg.frame"));
}

#[test]
fn catalog_loads_plain_text_listing_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("functions.txt");
    fs::write(
        &path,
        "# generated\npkg.functions.col\n\n  pkg.frame.agg  \nlonely\n",
    )
    .unwrap();

    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains("col", "pkg.functions"));
    assert!(catalog.contains("agg", "pkg.frame"));
    assert!(catalog.lookup("lonely").is_empty());
}

#[test]
fn catalog_loads_json_file_by_extension() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(&path, r#"{"sum": [{"owner_module": "pkg.functions"}]}"#).unwrap();

    let catalog = Catalog::load(&path).unwrap();
    assert!(catalog.contains("sum", "pkg.functions"));
}

#[test]
fn catalog_rejects_structural_problems() {
    let missing_owner = Catalog::from_json_str(r#"{"sum": [{"min_arity": 1}]}"#);
    assert!(matches!(
        missing_owner,
        Err(CatalogLoadError::MissingModule { ref name }) if name == "sum"
    ));

    let inverted = Catalog::from_json_str(
        r#"{"sum": [{"owner_module": "pkg.functions", "min_arity": 3, "max_arity": 1}]}"#,
    );
    assert!(matches!(
        inverted,
        Err(CatalogLoadError::InvalidArity { min: 3, max: 1, .. })
    ));

    let malformed = Catalog::from_json_str(r#"{"sum": 3}"#);
    assert!(matches!(malformed, Err(CatalogLoadError::Json(_))));

    let unreadable = Catalog::load(Path::new("/definitely/not/here.json"));
    assert!(matches!(unreadable, Err(CatalogLoadError::Io { .. })));
}

#[test]
fn catalog_builder_validates_entries() {
    let empty_name = Catalog::builder().entry(CatalogEntry::new("", "pkg.frame", Arity::unbounded()));
    assert!(matches!(empty_name, Err(CatalogLoadError::MissingName { .. })));

    let catalog = Catalog::builder()
        .entry(CatalogEntry::new("agg", "pkg.frame", Arity::new(1, None)).chain_returning())
        .unwrap()
        .build();
    assert!(catalog.get("agg", "pkg.frame").unwrap().is_chain_returning());
    assert_eq!(
        catalog.get("agg", "pkg.frame").unwrap().qualified_name(),
        "pkg.frame.agg"
    );
}

#[test]
fn arity_accepts_open_counts_against_the_upper_bound_only() {
    let exactly_two = Arity::exactly(2);
    assert!(exactly_two.accepts(ArgCount::exact(2)));
    assert!(!exactly_two.accepts(ArgCount::exact(1)));
    assert!(!exactly_two.accepts(ArgCount::exact(3)));

    let open = ArgCount { known: 0, open: true };
    assert!(exactly_two.accepts(open));
    assert!(!exactly_two.accepts(ArgCount { known: 3, open: true }));

    assert!(Arity::unbounded().accepts(ArgCount::exact(40)));
}
