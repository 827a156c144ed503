use std::fs;

use sluice::errors::SluiceError;
use sluice::fileset::{FileSelector, PathTable};

#[test]
fn exclusion_after_inclusion_removes_matches() {
    let selector =
        FileSelector::new(&["src/**/*.js", "!src/**/*.min.js"]).unwrap();

    assert!(selector.matches("src/a.js"));
    assert!(selector.matches("src/b.js"));
    assert!(!selector.matches("src/a.min.js"));
    assert!(!selector.matches("other/a.js"));
}

#[test]
fn later_inclusion_wins_over_earlier_exclusion() {
    // Order matters: an exclusion only cancels preceding inclusions.
    let selector =
        FileSelector::new(&["!src/**/*.min.js", "src/**/*.js"]).unwrap();

    assert!(selector.matches("src/a.min.js"));
}

#[test]
fn empty_selector_matches_nothing() {
    let selector = FileSelector::new::<&str>(&[]).unwrap();
    assert!(selector.is_empty());
    assert!(!selector.matches("src/a.js"));
}

#[test]
fn invalid_glob_is_a_structural_error() {
    let err = FileSelector::new(&["src/[**.js"]).unwrap_err();
    assert!(matches!(err, SluiceError::Glob { .. }));
}

#[test]
fn resolve_walks_root_and_applies_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.js"), "var a;").unwrap();
    fs::write(src.join("a.min.js"), "var a;").unwrap();
    fs::write(src.join("b.js"), "var b;").unwrap();

    let selector =
        FileSelector::new(&["src/**/*.js", "!src/**/*.min.js"]).unwrap();
    let files = selector.resolve(dir.path()).unwrap();

    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.js", "b.js"], "sorted, minified file excluded");
}

#[test]
fn path_table_expands_placeholders() {
    let table = PathTable::new(
        [("dev".to_string(), "app/src".to_string())].into_iter().collect(),
    );

    assert_eq!(
        table.expand("${dev}/js/**/*.js").unwrap(),
        "app/src/js/**/*.js"
    );
    assert_eq!(table.expand("no placeholders").unwrap(), "no placeholders");
}

#[test]
fn path_table_rejects_unknown_and_unterminated_names() {
    let table = PathTable::default();

    let err = table.expand("${missing}/x").unwrap_err();
    assert!(matches!(err, SluiceError::Config(_)));

    let err = table.expand("${broken").unwrap_err();
    assert!(matches!(err, SluiceError::Config(_)));
}
