use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sluice::config::ConfigFile;
use sluice::graph::{RunContext, RunReport, Runner, TaskOutcome};
use sluice::pipeline::{build_graph, build_path_table};
use sluice::stage::{CopyStage, Stage, StageContext};

fn parse(toml_str: &str) -> ConfigFile {
    toml::from_str(toml_str).expect("test config must parse")
}

async fn run_task(
    cfg: &ConfigFile,
    root: &Path,
    task: &str,
    file_override: Option<PathBuf>,
) -> RunReport {
    let paths = Arc::new(build_path_table(cfg));
    let graph = build_graph(cfg, &paths).unwrap();
    let ctx = RunContext {
        paths,
        root: root.to_path_buf(),
        file_override,
    };
    Runner::new(&graph, ctx).run(task).await.unwrap()
}

#[tokio::test]
async fn copy_stage_places_vendor_files() {
    let dir = tempfile::tempdir().unwrap();
    let vendor = dir.path().join("bower_components/jquery");
    fs::create_dir_all(&vendor).unwrap();
    fs::write(vendor.join("jquery.js"), "window.$ = {};").unwrap();

    let cfg = parse(
        r#"
        [paths]
        vendor = "bower_components"
        dev = "app/src"

        [task.vendor-js]
        select = ["${vendor}/**/*.js"]
        stage = [{ kind = "copy", dest = "${dev}/js" }]
        notify = "JS vendor files copied"
        "#,
    );

    let report = run_task(&cfg, dir.path(), "vendor-js", None).await;
    assert!(report.success());
    assert!(dir.path().join("app/src/js/jquery.js").is_file());
}

#[tokio::test]
async fn copy_stage_suffix_renames_before_extension() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src/js");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("app.js"), "var app;").unwrap();

    let cfg = parse(
        r#"
        [task.minify]
        select = ["src/js/**/*.js", "!src/js/**/*.min.js"]
        stage = [{ kind = "copy", dest = "src/js", suffix = ".min" }]
        "#,
    );

    let report = run_task(&cfg, dir.path(), "minify", None).await;
    assert!(report.success());
    assert!(dir.path().join("src/js/app.min.js").is_file());
}

#[tokio::test]
async fn missing_file_is_dropped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = parse(
        r#"
        [task.copy]
        select = ["src/**/*.js"]
        stage = [{ kind = "copy", dest = "out" }]
        "#,
    );

    // Single-file override pointing at a file that does not exist: the copy
    // stage records a per-file failure and the task still succeeds.
    let report = run_task(
        &cfg,
        dir.path(),
        "copy",
        Some(dir.path().join("src/ghost.js")),
    )
    .await;

    assert!(report.success());
    assert!(!dir.path().join("out/ghost.js").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn exec_failure_fails_task_and_skips_dependent() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = parse(
        r#"
        [task.bad]
        stage = [{ kind = "exec", cmd = "exit 3" }]

        [task.dep]
        after = ["bad"]
        "#,
    );

    let report = run_task(&cfg, dir.path(), "dep", None).await;

    assert!(!report.success());
    assert!(matches!(
        report.outcome("bad"),
        Some(TaskOutcome::Failed(msg)) if msg.contains("code 3")
    ));
    assert_eq!(report.outcome("dep"), Some(&TaskOutcome::Skipped));
}

#[cfg(unix)]
#[tokio::test]
async fn exec_runs_in_project_root() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = parse(
        r#"
        [task.touch]
        stage = [{ kind = "exec", cmd = "touch marker.txt" }]
        "#,
    );

    let report = run_task(&cfg, dir.path(), "touch", None).await;
    assert!(report.success());
    assert!(dir.path().join("marker.txt").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn exec_with_files_placeholder_skips_on_empty_set() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = parse(
        r#"
        [task.lint]
        select = ["src/**/*.js"]
        stage = [{ kind = "exec", cmd = "touch ran-on-empty.marker {files}" }]
        "#,
    );

    // Nothing matches the selector, so the command must not run at all:
    // file-driven tools misbehave when handed zero targets.
    let report = run_task(&cfg, dir.path(), "lint", None).await;

    assert!(report.success());
    assert!(!dir.path().join("ran-on-empty.marker").exists());
}

#[tokio::test]
async fn copy_name_collision_is_a_per_file_failure() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("vendor/a");
    let second = dir.path().join("vendor/b");
    std::fs::create_dir_all(&first).unwrap();
    std::fs::create_dir_all(&second).unwrap();
    fs::write(first.join("lib.min.js"), "first").unwrap();
    fs::write(second.join("lib.min.js"), "second").unwrap();

    let stage = CopyStage::new("out", None);
    let ctx = StageContext {
        root: dir.path().to_path_buf(),
        task: "vendor-js".to_string(),
    };

    let output = stage
        .apply(vec![first.join("lib.min.js"), second.join("lib.min.js")], &ctx)
        .await
        .unwrap();

    // The first source wins; the second is dropped with a recorded failure
    // instead of silently overwriting.
    assert_eq!(output.files.len(), 1);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("out/lib.min.js")).unwrap(),
        "first"
    );
}

#[tokio::test]
async fn file_override_applies_to_target_only() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.txt"), "a").unwrap();
    fs::write(src.join("b.txt"), "b").unwrap();

    let cfg = parse(
        r#"
        [task.pre]
        select = ["src/*.txt"]
        stage = [{ kind = "copy", dest = "out_pre" }]

        [task.main]
        after = ["pre"]
        select = ["src/*.txt"]
        stage = [{ kind = "copy", dest = "out_main" }]
        "#,
    );

    let report = run_task(
        &cfg,
        dir.path(),
        "main",
        Some(src.join("a.txt")),
    )
    .await;

    assert!(report.success());
    // The prerequisite keeps its configured selector.
    assert!(dir.path().join("out_pre/a.txt").is_file());
    assert!(dir.path().join("out_pre/b.txt").is_file());
    // The target is restricted to the single file.
    assert!(dir.path().join("out_main/a.txt").is_file());
    assert!(!dir.path().join("out_main/b.txt").exists());
}

#[tokio::test]
async fn aggregator_task_runs_all_prerequisites() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("one.css"), "a{}").unwrap();
    fs::write(src.join("two.js"), "var x;").unwrap();

    let cfg = parse(
        r#"
        [task.styles]
        select = ["src/*.css"]
        stage = [{ kind = "copy", dest = "dist/css" }]

        [task.scripts]
        select = ["src/*.js"]
        stage = [{ kind = "copy", dest = "dist/js" }]

        [task.build]
        after = ["styles", "scripts"]
        notify = "Build complete"
        "#,
    );

    let report = run_task(&cfg, dir.path(), "build", None).await;

    assert!(report.success());
    assert!(dir.path().join("dist/css/one.css").is_file());
    assert!(dir.path().join("dist/js/two.js").is_file());
}
