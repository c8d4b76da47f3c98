use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SETTING_VARS: &[&str] = &[
    "LGTM_SRC",
    "LGTM_INDEX_INCLUDE",
    "LGTM_INDEX_EXCLUDE",
    "LGTM_INDEX_FILTERS",
    "LGTM_INDEX_TYPESCRIPT",
    "LGTM_REPOSITORY_FOLDERS_CSV",
    "SEMMLE_DIST",
    "RUST_LOG",
];

fn filescope_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_filescope"))
}

fn run_cli(args: &[String], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(filescope_bin());
    cmd.args(args);
    for key in SETTING_VARS {
        cmd.env_remove(key);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute filescope CLI")
}

fn parse_json_output(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn run_cli_json<T: DeserializeOwned>(args: &[String], envs: &[(&str, &str)]) -> T {
    let output = run_cli(args, envs);
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_value(parse_json_output(&output)).expect("unexpected JSON shape")
}

#[derive(Debug, Deserialize)]
struct SelectionOutput {
    root: PathBuf,
    files: Vec<PathBuf>,
    externs: usize,
    stats: StatsOutput,
}

#[derive(Debug, Deserialize)]
struct StatsOutput {
    dirs_pruned: usize,
    files_seen: usize,
}

#[derive(Debug, Deserialize)]
struct ExplainOutput {
    path: String,
    verdict: String,
    descend: bool,
    reason: serde_json::Value,
}

fn setup_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("create temp dir");
    let root = temp.path().canonicalize().unwrap().join("src");
    for rel in ["a.js", "a.json", "a.html", "node_modules/dep/index.js"] {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }
    (temp, root)
}

fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
    files
        .iter()
        .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn select_json_with_defaults() {
    let (_temp, root) = setup_tree();
    let args = vec![
        "select".to_string(),
        root.to_string_lossy().to_string(),
        "--json".to_string(),
    ];
    let selection: SelectionOutput = run_cli_json(&args, &[]);
    assert_eq!(selection.root, root);
    assert_eq!(
        names(&selection.files, &root),
        vec!["a.html", "a.js", "node_modules/dep/index.js"]
    );
    assert_eq!(selection.externs, 0);
    assert_eq!(selection.stats.files_seen, 4);
}

#[test]
fn select_reads_settings_from_environment() {
    let (_temp, root) = setup_tree();
    let args = vec!["select".to_string(), "--json".to_string()];
    let selection: SelectionOutput = run_cli_json(
        &args,
        &[
            ("LGTM_SRC", root.to_str().unwrap()),
            ("LGTM_INDEX_EXCLUDE", "node_modules"),
        ],
    );
    assert_eq!(names(&selection.files, &root), vec!["a.html", "a.js"]);
    assert_eq!(selection.stats.dirs_pruned, 1);
}

#[test]
fn select_flags_and_plain_output() {
    let (_temp, root) = setup_tree();
    let args = vec![
        "select".to_string(),
        root.to_string_lossy().to_string(),
        "--filter".to_string(),
        "include:**/*.json".to_string(),
        "--filter".to_string(),
        "exclude:**/node_modules".to_string(),
    ];
    let output = run_cli(&args, &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<PathBuf> = stdout.lines().map(PathBuf::from).collect();
    assert_eq!(names(&lines, &root), vec!["a.html", "a.js", "a.json"]);
}

#[test]
fn select_includes_externs_from_dist() {
    let (temp, root) = setup_tree();
    let dist = temp.path().join("dist");
    let externs = dist.join("tools").join("data").join("externs");
    fs::create_dir_all(&externs).unwrap();
    fs::write(externs.join("es5.js"), "").unwrap();

    let args = vec![
        "select".to_string(),
        root.to_string_lossy().to_string(),
        "--json".to_string(),
    ];
    let selection: SelectionOutput =
        run_cli_json(&args, &[("SEMMLE_DIST", dist.to_str().unwrap())]);
    assert_eq!(selection.externs, 1);
    assert_eq!(selection.files.len(), 4);
}

#[test]
fn invalid_filter_fails_before_walking() {
    let (_temp, root) = setup_tree();
    let args = vec![
        "select".to_string(),
        root.to_string_lossy().to_string(),
        "--json".to_string(),
    ];
    let output = run_cli(&args, &[("LGTM_INDEX_FILTERS", "keep:**/*.js")]);
    assert!(!output.status.success());
    let error = parse_json_output(&output);
    let message = error["error"]["message"].as_str().unwrap();
    assert!(message.contains("line 1"), "{}", message);
}

#[test]
fn invalid_typescript_mode_exits_non_zero() {
    let (_temp, root) = setup_tree();
    let args = vec![
        "select".to_string(),
        root.to_string_lossy().to_string(),
        "--typescript".to_string(),
        "full".to_string(),
    ];
    let output = run_cli(&args, &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("LGTM_INDEX_TYPESCRIPT"));
}

#[test]
fn missing_root_is_reported() {
    let args = vec!["select".to_string()];
    let output = run_cli(&args, &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No source root given"));
}

#[test]
fn explain_json_reports_reasons() {
    let (_temp, root) = setup_tree();
    let args = vec![
        "explain".to_string(),
        "node_modules".to_string(),
        "a.json".to_string(),
        "--root".to_string(),
        root.to_string_lossy().to_string(),
        "--exclude".to_string(),
        "node_modules".to_string(),
        "--json".to_string(),
    ];
    let explained: Vec<ExplainOutput> = run_cli_json(&args, &[]);
    assert_eq!(explained.len(), 2);

    assert_eq!(explained[0].path, "node_modules");
    assert_eq!(explained[0].verdict, "exclude");
    assert!(!explained[0].descend);
    assert_eq!(explained[0].reason["kind"], "path_list");
    assert_eq!(explained[0].reason["rule"], "node_modules");

    assert_eq!(explained[1].path, "a.json");
    assert_eq!(explained[1].reason["kind"], "unrecognized_type");
}
