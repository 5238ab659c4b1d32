//! End-to-end tests of the `run` and `compare` subcommands against files on disk.

use std::fs;
use std::path::Path;

use argh::FromArgs;
use framebench::Record;
use framebench_cli::{Args, execute};

fn execute_args(args: &[&str]) -> framebench::Result<String> {
    let args = Args::from_args(&["framebench"], args).unwrap();

    let mut out = Vec::new();
    execute(&args, &mut out)?;

    Ok(String::from_utf8(out).unwrap())
}

fn write_corpus(dir: &Path) {
    let corpus = dir.join("corpus");
    fs::create_dir(&corpus).unwrap();
    fs::write(corpus.join("a.txt"), "abcabcabc hello hello hello ".repeat(200)).unwrap();
    fs::write(corpus.join("b.txt"), "0123456789".repeat(500)).unwrap();
    fs::write(dir.join("dictionary"), "hello hello abcabc 0123456789").unwrap();
}

#[test]
fn run_then_compare() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let corpus = dir.path().join("corpus");
    let dictionary = dir.path().join("dictionary");

    let session = |label: &str| {
        execute_args(&[
            "run",
            "-i",
            corpus.to_str().unwrap(),
            "-D",
            dictionary.to_str().unwrap(),
            "-b",
            "1",
            "-e",
            "2",
            "-l",
            label,
            "-t",
            "200us",
            "-c",
            "2",
            "--operation",
            "zstd_compress_using_cdict",
            "--operation",
            "deflate_raw",
        ])
        .unwrap()
    };

    let baseline = session("dev");
    let lines: Vec<_> = baseline.lines().collect();
    assert_eq!(lines.len(), 4);

    let first = Record::parse(lines[0]).unwrap();
    assert_eq!(first.label(), "dev");
    assert_eq!(first.operation(), "zstd_compress_using_cdict");
    assert_eq!(first.level(), 1);
    assert_eq!(first.contexts(), 2);

    let baseline_path = dir.path().join("dev.txt");
    let candidate_path = dir.path().join("exp.txt");
    fs::write(&baseline_path, &baseline).unwrap();
    fs::write(&candidate_path, session("exp")).unwrap();

    let comparison = execute_args(&[
        "compare",
        baseline_path.to_str().unwrap(),
        candidate_path.to_str().unwrap(),
    ])
    .unwrap();

    assert!(comparison.contains("dev vs exp"));
    assert!(comparison.contains("summary"));
}

#[test]
fn run_reports_missing_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let result = execute_args(&["run", "-i", missing.to_str().unwrap()]);

    assert!(matches!(result, Err(framebench::Error::Io { .. })));
}
