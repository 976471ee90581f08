use std::fs;

use modpack::{BundleError, Bundler, Config, DedupeStrategy};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, source) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
    }
    dir
}

#[test]
fn test_writes_bundle_and_reports_summary() {
    let dir = project(&[
        ("src/index.js", "import b from './b';\nconsole.log(b);\n"),
        ("src/b.js", "module.exports = 42;\n"),
    ]);
    let output = dir.path().join("dist").join("bundle.js");

    let summary = Bundler::new(Config::default())
        .bundle_to_file(&dir.path().join("src/index.js"), &output)
        .unwrap();

    assert_eq!(summary.modules, 2);
    assert_eq!(summary.output, output);
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.len(), summary.bytes);
    assert!(written.starts_with("(function (modules) {"));
    assert!(written.contains("/* 0: index.js */"));
    assert!(written.contains("/* 1: b.js */"));
    assert!(written.contains("require(0);\n})(["));
}

#[test]
fn test_failed_build_writes_nothing() {
    let dir = project(&[
        ("index.js", "import './ok';\nimport './missing';\n"),
        ("ok.js", ""),
    ]);
    let output = dir.path().join("out").join("bundle.js");

    let err = Bundler::new(Config::default())
        .bundle_to_file(&dir.path().join("index.js"), &output)
        .unwrap_err();

    assert!(matches!(err, BundleError::Resolution { ref specifier, .. } if specifier == "./missing"));
    assert!(!output.exists());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_bundles_are_reproducible() {
    let dir = project(&[
        ("a.js", "import { b } from './b';\nimport { c } from './c';\nexport default b + c;\n"),
        ("b.js", "import { d } from './d';\nexport const b = d;\n"),
        ("c.js", "import { d } from './d';\nexport const c = d * 2;\n"),
        ("d.js", "export const d = 1;\n"),
    ]);
    let entry = dir.path().join("a.js");
    let bundler = Bundler::new(Config::default());

    assert_eq!(bundler.bundle(&entry).unwrap(), bundler.bundle(&entry).unwrap());
}

#[test]
fn test_dedupe_strategy_changes_module_count() {
    let dir = project(&[
        ("a.js", "import './b';\nimport './c';\n"),
        ("b.js", "import './d';\n"),
        ("c.js", "import './d';\n"),
        ("d.js", ""),
    ]);
    let entry = dir.path().join("a.js");

    let per_import = Bundler::new(Config::default()).build_graph(&entry).unwrap();
    let by_path = Bundler::new(Config {
        dedupe: DedupeStrategy::ByPath,
        ..Config::default()
    })
    .build_graph(&entry)
    .unwrap();

    assert_eq!(per_import.len(), 5);
    assert_eq!(by_path.len(), 4);
}

#[test]
fn test_configured_extensions_drive_resolution() {
    let dir = project(&[("main.js", "import './util';\n"), ("util.mjs", "")]);
    let entry = dir.path().join("main.js");

    let graph = Bundler::new(Config {
        extensions: vec!["mjs".into()],
        ..Config::default()
    })
    .build_graph(&entry)
    .unwrap();

    assert_eq!(graph.assets()[1].file, dir.path().join("util.mjs"));

    let err = Bundler::new(Config {
        extensions: vec!["js".into()],
        ..Config::default()
    })
    .build_graph(&entry)
    .unwrap_err();
    assert!(matches!(err, BundleError::Resolution { .. }));
}
