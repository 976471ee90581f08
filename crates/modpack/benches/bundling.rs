use std::{fmt::Write, fs, hint::black_box, path::Path};

use criterion::{Criterion, criterion_group, criterion_main};
use modpack::{Bundler, Config, DedupeStrategy};
use tempfile::TempDir;

/// `m0.js` imports `m1.js` and so on; every module also imports `shared.js`
fn generate_chain(dir: &Path, length: usize) {
    for idx in 0..length {
        let mut source = String::new();
        if idx + 1 < length {
            let _ = writeln!(source, "import {{ value as next }} from './m{}';", idx + 1);
        } else {
            source.push_str("const next = 0;\n");
        }
        source.push_str("import { shared } from './shared';\n");
        let _ = writeln!(source, "export const value = next + shared + {idx};");
        fs::write(dir.join(format!("m{idx}.js")), source).expect("write module");
    }
    fs::write(dir.join("shared.js"), "export const shared = 1;\n").expect("write shared");
}

fn bench_bundling(c: &mut Criterion) {
    let dir = TempDir::new().expect("temp dir");
    generate_chain(dir.path(), 200);
    let entry = dir.path().join("m0.js");

    let per_import = Bundler::new(Config::default());
    c.bench_function("bundle_chain_per_import", |b| {
        b.iter(|| black_box(per_import.bundle(&entry).expect("bundle")));
    });

    let by_path = Bundler::new(Config {
        dedupe: DedupeStrategy::ByPath,
        ..Config::default()
    });
    c.bench_function("bundle_chain_by_path", |b| {
        b.iter(|| black_box(by_path.bundle(&entry).expect("bundle")));
    });
}

criterion_group!(benches, bench_bundling);
criterion_main!(benches);
