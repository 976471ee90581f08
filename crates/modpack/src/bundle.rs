//! Bundle synthesis
//!
//! The bundle is a single immediately-invoked function. Its argument is an array
//! whose slot `i` holds the loader function of asset `i`; its body is a small
//! runtime providing cached `require(id)` and a bootstrap `require(0)`.

use std::path::Path;

use cow_utils::CowUtils;
use log::debug;

use crate::{asset::Asset, graph::Graph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleOptions {
    /// Throw instead of returning partially-initialized exports when a module is
    /// required while its loader is still running
    pub strict_circular_requires: bool,
}

const RUNTIME_HEAD: &str = r#"(function (modules) {
  var cache = {};

  function require(moduleId) {
    var record = cache[moduleId];
    if (record) {
"#;

const CIRCULAR_GUARD: &str = r#"      if (record.state === "loading") {
        throw new Error("Circular require of module " + moduleId);
      }
"#;

const RUNTIME_TAIL: &str = r#"      return record.module.exports;
    }
    var module = { exports: {} };
    record = cache[moduleId] = { state: "loading", module: module };
    try {
      modules[moduleId](module.exports, module, require);
    } catch (error) {
      delete cache[moduleId];
      throw error;
    }
    record.state = "loaded";
    return module.exports;
  }

  require(0);
})(["#;

/// Render the bundle text for `graph`. Output depends only on the graph and
/// options, so identical inputs give identical bundles.
pub fn synthesize(graph: &Graph, options: BundleOptions) -> String {
    let code_len: usize = graph.assets().iter().map(|asset| asset.code.len()).sum();
    let mut out = String::with_capacity(code_len + 1024);

    out.push_str(RUNTIME_HEAD);
    if options.strict_circular_requires {
        out.push_str(CIRCULAR_GUARD);
    }
    out.push_str(RUNTIME_TAIL);

    let root = graph.root_dir();
    for (idx, asset) in graph.assets().iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push('\n');
        write_loader(&mut out, asset, root);
    }
    out.push_str("\n]);\n");

    debug!(
        "Synthesized bundle of {} bytes from {} assets",
        out.len(),
        graph.len()
    );
    out
}

fn write_loader(out: &mut String, asset: &Asset, root: &Path) {
    let display = asset
        .file
        .strip_prefix(root)
        .unwrap_or(&asset.file)
        .display()
        .to_string();
    // A path containing `*/` would end the comment early
    let label = display.as_str().cow_replace("*/", "*\\/");
    out.push_str(&format!("/* {}: {label} */\n", asset.id));
    out.push_str("function (exports, module, require) {\n");
    let code = asset.code.trim_end();
    if !code.is_empty() {
        out.push_str(code);
        out.push('\n');
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use insta::assert_snapshot;

    use super::*;
    use crate::asset::{AssetId, ResolutionMap};

    fn asset(id: u32, file: &str, code: &str) -> Asset {
        Asset {
            id: AssetId::new(id),
            file: PathBuf::from(file),
            deps: Vec::new(),
            code: code.to_owned(),
            resolution_map: ResolutionMap::default(),
        }
    }

    #[test]
    fn test_two_module_bundle() {
        let mut entry = asset(0, "src/index.js", "var b = require(1);\nconsole.log(b);\n");
        entry.deps.push("./b".into());
        entry.resolution_map.insert("./b".into(), AssetId::new(1));
        let graph = Graph::from_assets(vec![entry, asset(1, "src/b.js", "module.exports = 42;")]);

        assert_snapshot!(synthesize(&graph, BundleOptions::default()), @r#"
        (function (modules) {
          var cache = {};

          function require(moduleId) {
            var record = cache[moduleId];
            if (record) {
              return record.module.exports;
            }
            var module = { exports: {} };
            record = cache[moduleId] = { state: "loading", module: module };
            try {
              modules[moduleId](module.exports, module, require);
            } catch (error) {
              delete cache[moduleId];
              throw error;
            }
            record.state = "loaded";
            return module.exports;
          }

          require(0);
        })([
        /* 0: index.js */
        function (exports, module, require) {
        var b = require(1);
        console.log(b);
        },
        /* 1: b.js */
        function (exports, module, require) {
        module.exports = 42;
        }
        ]);
        "#);
    }

    #[test]
    fn test_strict_runtime_guards_reentry() {
        let graph = Graph::from_assets(vec![asset(0, "main.js", "")]);
        let bundle = synthesize(
            &graph,
            BundleOptions {
                strict_circular_requires: true,
            },
        );

        assert!(bundle.contains(r#"if (record.state === "loading") {"#));
        assert!(bundle.contains("Circular require of module"));
        assert!(bundle.ends_with(
            "/* 0: main.js */\nfunction (exports, module, require) {\n}\n]);\n"
        ));
    }

    #[test]
    fn test_comment_terminator_in_path_escaped() {
        let graph = Graph::from_assets(vec![
            asset(0, "main.js", "require(1);"),
            asset(1, "we*/ird.js", "1;"),
        ]);
        let bundle = synthesize(&graph, BundleOptions::default());
        assert!(bundle.contains("/* 1: we*\\/ird.js */"), "{bundle}");
    }
}
