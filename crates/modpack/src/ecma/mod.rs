//! JavaScript collaborators built on the oxc parser
//!
//! [`ImportExtractor`] lists the specifiers a module imports and
//! [`CommonJsTransformer`] turns ES module syntax into `require` calls and
//! `exports` getters, then later swaps specifiers for asset ids.

mod commonjs;
mod imports;
mod rewrite;

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;

pub use self::{commonjs::to_commonjs, imports::collect_specifiers, rewrite::rewrite_requires};
use crate::{
    asset::{Extractor, ResolutionMap, Transformer},
    error::Diagnostics,
};

/// Extracts import specifiers from ES module source
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportExtractor;

impl Extractor for ImportExtractor {
    fn extract(&self, path: &Path, source: &str) -> Result<Vec<String>, Diagnostics> {
        let allocator = Allocator::default();
        let program = parse(&allocator, source, module_source_type(path))?;
        Ok(collect_specifiers(&program))
    }
}

/// Lowers ES module syntax to CommonJS and rewrites `require` call sites
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonJsTransformer;

impl Transformer for CommonJsTransformer {
    fn transform(&self, path: &Path, source: &str) -> Result<String, Diagnostics> {
        let allocator = Allocator::default();
        let program = parse(&allocator, source, module_source_type(path))?;
        Ok(to_commonjs(source, &program))
    }

    fn rewrite_requires(
        &self,
        _path: &Path,
        code: &str,
        resolution_map: &ResolutionMap,
    ) -> Result<String, Diagnostics> {
        if resolution_map.is_empty() {
            return Ok(code.to_owned());
        }
        let allocator = Allocator::default();
        let program = parse(&allocator, code, SourceType::cjs())?;
        Ok(rewrite_requires(code, &program, resolution_map))
    }
}

/// `.cjs` keeps script semantics, everything else is parsed as a module
fn module_source_type(path: &Path) -> SourceType {
    let source_type = SourceType::from_path(path).unwrap_or_default();
    if path.extension().is_some_and(|ext| ext == "cjs") {
        source_type
    } else {
        source_type.with_module(true)
    }
}

fn parse<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
) -> Result<Program<'a>, Diagnostics> {
    let options = ParseOptions {
        allow_return_outside_function: true,
        ..ParseOptions::default()
    };
    let ret = Parser::new(allocator, source, source_type)
        .with_options(options)
        .parse();

    if !ret.errors.is_empty() {
        return Err(Diagnostics(
            ret.errors.iter().map(ToString::to_string).collect(),
        ));
    }
    if ret.panicked {
        return Err(Diagnostics::single("parser aborted"));
    }
    Ok(ret.program)
}

/// Double-quoted JavaScript string literal
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Text edit against the original source, in byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: u32,
    end: u32,
    replacement: String,
}

impl Edit {
    fn new(start: u32, end: u32, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }
}

/// Apply non-overlapping edits; untouched text is copied verbatim
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| (edit.start, edit.end));
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        let (start, end) = (edit.start as usize, edit.end as usize);
        debug_assert!(start >= cursor, "overlapping edits at {start}");
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("./a"), r#""./a""#);
        assert_eq!(quote("we\"ird\\path\n"), r#""we\"ird\\path\n""#);
        assert_eq!(quote("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn test_apply_edits_out_of_order() {
        let edits = vec![Edit::new(6, 11, "there"), Edit::new(0, 5, "hi")];
        assert_eq!(apply_edits("hello world!", edits), "hi there!");
    }

    #[test]
    fn test_extractor_reports_syntax_errors() {
        let err = ImportExtractor
            .extract(Path::new("broken.js"), "import { from './a';")
            .unwrap_err();
        assert!(!err.0.is_empty());
    }

    #[test]
    fn test_cjs_files_parse_as_scripts() {
        let deps = ImportExtractor
            .extract(Path::new("legacy.cjs"), "module.exports = require('./x');")
            .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_rewrite_skips_parse_without_resolutions() {
        let code = "not even javascript (";
        let out = CommonJsTransformer
            .rewrite_requires(Path::new("a.js"), code, &ResolutionMap::default())
            .unwrap();
        assert_eq!(out, code);
    }
}
