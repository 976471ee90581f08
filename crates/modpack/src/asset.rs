//! Assets: one compiled module each
//!
//! The asset builder reads a file, asks the extractor for its import specifiers,
//! asks the transformer for runnable code, and hands out sequential ids.
//! Parsing and transformation live behind the [`Extractor`] and [`Transformer`]
//! traits so the graph and bundle code never touch a syntax tree.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{BundleError, BundleResult, Diagnostics};

/// Identifier of an asset within one build; the entry is always 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u32);

impl AssetId {
    pub const ENTRY: Self = Self(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw specifier as written in source -> id of the asset it resolved to
pub type ResolutionMap = IndexMap<String, AssetId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub file: PathBuf,
    /// Import specifiers in source order, duplicates kept
    pub deps: Vec<String>,
    /// Transformed code; module references are rewritten to ids once the
    /// resolution map is complete
    pub code: String,
    pub resolution_map: ResolutionMap,
}

impl Asset {
    /// Distinct specifiers in order of first occurrence
    pub fn unique_deps(&self) -> impl Iterator<Item = &str> {
        let mut seen = FxHashSet::default();
        self.deps
            .iter()
            .map(String::as_str)
            .filter(move |dep| seen.insert(*dep))
    }
}

/// Returns the import specifiers referenced by a module's source text
pub trait Extractor {
    /// Specifiers must be in source order with duplicates preserved
    fn extract(&self, path: &Path, source: &str) -> Result<Vec<String>, Diagnostics>;
}

/// Rewrites module source into code runnable inside a
/// `function (exports, module, require) { ... }` scope
pub trait Transformer {
    /// Every import must come out as a `require("<specifier>")` call
    fn transform(&self, path: &Path, source: &str) -> Result<String, Diagnostics>;

    /// Replace `require("<specifier>")` call sites with `require(<id>)` for every
    /// specifier in `resolution_map`
    fn rewrite_requires(
        &self,
        path: &Path,
        code: &str,
        resolution_map: &ResolutionMap,
    ) -> Result<String, Diagnostics>;
}

/// Builds assets and owns the id counter for one build
pub struct AssetBuilder<'a> {
    extractor: &'a dyn Extractor,
    transformer: &'a dyn Transformer,
    next_id: u32,
}

impl fmt::Debug for AssetBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetBuilder")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl<'a> AssetBuilder<'a> {
    pub fn new(extractor: &'a dyn Extractor, transformer: &'a dyn Transformer) -> Self {
        Self {
            extractor,
            transformer,
            next_id: 0,
        }
    }

    pub fn transformer(&self) -> &'a dyn Transformer {
        self.transformer
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u32 {
        self.next_id
    }

    /// Read, extract, and transform `file`. The id is only consumed when all
    /// three steps succeed.
    pub fn build(&mut self, file: &Path) -> BundleResult<Asset> {
        let source = fs::read_to_string(file).map_err(|source| BundleError::io(file, source))?;

        let deps = self
            .extractor
            .extract(file, &source)
            .map_err(|diagnostics| BundleError::Parse {
                path: file.to_path_buf(),
                diagnostics,
            })?;

        let code = self
            .transformer
            .transform(file, &source)
            .map_err(|diagnostics| BundleError::Transform {
                path: file.to_path_buf(),
                diagnostics,
            })?;

        let id = AssetId::new(self.next_id);
        self.next_id += 1;
        debug!("Built asset {id} for {} with {} deps", file.display(), deps.len());

        Ok(Asset {
            id,
            file: file.to_path_buf(),
            deps,
            code,
            resolution_map: ResolutionMap::default(),
        })
    }
}
