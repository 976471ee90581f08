//! Drives a full bundling run: graph, bundle text, and the single output write

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{
    asset::{AssetBuilder, Extractor, Transformer},
    bundle::{BundleOptions, synthesize},
    config::Config,
    ecma::{CommonJsTransformer, ImportExtractor},
    error::{BundleError, BundleResult},
    graph::{Graph, GraphBuilder},
    resolver::Resolver,
};

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub output: PathBuf,
    pub modules: usize,
    pub bytes: usize,
}

pub struct Bundler {
    config: Config,
    extractor: Box<dyn Extractor>,
    transformer: Box<dyn Transformer>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Bundler {
    /// Bundler using the oxc-based collaborators
    pub fn new(config: Config) -> Self {
        Self::with_collaborators(
            config,
            Box::new(ImportExtractor),
            Box::new(CommonJsTransformer),
        )
    }

    pub fn with_collaborators(
        config: Config,
        extractor: Box<dyn Extractor>,
        transformer: Box<dyn Transformer>,
    ) -> Self {
        Self {
            config,
            extractor,
            transformer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build_graph(&self, entry: &Path) -> BundleResult<Graph> {
        let assets = AssetBuilder::new(self.extractor.as_ref(), self.transformer.as_ref());
        let resolver = Resolver::new(self.config.extensions.clone());
        GraphBuilder::new(assets, resolver, self.config.dedupe).build(entry)
    }

    /// Bundle text for `entry`; nothing is written
    pub fn bundle(&self, entry: &Path) -> BundleResult<String> {
        let graph = self.build_graph(entry)?;
        Ok(synthesize(&graph, self.bundle_options()))
    }

    /// Build and write the bundle to `output`. The file is only touched once the
    /// whole graph has been built.
    pub fn bundle_to_file(&self, entry: &Path, output: &Path) -> BundleResult<BundleSummary> {
        let graph = self.build_graph(entry)?;
        let text = synthesize(&graph, self.bundle_options());

        let write_err = |source| BundleError::Write {
            path: output.to_path_buf(),
            source,
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(output, &text).map_err(write_err)?;

        info!(
            "Wrote {} modules ({} bytes) to {}",
            graph.len(),
            text.len(),
            output.display()
        );
        Ok(BundleSummary {
            output: output.to_path_buf(),
            modules: graph.len(),
            bytes: text.len(),
        })
    }

    fn bundle_options(&self) -> BundleOptions {
        BundleOptions {
            strict_circular_requires: self.config.strict_circular_requires,
        }
    }
}
