//! Module graph construction
//!
//! Starting from the entry file the graph is discovered breadth-first: the
//! asset list doubles as the work queue, so an asset's position is also its id.
//! After all of an asset's specifiers are resolved its code is rewritten to
//! reference dependencies by id.
//!
//! With [`DedupeStrategy::PerImport`] every importer gets a fresh asset for each
//! distinct specifier, even when another importer already pulled in the same
//! file. A cycle would make that unbounded, so the importer chain is checked and
//! the build fails with [`BundleError::CircularImport`]. With
//! [`DedupeStrategy::ByPath`] assets are shared by resolved path and cycles are
//! allowed.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashMap;

use crate::{
    asset::{Asset, AssetBuilder, AssetId, ResolutionMap},
    config::DedupeStrategy,
    error::{BundleError, BundleResult},
    resolver::{Resolver, normalize},
};

/// Every asset reachable from the entry, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    assets: Vec<Asset>,
}

impl Graph {
    #[cfg(test)]
    pub(crate) fn from_assets(assets: Vec<Asset>) -> Self {
        debug_assert!(assets.iter().enumerate().all(|(idx, a)| a.id.index() == idx));
        Self { assets }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn entry(&self) -> &Asset {
        &self.assets[AssetId::ENTRY.index()]
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Directory of the entry file; bundle comments name files relative to it
    pub fn root_dir(&self) -> &Path {
        self.entry().file.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Asset-level dependency edges, node index == asset id
    pub fn dependency_graph(&self) -> DiGraph<AssetId, ()> {
        let mut graph = DiGraph::with_capacity(self.assets.len(), 0);
        for asset in &self.assets {
            graph.add_node(asset.id);
        }
        for asset in &self.assets {
            for target in asset.resolution_map.values() {
                graph.add_edge(
                    NodeIndex::new(asset.id.index()),
                    NodeIndex::new(target.index()),
                    (),
                );
            }
        }
        graph
    }

    /// Groups of assets that import each other, each sorted by id
    pub fn circular_groups(&self) -> Vec<Vec<AssetId>> {
        let graph = self.dependency_graph();
        let mut groups: Vec<Vec<AssetId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || graph.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut ids: Vec<AssetId> = component.into_iter().map(|node| graph[node]).collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        groups.sort_unstable();
        groups
    }
}

/// Builds a [`Graph`] for one entry; consumed by [`GraphBuilder::build`] so
/// ids are never shared between builds
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    assets: AssetBuilder<'a>,
    resolver: Resolver,
    dedupe: DedupeStrategy,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(assets: AssetBuilder<'a>, resolver: Resolver, dedupe: DedupeStrategy) -> Self {
        Self {
            assets,
            resolver,
            dedupe,
        }
    }

    pub fn build(mut self, entry: &Path) -> BundleResult<Graph> {
        let entry = normalize(entry);
        debug!("Building module graph from {}", entry.display());

        let mut assets = vec![self.assets.build(&entry)?];
        // Importer of each asset, used to detect cycles in per-import mode
        let mut importers: Vec<Option<AssetId>> = vec![None];
        let mut by_path: FxHashMap<PathBuf, AssetId> = FxHashMap::default();
        by_path.insert(entry, AssetId::ENTRY);

        let mut cursor = 0;
        while cursor < assets.len() {
            let current = assets[cursor].id;
            let importer = assets[cursor].file.clone();
            let specifiers: Vec<String> = assets[cursor]
                .unique_deps()
                .map(str::to_owned)
                .collect();

            let mut resolution_map = ResolutionMap::default();
            for specifier in specifiers {
                let resolved = self.resolver.resolve(&importer, &specifier)?;

                let reuse = match self.dedupe {
                    DedupeStrategy::ByPath => by_path.get(&resolved).copied(),
                    DedupeStrategy::PerImport => {
                        check_cycle(&assets, &importers, current, &resolved)?;
                        None
                    }
                };
                let id = match reuse {
                    Some(id) => id,
                    None => {
                        let child = self.assets.build(&resolved)?;
                        debug_assert_eq!(child.id.index(), assets.len());
                        let id = child.id;
                        by_path.entry(resolved).or_insert(id);
                        assets.push(child);
                        importers.push(Some(current));
                        id
                    }
                };
                debug!("{} imports '{specifier}' as asset {id}", importer.display());
                resolution_map.insert(specifier, id);
            }

            let asset = &mut assets[cursor];
            asset.code = self
                .assets
                .transformer()
                .rewrite_requires(&asset.file, &asset.code, &resolution_map)
                .map_err(|diagnostics| BundleError::Transform {
                    path: asset.file.clone(),
                    diagnostics,
                })?;
            asset.resolution_map = resolution_map;
            cursor += 1;
        }

        let graph = Graph { assets };
        if self.dedupe == DedupeStrategy::ByPath {
            for group in graph.circular_groups() {
                let files: Vec<String> = group
                    .iter()
                    .filter_map(|id| graph.get(*id))
                    .map(|asset| asset.file.display().to_string())
                    .collect();
                warn!("Circular dependency between {}", files.join(", "));
            }
        }
        info!("Module graph complete with {} assets", graph.len());
        Ok(graph)
    }
}

/// Fail when `target` is already on the importer chain of `current`
fn check_cycle(
    assets: &[Asset],
    importers: &[Option<AssetId>],
    current: AssetId,
    target: &Path,
) -> BundleResult<()> {
    let mut chain = Vec::new();
    let mut cursor = Some(current);
    while let Some(id) = cursor {
        let file = &assets[id.index()].file;
        chain.push(file.clone());
        if file == target {
            chain.reverse();
            chain.push(target.to_path_buf());
            return Err(BundleError::CircularImport { cycle: chain });
        }
        cursor = importers[id.index()];
    }
    Ok(())
}
