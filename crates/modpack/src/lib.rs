//! modpack: bundle an ES module graph into one self-contained script
//!
//! Each module keeps its own function scope inside the bundle and is evaluated
//! once, on its first `require`.

pub mod asset;
pub mod bundle;
pub mod config;
pub mod ecma;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod resolver;

pub use crate::{
    config::{Config, DedupeStrategy},
    error::{BundleError, BundleResult},
    orchestrator::{BundleSummary, Bundler},
};
