//! Import specifier resolution
//!
//! Specifiers are resolved relative to the directory of the importing file.
//! Only relative and absolute paths are supported; there is no package lookup.

use std::path::{Component, Path, PathBuf};

use log::trace;

use crate::error::{BundleError, BundleResult, ResolutionFailure};

#[derive(Debug, Clone)]
pub struct Resolver {
    extensions: Vec<String>,
}

impl Resolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Resolve `specifier` as written in `importer` to a file on disk
    pub fn resolve(&self, importer: &Path, specifier: &str) -> BundleResult<PathBuf> {
        let fail = |reason| BundleError::Resolution {
            specifier: specifier.to_owned(),
            importer: importer.to_path_buf(),
            reason,
        };

        if !is_path_specifier(specifier) {
            return Err(fail(ResolutionFailure::BareSpecifier));
        }

        let base = importer.parent().unwrap_or_else(|| Path::new(""));
        let joined = normalize(&base.join(specifier));
        trace!("Resolving '{specifier}' from {} as {}", importer.display(), joined.display());

        if joined.is_file() {
            return Ok(joined);
        }

        let mut candidates: Vec<PathBuf> = self
            .extensions
            .iter()
            .map(|ext| with_appended_extension(&joined, ext))
            .filter(|candidate| candidate.is_file())
            .collect();
        match candidates.len() {
            0 => {}
            1 => return Ok(candidates.swap_remove(0)),
            _ => return Err(fail(ResolutionFailure::Ambiguous { candidates })),
        }

        if joined.is_dir() {
            if let Some(index) = self
                .extensions
                .iter()
                .map(|ext| joined.join(format!("index.{ext}")))
                .find(|candidate| candidate.is_file())
            {
                return Ok(index);
            }
        }

        Err(fail(ResolutionFailure::NotFound { attempted: joined }))
    }
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Path::new(specifier).is_absolute()
}

/// `foo.config` + `js` gives `foo.config.js`, unlike `Path::with_extension`
fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// Lexically collapse `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
