//! Error taxonomy for a bundling run
//!
//! Every variant is fatal: a build either produces a bundle from every reachable
//! module or fails with the first error encountered.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

pub type BundleResult<T> = Result<T, BundleError>;

#[derive(Error, Debug)]
pub enum BundleError {
    /// Source file missing or unreadable
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed source reported by the extractor
    #[error("failed to parse {}:\n{diagnostics}", path.display())]
    Parse {
        path: PathBuf,
        diagnostics: Diagnostics,
    },

    /// Source the transformer could not rewrite
    #[error("failed to transform {}:\n{diagnostics}", path.display())]
    Transform {
        path: PathBuf,
        diagnostics: Diagnostics,
    },

    /// Import specifier with no unique target on disk
    #[error("cannot resolve '{specifier}' imported from {}: {reason}", importer.display())]
    Resolution {
        specifier: String,
        importer: PathBuf,
        reason: ResolutionFailure,
    },

    /// Import cycle found while building one asset per import site
    #[error("circular import: {}", format_cycle(cycle))]
    CircularImport { cycle: Vec<PathBuf> },

    /// Bundle could not be written
    #[error("failed to write bundle to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a specifier failed to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    NotFound { attempted: PathBuf },
    Ambiguous { candidates: Vec<PathBuf> },
    BareSpecifier,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { attempted } => {
                write!(f, "no such file {}", attempted.display())
            }
            Self::Ambiguous { candidates } => {
                write!(f, "ambiguous between ")?;
                for (idx, candidate) in candidates.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", candidate.display())?;
                }
                Ok(())
            }
            Self::BareSpecifier => write!(f, "package imports are not supported"),
        }
    }
}

/// Messages produced by a parse/transform collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(pub Vec<String>);

impl Diagnostics {
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, message) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "  {message}")?;
        }
        Ok(())
    }
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
