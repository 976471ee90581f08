//! Bundler configuration
//!
//! Settings are read from `modpack.toml` (or an explicit path) and every field
//! falls back to its default, so an empty file is a valid configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;

use crate::error::{BundleError, BundleResult};

/// File looked up in the working directory when no config path is given
pub const CONFIG_FILE_NAME: &str = "modpack.toml";

pub const DEFAULT_OUTPUT: &str = "bundle.js";

/// How imports of the same file from different places map onto assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupeStrategy {
    /// Every importer gets its own asset for each distinct specifier it uses,
    /// so a module imported from two files is evaluated twice.
    ///
    /// A specifier repeated within one file yields a single child asset, so ids
    /// differ from a numbering that allocates one child per raw import.
    #[default]
    PerImport,
    /// One asset per resolved path; import cycles are allowed
    ByPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Extensions tried, in order, for specifiers that do not name a file
    pub extensions: Vec<String>,
    pub dedupe: DedupeStrategy,
    /// Make the runtime throw when a module is required while still initializing
    pub strict_circular_requires: bool,
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: vec!["js".into(), "mjs".into(), "cjs".into()],
            dedupe: DedupeStrategy::default(),
            strict_circular_requires: false,
            output: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `modpack.toml` in `cwd` when it exists
    pub fn load(path: Option<&Path>, cwd: &Path) -> BundleResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let candidate = cwd.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_file(&candidate)
                } else {
                    debug!("No {CONFIG_FILE_NAME} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> BundleResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| BundleError::io(path, source))?;
        let config = Self::from_toml(&text).map_err(|message| BundleError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn from_toml(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.message().to_owned())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.') || ext.contains('/'))
        {
            return Err(format!(
                "extension '{bad}' must be a bare extension such as \"js\""
            ));
        }
        Ok(())
    }

    /// Output path, relative paths resolved against `cwd`
    pub fn output_path(&self, cwd: &Path) -> PathBuf {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        if output.is_absolute() {
            output
        } else {
            cwd.join(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_kebab_case_fields() {
        let config = Config::from_toml(
            r#"
extensions = ["mjs", "js"]
dedupe = "by-path"
strict-circular-requires = true
output = "dist/app.js"
"#,
        )
        .unwrap();

        assert_eq!(config.extensions, vec!["mjs", "js"]);
        assert_eq!(config.dedupe, DedupeStrategy::ByPath);
        assert!(config.strict_circular_requires);
        assert_eq!(config.output, Some(PathBuf::from("dist/app.js")));
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let err = Config::from_toml(r#"extensions = [".js"]"#).unwrap_err();
        assert!(err.contains("'.js'"), "unexpected message: {err}");
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(Config::from_toml("minify = true").is_err());
    }

    #[test]
    fn test_load_prefers_file_in_cwd() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "dedupe = \"by-path\"").unwrap();

        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.dedupe, DedupeStrategy::ByPath);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(None, dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "dedupe = \"sometimes\"").unwrap();

        let err = Config::load(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, BundleError::Config { path: p, .. } if p == path));
    }

    #[test]
    fn test_output_path_relative_to_cwd() {
        let config = Config::default();
        assert_eq!(
            config.output_path(Path::new("/work")),
            PathBuf::from("/work/bundle.js")
        );
    }
}
