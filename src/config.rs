//! TOML configuration for `bee`.
//!
//! A project keeps a `bee.toml` next to its scripts. Every section has
//! defaults, so a project without a config file still gets a working store
//! under `.bee/` in the current directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// File name looked up in the current working directory.
pub const CONFIG_FILE_NAME: &str = "bee.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "BEE_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for one `bee` invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory relative database paths are resolved against. Set by the
    /// loader, never read from the file.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl BeeConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        info!(path = %path.display(), "loaded bee configuration");
        Ok(config)
    }

    /// Resolve the configuration for an invocation started in `cwd`.
    ///
    /// Lookup order:
    /// 1. `explicit` (the `--config` flag).
    /// 2. The path in the `BEE_CONFIG` environment variable.
    /// 3. `bee.toml` in `cwd`.
    /// 4. Compiled-in defaults rooted at `cwd`.
    ///
    /// A file named by 1 or 2 must load; a broken `bee.toml` found by
    /// discovery is an error as well, since silently ignoring it would point
    /// the run history at a different database.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(&cwd.join(path));
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            if !env_path.is_empty() {
                return Self::load(&cwd.join(env_path));
            }
        }

        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load(&local);
        }

        debug!(cwd = %cwd.display(), "no bee.toml found, using defaults");
        Ok(Self {
            base_dir: cwd.to_path_buf(),
            ..Self::default()
        })
    }

    /// Absolute (or cwd-relative, if `base_dir` is empty) database path.
    pub fn database_path(&self) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            self.base_dir.join(&self.database.path)
        }
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// SQLite store location and pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. Relative paths are resolved against the directory of
    /// the config file.
    pub path: PathBuf,
    /// Maximum pooled connections. One invocation only ever needs a couple.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".bee/bee.db"),
            pool_size: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// How scripts are launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program used to launch scripts (`node`, `bash`, `python3`, ...).
    /// When unset the script file itself is executed.
    pub interpreter: Option<String>,
    /// Echo each captured stdout line to the terminal while the script runs.
    pub echo: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            echo: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit log lines as JSON objects.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BeeConfig::default();
        assert_eq!(config.database.path, PathBuf::from(".bee/bee.db"));
        assert_eq!(config.database.pool_size, 2);
        assert!(config.runner.interpreter.is_none());
        assert!(config.runner.echo);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [runner]
            interpreter = "node"
        "#;
        let config: BeeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.interpreter.as_deref(), Some("node"));
        assert!(config.runner.echo);
        assert_eq!(config.database.pool_size, 2);
    }

    #[test]
    fn test_load_resolves_database_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bee.toml");
        std::fs::write(&path, "[database]\npath = \"data/runs.db\"\n").unwrap();

        let config = BeeConfig::load(&path).unwrap();
        assert_eq!(config.database_path(), dir.path().join("data/runs.db"));
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bee.toml"), "[logging]\nlevel = \"info\"\n").unwrap();
        std::fs::write(dir.path().join("other.toml"), "[logging]\nlevel = \"debug\"\n").unwrap();

        let config = BeeConfig::discover(Some(Path::new("other.toml")), dir.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_discover_without_file_roots_defaults_at_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let config = BeeConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.database_path(), dir.path().join(".bee/bee.db"));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bee.toml");
        std::fs::write(&path, "[database\npath = ").unwrap();
        assert!(BeeConfig::load(&path).is_err());
    }
}
