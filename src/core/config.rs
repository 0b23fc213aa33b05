//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Project;

/// Currency used when neither config nor caller names one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Default propagation depth limit
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Highest accepted depth limit; propagation recurses once per level
pub const MAX_DEPTH_LIMIT: usize = 2048;

/// bomcost configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Currency assigned to new nomenclature
    pub default_currency: Option<String>,

    /// Deepest nesting the propagator follows, at most [`MAX_DEPTH_LIMIT`]
    pub max_depth: Option<usize>,

    /// Reject analogs outside the line's family
    pub enforce_family_analogs: Option<bool>,

    /// tracing filter directive
    pub log_filter: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load_for(project: Option<&Project>) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/bomcost/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.bomcost/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let blank = contents
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#'));
        if blank {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bomcost")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Overlay BOMCOST_* variables read through `lookup`
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(currency) = lookup("BOMCOST_CURRENCY") {
            self.default_currency = Some(currency);
        }
        if let Some(depth) = lookup("BOMCOST_MAX_DEPTH") {
            match depth.trim().parse() {
                Ok(depth) => self.max_depth = Some(depth),
                Err(_) => tracing::warn!(value = %depth, "BOMCOST_MAX_DEPTH is not a number"),
            }
        }
        if let Some(filter) = lookup("BOMCOST_LOG") {
            self.log_filter = Some(filter);
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_currency.is_some() {
            self.default_currency = other.default_currency;
        }
        if other.max_depth.is_some() {
            self.max_depth = other.max_depth;
        }
        if other.enforce_family_analogs.is_some() {
            self.enforce_family_analogs = other.enforce_family_analogs;
        }
        if other.log_filter.is_some() {
            self.log_filter = other.log_filter;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn currency(&self) -> String {
        self.default_currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }

    pub fn max_depth(&self) -> usize {
        let depth = self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if depth > MAX_DEPTH_LIMIT {
            tracing::warn!(depth, limit = MAX_DEPTH_LIMIT, "max_depth capped");
        }
        depth.clamp(1, MAX_DEPTH_LIMIT)
    }

    pub fn enforce_family_analogs(&self) -> bool {
        self.enforce_family_analogs.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.currency(), "USD");
        assert_eq!(config.max_depth(), 256);
        assert!(!config.enforce_family_analogs());
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config {
            default_currency: Some("USD".into()),
            max_depth: Some(10),
            ..Default::default()
        };
        base.merge(Config {
            default_currency: Some("EUR".into()),
            ..Default::default()
        });
        assert_eq!(base.currency(), "EUR");
        assert_eq!(base.max_depth(), 10);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BOMCOST_CURRENCY", "RUB"),
            ("BOMCOST_MAX_DEPTH", "32"),
            ("BOMCOST_LOG", "bomcost=trace"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.currency(), "RUB");
        assert_eq!(config.max_depth(), 32);
        assert_eq!(config.log_filter.as_deref(), Some("bomcost=trace"));
    }

    #[test]
    fn test_bad_depth_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "BOMCOST_MAX_DEPTH").then(|| "deep".to_string()));
        assert_eq!(config.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_depth_is_capped() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "BOMCOST_MAX_DEPTH").then(|| "1000000".to_string()));
        assert_eq!(config.max_depth(), MAX_DEPTH_LIMIT);

        config.max_depth = Some(0);
        assert_eq!(config.max_depth(), 1);
    }

    #[test]
    fn test_project_file_is_read() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        std::fs::write(
            project.config_path(),
            "default_currency: EUR\nenforce_family_analogs: true\n",
        )
        .unwrap();

        let config = Config::read_file(&project.config_path()).unwrap();
        assert_eq!(config.currency(), "EUR");
        assert!(config.enforce_family_analogs());
    }

    #[test]
    fn test_generated_config_is_inert() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        // Everything is commented out
        assert!(Config::read_file(&project.config_path()).is_none());
    }
}
