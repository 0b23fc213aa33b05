//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".bomcost";

/// Represents a bomcost project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .bomcost/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_skeleton(root)
    }

    /// Re-create the project skeleton even if .bomcost/ exists
    ///
    /// The catalog database is left alone; only the config is rewritten.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        Self::write_skeleton(root)
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };
        std::fs::create_dir_all(project.bomcost_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# bomcost project configuration

# Currency assigned to new nomenclature
# default_currency: USD

# Deepest BOM nesting the cost rollup will follow before giving up
# max_depth: 256

# Reject BOM analogs whose family differs from the line's family
# enforce_family_analogs: false

# Log filter (tracing EnvFilter syntax), e.g. "bomcost=debug"
# log_filter: warn

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .bomcost directory
    pub fn bomcost_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Path of the project config file
    pub fn config_path(&self) -> PathBuf {
        self.bomcost_dir().join("config.yaml")
    }

    /// Path of the catalog database
    pub fn db_path(&self) -> PathBuf {
        self.bomcost_dir().join("catalog.db")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a bomcost project (searched from {searched_from:?}). Run 'bomcost init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("bomcost project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.bomcost_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.db_path().ends_with(".bomcost/catalog.db"));
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_init_force_keeps_database() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        std::fs::write(project.db_path(), b"keep").unwrap();

        let project = Project::init_force(tmp.path()).unwrap();
        assert_eq!(std::fs::read(project.db_path()).unwrap(), b"keep");
    }

    #[test]
    fn test_project_discover_finds_marker_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_marker_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
