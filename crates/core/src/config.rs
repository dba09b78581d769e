use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use tracing::debug;

pub const DB_FILE_NAME: &str = "tm.sqlite3";
pub const ENV_DATA_DIR: &str = "TM_DATA_DIR";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "tm-cli", "tm"));

/// Where the data directory came from, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirSource {
    /// `--data-dir` or a caller-supplied path.
    Explicit,
    /// The `TM_DATA_DIR` environment variable.
    Environment,
    Platform,
    Home,
    WorkingDir,
}

impl fmt::Display for DataDirSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataDirSource::Explicit => "--data-dir",
            DataDirSource::Environment => ENV_DATA_DIR,
            DataDirSource::Platform => "platform data dir",
            DataDirSource::Home => "~/.tm",
            DataDirSource::WorkingDir => "./.tm",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    source: DataDirSource,
}

impl AppConfig {
    /// Resolve the data directory and make sure it exists.
    ///
    /// Debug and release builds resolve the same way. Point `TM_DATA_DIR` at a
    /// scratch directory to keep development data apart.
    pub fn discover(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let (data_dir, source) = resolve_data_dir(data_dir_override, env::var_os(ENV_DATA_DIR))?;
        ensure_dir(&data_dir)?;
        debug!(data_dir = %data_dir.display(), %source, "data directory resolved");
        Ok(Self::with_source(data_dir, source))
    }

    /// Use `data_dir` as given, without creating it.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        Ok(Self::with_source(data_dir, DataDirSource::Explicit))
    }

    fn with_source(data_dir: PathBuf, source: DataDirSource) -> Self {
        let db_path = data_dir.join(DB_FILE_NAME);
        Self {
            data_dir,
            db_path,
            source,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn source(&self) -> DataDirSource {
        self.source
    }
}

fn resolve_data_dir(
    data_dir_override: Option<PathBuf>,
    env_value: Option<OsString>,
) -> Result<(PathBuf, DataDirSource)> {
    if let Some(dir) = data_dir_override {
        return Ok((absolute(dir)?, DataDirSource::Explicit));
    }

    if let Some(value) = env_value.filter(|value| !value.to_string_lossy().trim().is_empty()) {
        return Ok((absolute(PathBuf::from(value))?, DataDirSource::Environment));
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok((project.data_dir().to_path_buf(), DataDirSource::Platform));
    }

    if let Some(base) = BaseDirs::new() {
        return Ok((base.home_dir().join(".tm"), DataDirSource::Home));
    }

    Ok((env::current_dir()?.join(".tm"), DataDirSource::WorkingDir))
}

fn absolute(dir: PathBuf) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = env::current_dir().context("Failed to read the working directory")?;
    Ok(cwd.join(dir))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        bail!("Data path {} exists but is not a directory", dir.display());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory at {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn discover_creates_override_directory() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested").join("data");
        let config = AppConfig::discover(Some(target.clone())).unwrap();

        assert!(target.is_dir());
        assert_eq!(config.data_dir(), target.as_path());
        assert_eq!(config.db_path(), target.join("tm.sqlite3").as_path());
        assert_eq!(config.source(), DataDirSource::Explicit);
    }

    #[test]
    fn flag_wins_over_environment() {
        let (dir, source) = resolve_data_dir(
            Some(PathBuf::from("/srv/flag")),
            Some(OsString::from("/srv/env")),
        )
        .unwrap();

        assert_eq!(dir, PathBuf::from("/srv/flag"));
        assert_eq!(source, DataDirSource::Explicit);
    }

    #[test]
    fn environment_is_used_when_no_flag_given() {
        let (dir, source) = resolve_data_dir(None, Some(OsString::from("/srv/env"))).unwrap();

        assert_eq!(dir, PathBuf::from("/srv/env"));
        assert_eq!(source, DataDirSource::Environment);
    }

    #[test]
    fn blank_environment_falls_through_to_defaults() {
        let (_, source) = resolve_data_dir(None, Some(OsString::from("  "))).unwrap();

        assert!(matches!(
            source,
            DataDirSource::Platform | DataDirSource::Home | DataDirSource::WorkingDir
        ));
    }

    #[test]
    fn relative_paths_are_anchored_to_working_dir() {
        let (dir, _) = resolve_data_dir(Some(PathBuf::from("tm-data")), None).unwrap();

        assert!(dir.is_absolute());
        assert!(dir.ends_with("tm-data"));
    }

    #[test]
    fn discover_refuses_a_file_as_data_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        let err = AppConfig::discover(Some(file)).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}
