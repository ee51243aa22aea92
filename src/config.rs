//! Where the dashboard finds its input files.

use crate::error::{HofError, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_DATA_DIR: &str = ".";
pub const DEFAULT_METADATA_FILE: &str = "Enhancer_and_experiment_metadata_1751579195077.feather";
pub const DEFAULT_CHUNK_PATTERNS: [&str; 4] = [
    "part1*chunk*.csv",
    "part2*chunk*.csv",
    "part3*chunk*.csv",
    "part4*chunk*.csv",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    /// Measurement chunk globs, matched against file names in `data_dir`.
    /// Order matters: it decides which duplicate counts as "first".
    pub chunk_patterns: Vec<String>,
    pub metadata_file: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            chunk_patterns: DEFAULT_CHUNK_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| HofError::String(format!("Could not read config '{path}': {e}")))?;
        let mut config: Self = serde_json::from_str(&text)
            .map_err(|e| HofError::String(format!("Could not parse config '{path}': {e}")))?;
        // A relative data_dir is relative to the config file, not the cwd.
        if config.data_dir.is_relative() {
            if let Some(base) = Path::new(path).parent() {
                config.data_dir = base.join(&config.data_dir);
            }
        }
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }

    /// Pulls `--config PATH` and `--data-dir DIR` out of command-line
    /// arguments and returns the resulting configuration plus the arguments
    /// that were not consumed. `--data-dir` wins over the config file.
    pub fn from_args(args: &[String]) -> Result<(Self, Vec<String>)> {
        let mut config_path = None;
        let mut data_dir = None;
        let mut rest = vec![];
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "--data-dir" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| HofError::String(format!("Missing value for {arg}")))?;
                    if arg == "--config" {
                        config_path = Some(value.clone());
                    } else {
                        data_dir = Some(PathBuf::from(value));
                    }
                }
                _ => rest.push(arg.clone()),
            }
        }
        let mut config = match config_path {
            Some(path) => Self::from_json_file(&path)?,
            None => Self::default(),
        };
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
        Ok((config, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.chunk_patterns.len(), 4);
        assert_eq!(config.chunk_patterns[0], "part1*chunk*.csv");
        assert_eq!(
            config.metadata_path(),
            Path::new(".").join(DEFAULT_METADATA_FILE)
        );
    }

    #[test]
    fn test_from_json_file_fills_defaults_and_resolves_relative_dir() {
        let td = tempdir().unwrap();
        let path = td.path().join("dashboard.json");
        fs::write(&path, r#"{ "data_dir": "data", "metadata_file": "meta.feather" }"#).unwrap();

        let config = DashboardConfig::from_json_file(&path.to_string_lossy()).unwrap();
        assert_eq!(config.data_dir, td.path().join("data"));
        assert_eq!(config.metadata_file, "meta.feather");
        assert_eq!(config.chunk_patterns.len(), 4);
    }

    #[test]
    fn test_from_args() {
        let td = tempdir().unwrap();
        let path = td.path().join("dashboard.json");
        fs::write(&path, r#"{ "metadata_file": "meta.csv" }"#).unwrap();
        let path = path.to_string_lossy().to_string();
        let args: Vec<String> = [
            "--config",
            path.as_str(),
            "stats",
            "--data-dir",
            "/data/hof",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let (config, rest) = DashboardConfig::from_args(&args).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/hof"));
        assert_eq!(config.metadata_file, "meta.csv");
        assert_eq!(rest, vec!["stats".to_string()]);

        let err = DashboardConfig::from_args(&["--data-dir".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Missing value for --data-dir"));
    }

    #[test]
    fn test_from_json_file_reports_bad_json() {
        let td = tempdir().unwrap();
        let path = td.path().join("dashboard.json");
        fs::write(&path, "{ not json").unwrap();
        let err = DashboardConfig::from_json_file(&path.to_string_lossy()).unwrap_err();
        assert!(err.to_string().contains("Could not parse config"));
    }
}
