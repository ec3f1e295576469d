use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_FORMAT: &str =
    r"{SName( )}\Season {SNum(1)}\{SName(.)}.S{SNum(2)}E{ENum(2)}.{EName(.)}{Ext}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory scanned for new episodes
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Root that move/copy destinations are rendered under
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub recurse: bool,
    #[serde(default = "default_true")]
    pub delete_empty_dirs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_format")]
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Tried top to bottom, first match wins
    #[serde(default = "default_patterns")]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("~/Downloads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("~/TV")
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

pub fn default_patterns() -> Vec<String> {
    [
        r"(?i)s(?<S>[0-9]+)e(?<E>[0-9]+)",
        r"(?<Y>19\d\d|20\d\d)[.](?<M>0[1-9]|1[012])[.](?<D>0[1-9]|[12][0-9]|3[01])",
        r"(?i)(?<M>Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\.(?<D>\d\d)\.(?<Y>20\d\d)",
        r"(?<S>[0-9]+)\s-\s(?<E>[0-9]+)",
        r"(?<S>[0-9]+)x(?<E>[0-9]+)",
        r"(?<S>[0-9][0-9])(?<E>[0-9][0-9])",
        r"(?<S>[0-9])(?<E>[0-9][0-9])",
        r"s(?<S>[0-9]+)[.]e(?<E>[0-9]+)",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_extensions() -> Vec<String> {
    [".avi", ".mkv", ".wmv", ".mpg", ".mp4"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            recurse: false,
            delete_empty_dirs: true,
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            template: default_format(),
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            rules: default_patterns(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "tvsort").ok_or(Error::NoConfigDir)
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .map_err(|_| Error::NoDataDir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn catalog_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("catalog.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load from an explicit path, writing defaults out when the file is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn input_dir(&self) -> PathBuf {
        expand_home(&self.general.input_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_home(&self.general.output_dir)
    }
}

/// Expand ~ to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.starts_with("~/") || path_str.starts_with("~\\") || path_str == "~" {
        if let Some(home) = dirs_home() {
            if path_str == "~" {
                return home;
            }
            return home.join(&path_str[2..]);
        }
    }
    path.to_path_buf()
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[general]\nrecurse = true\n").unwrap();
        assert!(config.general.recurse);
        assert!(config.general.delete_empty_dirs);
        assert_eq!(config.format.template, DEFAULT_FORMAT);
        assert_eq!(config.patterns.rules.len(), 8);
        assert_eq!(config.media.extensions, default_extensions());
    }

    #[test]
    fn test_load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.format.template, DEFAULT_FORMAT);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.patterns.rules, config.patterns.rules);
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home(Path::new("/srv/tv")), PathBuf::from("/srv/tv"));
    }
}
