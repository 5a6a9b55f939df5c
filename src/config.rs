//! TOML configuration stored next to the logs in `~/.songbook/`. Every key is
//! optional; a missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;

use crate::booklet::DEFAULT_BASE_URL;
use crate::error::{Error, Result};
use crate::search::RankSettings;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".songbook";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub link: LinkConfig,
    pub ui: UiConfig,
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub base_url: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Terminals narrower than this many columns count as small screens: the
    /// sidebar collapses after a song is added to the booklet.
    pub collapse_width: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            collapse_width: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub allow_typo: bool,
    pub title_weight: f64,
    pub alttitle_weight: f64,
    pub firstline_weight: f64,
    pub id_weight: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let defaults = RankSettings::default();
        Self {
            allow_typo: defaults.allow_typo,
            title_weight: defaults.title_weight,
            alttitle_weight: defaults.alttitle_weight,
            firstline_weight: defaults.firstline_weight,
            id_weight: defaults.id_weight,
        }
    }
}

impl From<&SearchConfig> for RankSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            allow_typo: config.allow_typo,
            title_weight: config.title_weight,
            alttitle_weight: config.alttitle_weight,
            firstline_weight: config.firstline_weight,
            id_weight: config.id_weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Defaults to `~/.songbook/logs`.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    /// Only an explicitly named file is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (data_dir()?.join(CONFIG_FILE_NAME), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn rank_settings(&self) -> RankSettings {
        RankSettings::from(&self.search)
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        match &self.log.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("logs")),
        }
    }
}

/// Resolve `~/.songbook`.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or(Error::HomeDirectory)?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.link.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.ui.collapse_width, 100);
        assert!(config.search.allow_typo);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [link]
            base_url = "https://sangbok.example/"

            [search]
            allow_typo = false
            firstline_weight = 0.5

            [catalog]
            path = "/srv/songs.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.link.base_url, "https://sangbok.example/");
        let settings = config.rank_settings();
        assert!(!settings.allow_typo);
        assert_eq!(settings.firstline_weight, 0.5);
        assert_eq!(settings.title_weight, 1.0);
        assert_eq!(config.catalog.path, Some(PathBuf::from("/srv/songs.json")));
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Config::parse("[ui]\ncollapse_width = \"wide\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/songbook/config.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
