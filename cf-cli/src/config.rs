//! Configuration file loading and resolution

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "cf-helper";
const CONFIG_FILE: &str = "config.toml";

/// How solutions in one language are laid out and submitted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfig {
    /// Display name
    pub name: String,
    /// Judge `programTypeId`
    pub id: u32,
    /// Template file name inside `templates_dir`
    pub template: String,
    /// Source file stem inside a problem directory
    #[serde(default = "default_main")]
    pub main: String,
    /// Source file extension
    pub ext: String,
}

impl LanguageConfig {
    /// File name of the solution source, e.g. `main.cpp`
    pub fn source_file(&self) -> String {
        format!("{}.{}", self.main, self.ext)
    }
}

/// Verdict monitor settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between polls, in humantime notation (`"10s"`)
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,
    /// Submissions fetched per poll
    pub count: usize,
    /// Watch verdicts right after a submission
    pub auto_start: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            count: 10,
            auto_start: true,
        }
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Judge host
    pub host: String,
    /// Root of the problem workspace
    pub src_dir: PathBuf,
    /// Directory holding language templates
    pub templates_dir: PathBuf,
    /// Key of the default entry in `languages`
    pub language: String,
    pub languages: BTreeMap<String, LanguageConfig>,
    pub monitor: MonitorConfig,
    /// Where the session is persisted; defaults to the user cache dir
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: cf_client::DEFAULT_BASE_URL.to_string(),
            src_dir: PathBuf::from("src"),
            templates_dir: PathBuf::from("templates"),
            language: "cpp17".to_string(),
            languages: default_languages(),
            monitor: MonitorConfig::default(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when the default file
    /// does not exist
    ///
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(&expand_tilde(path))?,
            None => {
                let path = default_config_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text)?;
        config.src_dir = expand_tilde(&config.src_dir);
        config.templates_dir = expand_tilde(&config.templates_dir);
        config.cache_dir = config.cache_dir.as_deref().map(expand_tilde);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.language(None)?;
        if self.monitor.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Look up a language by key, defaulting to the configured one
    pub fn language(&self, key: Option<&str>) -> Result<&LanguageConfig, ConfigError> {
        let key = key.unwrap_or(&self.language);
        self.languages
            .get(key)
            .ok_or_else(|| ConfigError::UnknownLanguage(key.to_string()))
    }

    /// Directory of the persisted session
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoDirectory("cache")),
        }
    }
}

/// `$XDG_CONFIG_HOME/cf-helper/config.toml` or the platform equivalent
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoDirectory("config"))
}

fn default_main() -> String {
    "main".to_string()
}

fn default_languages() -> BTreeMap<String, LanguageConfig> {
    [
        ("cpp17", "GNU G++17 7.3.0", 54, "cpp"),
        ("cpp20", "GNU G++20 13.2 (64 bit, winlibs)", 89, "cpp"),
        ("py3", "Python 3.8", 31, "py"),
        ("pypy3", "PyPy 3.10 (7.3.15, 64bit)", 70, "py"),
        ("java", "Java 21 64bit", 87, "java"),
        ("rust", "Rust 1.75.0 (2021)", 75, "rs"),
    ]
    .into_iter()
    .map(|(key, name, id, ext)| {
        let language = LanguageConfig {
            name: name.to_string(),
            id,
            template: format!("{}.{}", key, ext),
            main: if ext == "java" { "Main" } else { "main" }.to_string(),
            ext: ext.to_string(),
        };
        (key.to_string(), language)
    })
    .collect()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str()
        && (path_str.starts_with("~/") || path_str == "~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path_str.get(2..).unwrap_or_default());
    }
    path.to_path_buf()
}
