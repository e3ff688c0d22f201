use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::Listing;
use crate::error::{Error, Result};
use crate::format::ImageSize;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Seconds a successful response may be reused. 0 disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default)]
    pub default_listing: Listing,
    #[serde(default = "default_poster_size")]
    pub poster_size: ImageSize,
    /// Rows from the bottom of the list at which the next page is requested
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: usize,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_cache_ttl_secs() -> u64 {
    3600 // one hour
}

fn default_accent_color() -> String {
    "yellow".to_string()
}

fn default_poster_size() -> ImageSize {
    ImageSize::W500
}

fn default_scroll_threshold() -> usize {
    3
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
            default_listing: Listing::default(),
            poster_size: default_poster_size(),
            scroll_threshold: default_scroll_threshold(),
        }
    }
}

/// Settings taken from the process environment. These win over the file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub image_base_url: Option<String>,
}

impl EnvOverrides {
    pub fn gather() -> Self {
        Self {
            api_key: non_blank_var("TMDB_API_KEY"),
            base_url: non_blank_var("TMDB_BASE_URL"),
            image_base_url: non_blank_var("TMDB_IMAGE_BASE_URL"),
        }
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "marquee").ok_or(Error::NoConfigDir)
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

impl Config {
    /// Load the user's config file (creating it on first run) and apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        config.apply_env(EnvOverrides::gather());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env(&mut self, env: EnvOverrides) {
        if let Some(key) = env.api_key {
            self.catalog.api_key = Some(key);
        }
        if let Some(url) = env.base_url {
            self.catalog.base_url = url;
        }
        if let Some(url) = env.image_base_url {
            self.catalog.image_base_url = url;
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.catalog
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}
