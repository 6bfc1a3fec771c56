// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppConfig {
    /// Root under which each run gets its own folder.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// TrueType font for figure text; system fonts are tried when unset.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Logo drawn on the report cover.
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
    /// CSV of places (`name,admin1,cc,lat,lon`) for offline place naming.
    #[serde(default)]
    pub places_path: Option<PathBuf>,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            font_path: None,
            logo_path: None,
            places_path: None,
            geocoder: GeocoderConfig::default(),
            acquisition: AcquisitionConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Config from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocoder_endpoint(),
            user_agent: default_user_agent(),
            language: default_language(),
            timeout_secs: default_geocoder_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AcquisitionConfig {
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Month stepping stops before this year; EMIT has no earlier granules.
    #[serde(default = "default_earliest_year")]
    pub earliest_year: i32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            search_endpoint: default_search_endpoint(),
            page_size: default_page_size(),
            earliest_year: default_earliest_year(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RenderConfig {
    /// Length in pixels of the longer side of the plot area.
    #[serde(default = "default_figure_size")]
    pub figure_size: u32,
    #[serde(default = "default_true")]
    pub colorbar: bool,
    /// CLAHE clip limit for the true colour composite.
    #[serde(default = "default_clip_limit")]
    pub clip_limit: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            figure_size: default_figure_size(),
            colorbar: true,
            clip_limit: default_clip_limit(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_geocoder_endpoint() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_user_agent() -> String {
    concat!("emit-report/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_geocoder_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    5
}

fn default_search_endpoint() -> String {
    "https://cmr.earthdata.nasa.gov/search/granules.json".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_earliest_year() -> i32 {
    2022
}

fn default_figure_size() -> u32 {
    2800
}

fn default_clip_limit() -> f32 {
    crate::processing::indices::rgb::DEFAULT_CLIP_LIMIT
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.geocoder.max_attempts, 2);
        assert_eq!(config.acquisition.earliest_year, 2022);
        assert!(config.render.colorbar);
        assert_eq!(config.render.figure_size, 2800);
    }

    #[test]
    fn nested_overrides_keep_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"render": {"figure_size": 300}, "geocoder": {"retry_delay_secs": 0}}"#).unwrap();
        assert_eq!(config.render.figure_size, 300);
        assert!((config.render.clip_limit - 0.02).abs() < f32::EPSILON);
        assert_eq!(config.geocoder.retry_delay(), Duration::ZERO);
        assert_eq!(config.geocoder.max_attempts, 2);
    }
}
