// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Configuration is stored in TOML format via confy. It holds the feed
//! locations, tile imagery settings, the initial map view and the feature
//! validation policy. The Mapbox access token may also come from the
//! environment, which takes precedence over the file.

use quake_feed::loader::{DEFAULT_EARTHQUAKES_URL, DEFAULT_PLATES_URL};
use quake_feed::{FeedUrls, MalformedPolicy};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "quakemap";

/// Environment variable holding the Mapbox access token
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Mapbox v4 raster tile endpoint
pub const DEFAULT_TILE_URL_TEMPLATE: &str =
    "https://api.tiles.mapbox.com/v4/{id}/{z}/{x}/{y}.png?access_token={access_token}";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Earthquake GeoJSON feed
    #[serde(default = "default_earthquakes_url")]
    pub earthquakes_url: String,

    /// Tectonic plate boundary GeoJSON document
    #[serde(default = "default_plates_url")]
    pub plates_url: String,

    /// Tile URL with `{id}`, `{z}`, `{x}`, `{y}` and `{access_token}` placeholders
    #[serde(default = "default_tile_url_template")]
    pub tile_url_template: String,

    /// Mapbox access token (optional, env var takes precedence)
    #[serde(default)]
    pub mapbox_access_token: Option<String>,

    /// Initial map center latitude
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,

    /// Initial map center longitude
    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,

    /// Initial map zoom level (1.0 - 18.0)
    #[serde(default = "default_zoom")]
    pub default_zoom: f32,

    /// Abort loading on the first malformed feature instead of skipping it
    #[serde(default)]
    pub strict_features: bool,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_earthquakes_url() -> String {
    DEFAULT_EARTHQUAKES_URL.to_string()
}

fn default_plates_url() -> String {
    DEFAULT_PLATES_URL.to_string()
}

fn default_tile_url_template() -> String {
    DEFAULT_TILE_URL_TEMPLATE.to_string()
}

fn default_center_latitude() -> f64 {
    37.09
}

fn default_center_longitude() -> f64 {
    -119.42
}

fn default_zoom() -> f32 {
    5.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            earthquakes_url: default_earthquakes_url(),
            plates_url: default_plates_url(),
            tile_url_template: default_tile_url_template(),
            mapbox_access_token: None,
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            default_zoom: default_zoom(),
            strict_features: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    pub fn feed_urls(&self) -> FeedUrls {
        FeedUrls {
            earthquakes: self.earthquakes_url.clone(),
            plates: self.plates_url.clone(),
        }
    }

    pub fn malformed_policy(&self) -> MalformedPolicy {
        if self.strict_features {
            MalformedPolicy::FailFast
        } else {
            MalformedPolicy::Skip
        }
    }

    /// Resolve the access token from the environment or this config
    pub fn access_token(&self) -> Option<String> {
        resolve_access_token(
            std::env::var(ACCESS_TOKEN_ENV).ok(),
            self.mapbox_access_token.as_deref(),
        )
    }
}

/// Environment value wins over config; empty strings count as unset.
fn resolve_access_token(env_value: Option<String>, config_value: Option<&str>) -> Option<String> {
    env_value
        .filter(|k| !k.is_empty())
        .or_else(|| config_value.map(str::to_string).filter(|k| !k.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!((config.center_latitude - 37.09).abs() < 1e-9);
        assert!((config.center_longitude + 119.42).abs() < 1e-9);
        assert!((config.default_zoom - 5.0).abs() < f32::EPSILON);
        assert_eq!(config.feed_urls(), FeedUrls::default());
        assert_eq!(config.malformed_policy(), MalformedPolicy::Skip);
    }

    #[test]
    fn test_strict_features() {
        let config = AppConfig {
            strict_features: true,
            ..Default::default()
        };
        assert_eq!(config.malformed_policy(), MalformedPolicy::FailFast);
    }

    #[test]
    fn test_access_token_precedence() {
        assert_eq!(
            resolve_access_token(Some("env".to_string()), Some("file")),
            Some("env".to_string())
        );
        assert_eq!(
            resolve_access_token(Some(String::new()), Some("file")),
            Some("file".to_string())
        );
        assert_eq!(resolve_access_token(None, Some("")), None);
        assert_eq!(resolve_access_token(None, None), None);
    }
}
