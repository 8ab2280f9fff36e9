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

//! Command line overrides for the stored configuration.

use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, help = "Earthquake GeoJSON feed URL")]
    pub earthquakes_url: Option<String>,

    #[arg(long, help = "Tectonic plate boundary GeoJSON URL")]
    pub plates_url: Option<String>,

    #[arg(long, help = "Mapbox access token (overrides MAPBOX_ACCESS_TOKEN)")]
    pub access_token: Option<String>,

    #[arg(long, help = "Fail the load on the first malformed feature")]
    pub strict: bool,

    #[arg(long, value_parser = parse_zoom, help = "Initial zoom level (1-18)")]
    pub zoom: Option<f32>,

    #[arg(long, value_parser = parse_center, help = "Initial map center as LAT,LON")]
    pub center: Option<Center>,
}

impl Args {
    /// Fold the flags that were given into `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.earthquakes_url {
            config.earthquakes_url.clone_from(url);
        }
        if let Some(url) = &self.plates_url {
            config.plates_url.clone_from(url);
        }
        if self.strict {
            config.strict_features = true;
        }
        if let Some(zoom) = self.zoom {
            config.default_zoom = zoom;
        }
        if let Some(center) = self.center {
            config.center_latitude = center.lat;
            config.center_longitude = center.lon;
        }
    }

    /// CLI token first, then the environment and config file
    pub fn access_token(&self, config: &AppConfig) -> Option<String> {
        self.access_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| config.access_token())
    }
}

fn parse_center(value: &str) -> Result<Center, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{value}'"))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lon}': {e}"))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} out of range"));
    }

    Ok(Center { lat, lon })
}

fn parse_zoom(value: &str) -> Result<f32, String> {
    let zoom: f32 = value
        .parse()
        .map_err(|e| format!("invalid zoom '{value}': {e}"))?;

    if (1.0..=18.0).contains(&zoom) {
        Ok(zoom)
    } else {
        Err(format!("zoom {zoom} out of range 1-18"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quake_feed::MalformedPolicy;

    #[test]
    fn test_no_flags_keeps_config() {
        let args = Args::try_parse_from(["quakemap"]).unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.feed_urls(), AppConfig::default().feed_urls());
        assert_eq!(config.malformed_policy(), MalformedPolicy::Skip);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "quakemap",
            "--earthquakes-url",
            "http://localhost/quakes.json",
            "--strict",
            "--zoom",
            "3",
            "--center",
            "35.68, 139.69",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.earthquakes_url, "http://localhost/quakes.json");
        assert_eq!(config.malformed_policy(), MalformedPolicy::FailFast);
        assert!((config.default_zoom - 3.0).abs() < f32::EPSILON);
        assert!((config.center_latitude - 35.68).abs() < 1e-9);
        assert!((config.center_longitude - 139.69).abs() < 1e-9);
    }

    #[test]
    fn test_cli_token_wins() {
        let args = Args::try_parse_from(["quakemap", "--access-token", "pk.cli"]).unwrap();
        assert_eq!(
            args.access_token(&AppConfig::default()),
            Some("pk.cli".to_string())
        );
    }

    #[test]
    fn test_bad_center_rejected() {
        assert!(parse_center("35.68").is_err());
        assert!(parse_center("north,139").is_err());
        assert!(parse_center("95,0").is_err());
        assert_eq!(
            parse_center("-33.9,18.4"),
            Ok(Center { lat: -33.9, lon: 18.4 })
        );
    }

    #[test]
    fn test_bad_zoom_rejected() {
        assert!(Args::try_parse_from(["quakemap", "--zoom", "0"]).is_err());
        assert!(Args::try_parse_from(["quakemap", "--zoom", "far"]).is_err());
    }
}
