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

//! Typed views over raw GeoJSON features.
//!
//! The earthquake feed schema (`properties.place`, `properties.mag`,
//! `properties.time`, Point geometry) and the plate boundary geometry are
//! external contracts. Conversion validates them and reports what is wrong
//! instead of rendering `undefined`.

use chrono::{DateTime, Utc};
use geojson::{Feature, Value};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors that can occur while reading a single feature.
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("feature has no geometry")]
    MissingGeometry,

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(&'static str),

    #[error("missing required property: {0}")]
    MissingProperty(&'static str),

    #[error("invalid value for property '{field}': {value}")]
    InvalidProperty { field: &'static str, value: String },
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a GeoJSON position (`[lon, lat, ...]`).
    fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lat, *lon)),
            _ => None,
        }
    }
}

/// One earthquake from the USGS summary feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Earthquake {
    pub place: String,
    pub magnitude: f64,
    pub time: DateTime<Utc>,
    pub position: GeoPoint,
}

impl Earthquake {
    /// Read and validate an earthquake feature.
    pub fn from_feature(feature: &Feature) -> Result<Self, FeatureError> {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(FeatureError::MissingGeometry)?;

        let position = match &geometry.value {
            Value::Point(coords) => {
                GeoPoint::from_position(coords).ok_or_else(|| FeatureError::InvalidProperty {
                    field: "coordinates",
                    value: format!("{coords:?}"),
                })?
            }
            other => return Err(FeatureError::UnsupportedGeometry(other.type_name())),
        };

        let place = match required(feature, "place")? {
            JsonValue::String(place) => place.clone(),
            other => return Err(invalid("place", other)),
        };

        let mag_value = required(feature, "mag")?;
        let magnitude = mag_value
            .as_f64()
            .ok_or_else(|| invalid("mag", mag_value))?;

        let time_value = required(feature, "time")?;
        let time = time_value
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| invalid("time", time_value))?;

        Ok(Self {
            place,
            magnitude,
            time,
            position,
        })
    }
}

/// One plate boundary, flattened to polylines.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateBoundary {
    pub lines: Vec<Vec<GeoPoint>>,
}

impl PlateBoundary {
    /// Read the line geometry of a plate boundary feature.
    ///
    /// Polygon rings are treated as closed lines. Properties are ignored.
    pub fn from_feature(feature: &Feature) -> Result<Self, FeatureError> {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(FeatureError::MissingGeometry)?;

        let lines: Vec<Vec<GeoPoint>> = match &geometry.value {
            Value::LineString(line) => vec![to_line(line)],
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                lines.iter().map(|l| to_line(l)).collect()
            }
            Value::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter().map(|l| to_line(l)))
                .collect(),
            other => return Err(FeatureError::UnsupportedGeometry(other.type_name())),
        };

        let lines: Vec<Vec<GeoPoint>> = lines.into_iter().filter(|l| l.len() >= 2).collect();
        if lines.is_empty() {
            return Err(FeatureError::MissingGeometry);
        }

        Ok(Self { lines })
    }
}

fn to_line(positions: &[Vec<f64>]) -> Vec<GeoPoint> {
    positions
        .iter()
        .filter_map(|p| GeoPoint::from_position(p))
        .collect()
}

fn required<'a>(feature: &'a Feature, field: &'static str) -> Result<&'a JsonValue, FeatureError> {
    match feature.property(field) {
        None | Some(JsonValue::Null) => Err(FeatureError::MissingProperty(field)),
        Some(value) => Ok(value),
    }
}

fn invalid(field: &'static str, value: &JsonValue) -> FeatureError {
    FeatureError::InvalidProperty {
        field,
        value: value.to_string(),
    }
}
