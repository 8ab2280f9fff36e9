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

//! Conversion of raw feature collections into renderable layers.

use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection};
use log::{info, warn};
use thiserror::Error;

use crate::control::Overlay;
use crate::features::{Earthquake, FeatureError, GeoPoint, PlateBoundary};
use crate::loader::FeedData;
use crate::style::{LineStyle, MarkerStyle, PLATE_STYLE};

/// Popup timestamp format, always rendered in UTC.
pub const TIME_FORMAT: &str = "%a %b %d %Y %H:%M:%S UTC";

/// What to do with a feature that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Log it, count it and keep going.
    #[default]
    Skip,
    /// Abort the whole build.
    FailFast,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{layer} feature #{index} is malformed: {source}")]
    Malformed {
        layer: Overlay,
        index: usize,
        source: FeatureError,
    },
}

/// Descriptive text shown when a marker is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub place: String,
    pub magnitude: f64,
    pub time: DateTime<Utc>,
}

impl Popup {
    #[must_use]
    pub fn formatted_time(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }

    #[must_use]
    pub fn magnitude_line(&self) -> String {
        format!("Magnitude: {}", self.magnitude)
    }

    /// Place, magnitude and time, one per line.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}\n{}\n{}", self.place, self.magnitude_line(), self.formatted_time())
    }
}

/// One circular earthquake marker.
#[derive(Debug, Clone, PartialEq)]
pub struct QuakeMarker {
    pub position: GeoPoint,
    pub style: MarkerStyle,
    pub popup: Popup,
}

impl From<Earthquake> for QuakeMarker {
    fn from(quake: Earthquake) -> Self {
        Self {
            position: quake.position,
            style: MarkerStyle::for_magnitude(quake.magnitude),
            popup: Popup {
                place: quake.place,
                magnitude: quake.magnitude,
                time: quake.time,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EarthquakeLayer {
    pub markers: Vec<QuakeMarker>,
    /// Features dropped under [`MalformedPolicy::Skip`].
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct PlateLayer {
    pub boundaries: Vec<PlateBoundary>,
    pub style: LineStyle,
    pub skipped: usize,
}

impl Default for PlateLayer {
    fn default() -> Self {
        Self {
            boundaries: Vec::new(),
            style: PLATE_STYLE,
            skipped: 0,
        }
    }
}

/// Both renderable layers.
#[derive(Debug, Clone, Default)]
pub struct Layers {
    pub earthquakes: EarthquakeLayer,
    pub plates: PlateLayer,
}

pub fn build_earthquake_layer(
    collection: &FeatureCollection,
    policy: MalformedPolicy,
) -> Result<EarthquakeLayer, BuildError> {
    let (quakes, skipped) = convert_all(
        &collection.features,
        Overlay::Earthquakes,
        policy,
        Earthquake::from_feature,
    )?;

    Ok(EarthquakeLayer {
        markers: quakes.into_iter().map(QuakeMarker::from).collect(),
        skipped,
    })
}

pub fn build_plate_layer(
    collection: &FeatureCollection,
    policy: MalformedPolicy,
) -> Result<PlateLayer, BuildError> {
    let (boundaries, skipped) = convert_all(
        &collection.features,
        Overlay::Plates,
        policy,
        PlateBoundary::from_feature,
    )?;

    Ok(PlateLayer {
        boundaries,
        style: PLATE_STYLE,
        skipped,
    })
}

/// Build both layers from fetched feeds.
pub fn build_layers(data: &FeedData, policy: MalformedPolicy) -> Result<Layers, BuildError> {
    let earthquakes = build_earthquake_layer(&data.earthquakes, policy)?;
    let plates = build_plate_layer(&data.plates, policy)?;

    info!(
        "Built {} earthquake markers ({} skipped) and {} plate boundaries ({} skipped)",
        earthquakes.markers.len(),
        earthquakes.skipped,
        plates.boundaries.len(),
        plates.skipped
    );

    Ok(Layers {
        earthquakes,
        plates,
    })
}

fn convert_all<T>(
    features: &[Feature],
    layer: Overlay,
    policy: MalformedPolicy,
    convert: impl Fn(&Feature) -> Result<T, FeatureError>,
) -> Result<(Vec<T>, usize), BuildError> {
    let mut items = Vec::with_capacity(features.len());
    let mut skipped = 0;

    for (index, feature) in features.iter().enumerate() {
        match convert(feature) {
            Ok(item) => items.push(item),
            Err(source) => match policy {
                MalformedPolicy::Skip => {
                    warn!("Skipping {} feature #{}: {}", layer, index, source);
                    skipped += 1;
                }
                MalformedPolicy::FailFast => {
                    return Err(BuildError::Malformed {
                        layer,
                        index,
                        source,
                    });
                }
            },
        }
    }

    Ok((items, skipped))
}
