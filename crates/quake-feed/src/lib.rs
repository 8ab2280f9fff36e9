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

//! Earthquake and plate boundary feeds, ready to draw.
//!
//! This library holds everything between the network and the screen that
//! does not depend on a GUI toolkit:
//!
//! - **Loader**: fetches both GeoJSON feeds concurrently, all-or-nothing
//! - **Features**: typed, validated views over raw GeoJSON features
//! - **Style**: magnitude color ladder, marker sizing, legend rows
//! - **Layers**: renderable earthquake markers (with popups) and plate lines
//! - **Control**: base layer selection and overlay stacking
//!
//! # Quick Start
//!
//! ```no_run
//! use quake_feed::{load_layers, FeedUrls, MalformedPolicy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = reqwest::Client::new();
//!     match load_layers(&client, &FeedUrls::default(), MalformedPolicy::Skip).await {
//!         Ok(layers) => println!("{} earthquakes", layers.earthquakes.markers.len()),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```
//!
//! ## Style Only
//!
//! ```
//! use quake_feed::style::{color_for_magnitude, marker_radius};
//!
//! assert_eq!(color_for_magnitude(5.1).to_string(), "#ee6c6e");
//! assert_eq!(marker_radius(2.0), 10.0);
//! ```

pub mod control;
pub mod features;
pub mod layers;
pub mod loader;
pub mod style;

use thiserror::Error;

pub use control::{BaseLayer, LayerControl, LayerEvent, Overlay};
pub use features::{Earthquake, FeatureError, GeoPoint, PlateBoundary};
pub use layers::{
    build_layers, BuildError, EarthquakeLayer, Layers, MalformedPolicy, PlateLayer, Popup,
    QuakeMarker,
};
pub use loader::{load_feeds, FeedData, FeedUrls, FetchError};

/// Anything that keeps the layers from being built.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Fetch both feeds and build the layers.
pub async fn load_layers(
    client: &reqwest::Client,
    urls: &FeedUrls,
    policy: MalformedPolicy,
) -> Result<Layers, LoadError> {
    let data = load_feeds(client, urls).await?;
    Ok(build_layers(&data, policy)?)
}
