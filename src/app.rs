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

use log::{error, info, warn};
use quake_feed::{FeedUrls, LayerControl, Layers, MalformedPolicy};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::config::AppConfig;
use crate::map_view::{Banner, MapView};
use crate::tiles::{TileManager, TileSource};
use crate::{layer_panel, legend};

type LoadResult = Result<Layers, String>;

#[derive(Debug)]
pub struct QuakeMapApp {
    control: LayerControl,
    view: MapView,
    /// None when no access token is configured
    tiles: Option<TileManager>,
    layers: Option<Layers>,
    load_error: Option<String>,
    /// Pending feed load; taken once a result arrives
    load_rx: Option<oneshot::Receiver<LoadResult>>,
}

impl QuakeMapApp {
    pub fn new(config: &AppConfig, access_token: Option<String>, ctx: &egui::Context) -> Self {
        let tiles = match access_token {
            Some(token) => Some(TileManager::new(TileSource::new(
                config.tile_url_template.clone(),
                token,
            ))),
            None => {
                warn!("No Mapbox access token configured, base imagery disabled");
                None
            }
        };

        let load_rx = spawn_loader(config.feed_urls(), config.malformed_policy(), ctx.clone());

        Self {
            control: LayerControl::default(),
            view: MapView::new(
                config.center_latitude,
                config.center_longitude,
                config.default_zoom,
            ),
            tiles,
            layers: None,
            load_error: None,
            load_rx: Some(load_rx),
        }
    }

    fn poll_loader(&mut self) {
        let Some(rx) = self.load_rx.as_mut() else {
            return;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => Err("Feed loader stopped unexpectedly".to_string()),
        };
        self.load_rx = None;

        match result {
            Ok(layers) => {
                info!(
                    "Loaded {} earthquakes ({} skipped) and {} plate boundaries ({} skipped)",
                    layers.earthquakes.markers.len(),
                    layers.earthquakes.skipped,
                    layers.plates.boundaries.len(),
                    layers.plates.skipped,
                );
                self.layers = Some(layers);
            }
            Err(e) => {
                error!("Failed to load map data: {}", e);
                self.load_error = Some(e);
            }
        }
    }

    fn banner(&self) -> Option<Banner> {
        if let Some(e) = &self.load_error {
            Some(Banner::Error(format!("Failed to load map data: {e}")))
        } else if self.load_rx.is_some() {
            Some(Banner::Info("Loading earthquake data...".to_string()))
        } else if self.tiles.is_none() {
            Some(Banner::Info(
                "Set MAPBOX_ACCESS_TOKEN to show base imagery".to_string(),
            ))
        } else {
            None
        }
    }
}

/// Fetch and build both layers on a background runtime.
///
/// Layers appear only after both feeds have loaded; any failure is
/// reported as a single message.
fn spawn_loader(
    urls: FeedUrls,
    policy: MalformedPolicy,
    ctx: egui::Context,
) -> oneshot::Receiver<LoadResult> {
    let (tx, rx) = oneshot::channel();

    info!("Loading feeds: {} and {}", urls.earthquakes, urls.plates);
    std::thread::spawn(move || {
        let result = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(async {
                let client = reqwest::Client::new();
                quake_feed::load_layers(&client, &urls, policy)
                    .await
                    .map_err(|e| e.to_string())
            }),
            Err(e) => Err(format!("Failed to start async runtime: {e}")),
        };

        if tx.send(result).is_err() {
            warn!("Window closed before feeds finished loading");
        }
        ctx.request_repaint();
    });

    rx
}

impl eframe::App for QuakeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        let banner = self.banner();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.view.show(
                    ui,
                    self.tiles.as_ref(),
                    &self.control,
                    self.layers.as_ref(),
                    banner.as_ref(),
                );
            });

        layer_panel::show(ctx, &mut self.control);
        legend::show(ctx);
    }
}
