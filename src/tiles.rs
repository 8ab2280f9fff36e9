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

//! Base map imagery: Web Mercator math, tile URLs and a disk-backed tile cache.

use egui::{ColorImage, TextureHandle};
use log::{debug, info, warn};
use quake_feed::BaseLayer;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: u8 = 18;
const CACHE_DURATION_DAYS: u64 = 7;

/// Zoom levels kept in memory on each side of the current view
const KEEP_ZOOM_LEVELS: u8 = 2;

pub const ATTRIBUTION: &str =
    "Map data © OpenStreetMap contributors, CC-BY-SA, Imagery © Mapbox";

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to Web Mercator Y in tile units at `zoom`
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.to_radians();
        let n = 2_f64.powi(i32::from(zoom));
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert longitude to Web Mercator X in tile units at `zoom`
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert tile coordinates back to latitude
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// Convert tile coordinates back to longitude
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        x / n * 360.0 - 180.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

/// A tile of one particular base layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TileKey {
    base: BaseLayer,
    coord: TileCoord,
}

impl TileKey {
    /// Cache filename, independent of the access token
    fn cache_filename(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}/{}/{}/{}",
                self.base.style_id(),
                self.coord.zoom,
                self.coord.x,
                self.coord.y
            )
            .as_bytes(),
        );
        format!("{:x}.png", hasher.finalize())
    }
}

/// Builds raster tile URLs from a template
#[derive(Clone, Debug)]
pub struct TileSource {
    template: String,
    access_token: String,
}

impl TileSource {
    pub fn new(template: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            access_token: access_token.into(),
        }
    }

    pub fn url(&self, base: BaseLayer, coord: TileCoord) -> String {
        self.template
            .replace("{id}", base.style_id())
            .replace("{z}", &coord.zoom.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{access_token}", &self.access_token)
    }
}

enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

type TileMap = Arc<Mutex<HashMap<TileKey, TileState>>>;

pub struct TileManager {
    source: TileSource,
    cache_dir: PathBuf,
    tiles: TileMap,
    download_queue: Arc<Mutex<HashSet<TileKey>>>,
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl TileManager {
    pub fn new(source: TileSource) -> Self {
        let cache_dir = Self::get_cache_dir();

        // Create cache directory if it doesn't exist
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!("Failed to create tile cache directory {:?}: {}", cache_dir, e);
        }

        info!("Tile cache: {:?}", cache_dir);
        Self::cleanup_old_tiles(&cache_dir);

        Self {
            source,
            cache_dir,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            download_queue: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn get_cache_dir() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("quakemap");
        path.push("tiles");
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        let Ok(entries) = fs::read_dir(cache_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);

            if expired {
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!("Failed to remove old tile {:?}: {}", entry.path(), e);
                } else {
                    debug!("Removed old tile cache: {:?}", entry.path());
                }
            }
        }
    }

    /// Get tile from memory or disk cache, or queue it for download
    pub fn get_tile(
        &self,
        base: BaseLayer,
        coord: TileCoord,
        ctx: &egui::Context,
    ) -> Option<TextureHandle> {
        let key = TileKey { base, coord };
        {
            let mut tiles = self.tiles.lock().expect("Tile map mutex poisoned");

            match tiles.get(&key) {
                Some(TileState::Loaded(texture)) => return Some(texture.clone()),
                Some(TileState::Loading | TileState::Failed) => return None,
                None => {}
            }

            // Check the disk cache before downloading
            let cache_path = self.cache_dir.join(key.cache_filename());
            if cache_path.exists() {
                match load_tile_from_disk(&cache_path, ctx, key) {
                    Ok(texture) => {
                        tiles.insert(key, TileState::Loaded(texture.clone()));
                        return Some(texture);
                    }
                    Err(e) => warn!("Failed to load cached tile {:?}: {}", cache_path, e),
                }
            }

            tiles.insert(key, TileState::Loading);
        }

        self.queue_download(key, ctx.clone());
        None
    }

    fn queue_download(&self, key: TileKey, ctx: egui::Context) {
        let mut queue = self.download_queue.lock().expect("Download queue mutex poisoned");
        if !queue.insert(key) {
            return;
        }

        let url = self.source.url(key.base, key.coord);
        let tiles = Arc::clone(&self.tiles);
        let queue_handle = Arc::clone(&self.download_queue);
        let cache_path = self.cache_dir.join(key.cache_filename());

        std::thread::spawn(move || {
            let state = match download_tile(&url, &cache_path, &ctx, key) {
                Ok(texture) => {
                    ctx.request_repaint();
                    TileState::Loaded(texture)
                }
                Err(e) => {
                    warn!(
                        "Tile {}/{}/{} ({}) failed: {}",
                        key.coord.zoom,
                        key.coord.x,
                        key.coord.y,
                        key.base.style_id(),
                        e
                    );
                    TileState::Failed
                }
            };

            tiles.lock().expect("Tile map mutex poisoned").insert(key, state);
            queue_handle.lock().expect("Download queue mutex poisoned").remove(&key);
        });
    }

    /// Get all tiles needed for a viewport with their pixel offset from the center
    pub fn visible_tiles(
        center_lat: f64,
        center_lon: f64,
        zoom: u8,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<(TileCoord, f32, f32)> {
        let mut tiles = Vec::new();

        let center_tile_x = WebMercator::lon_to_x(center_lon, zoom);
        let center_tile_y = WebMercator::lat_to_y(center_lat, zoom);

        // How many tiles we need in each direction
        let tiles_wide = (f64::from(viewport_width) / TILE_SIZE).ceil() as i64 + 2;
        let tiles_high = (f64::from(viewport_height) / TILE_SIZE).ceil() as i64 + 2;

        let start_x = center_tile_x.floor() as i64 - tiles_wide / 2;
        let start_y = center_tile_y.floor() as i64 - tiles_high / 2;

        let max_tile = 1_i64 << zoom;

        for dy in 0..tiles_high {
            for dx in 0..tiles_wide {
                let tile_x = start_x + dx;
                let tile_y = start_y + dy;

                // Latitude doesn't wrap
                if tile_y < 0 || tile_y >= max_tile {
                    continue;
                }

                // Longitude wraps around
                let wrapped_x = tile_x.rem_euclid(max_tile);
                let coord = TileCoord::new(wrapped_x as u32, tile_y as u32, zoom);

                let offset_x = (tile_x as f64 - center_tile_x) * TILE_SIZE;
                let offset_y = (tile_y as f64 - center_tile_y) * TILE_SIZE;

                tiles.push((coord, offset_x as f32, offset_y as f32));
            }
        }

        tiles
    }

    /// Drop finished tiles more than a couple of zoom levels away from `zoom`.
    ///
    /// In-flight downloads are left alone; their threads still report back.
    pub fn evict_distant(&self, zoom: u8) {
        let mut tiles = self.tiles.lock().expect("Tile map mutex poisoned");
        let before = tiles.len();

        tiles.retain(|key, state| {
            matches!(state, TileState::Loading) || key.coord.zoom.abs_diff(zoom) <= KEEP_ZOOM_LEVELS
        });

        let evicted = before - tiles.len();
        if evicted > 0 {
            debug!("Evicted {} tiles away from zoom {}", evicted, zoom);
        }
    }

    pub fn has_loading_tiles(&self, base: BaseLayer) -> bool {
        let tiles = self.tiles.lock().expect("Tile map mutex poisoned");
        tiles
            .iter()
            .any(|(key, state)| key.base == base && matches!(state, TileState::Loading))
    }

    pub fn error_count(&self, base: BaseLayer) -> usize {
        let tiles = self.tiles.lock().expect("Tile map mutex poisoned");
        tiles
            .iter()
            .filter(|(key, state)| key.base == base && matches!(state, TileState::Failed))
            .count()
    }
}

fn decode_tile(bytes: &[u8]) -> Result<ColorImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw()))
}

fn texture_name(key: TileKey) -> String {
    format!(
        "tile_{}_{}_{}_{}",
        key.base.style_id(),
        key.coord.zoom,
        key.coord.x,
        key.coord.y
    )
}

fn load_tile_from_disk(
    path: &Path,
    ctx: &egui::Context,
    key: TileKey,
) -> Result<TextureHandle, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let image = decode_tile(&bytes)?;
    Ok(ctx.load_texture(texture_name(key), image, Default::default()))
}

fn download_tile(
    url: &str,
    cache_path: &Path,
    ctx: &egui::Context,
    key: TileKey,
) -> Result<TextureHandle, String> {
    debug!("Downloading tile {}/{}/{}", key.coord.zoom, key.coord.x, key.coord.y);

    let response = reqwest::blocking::get(url).map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    let bytes = response.bytes().map_err(|e| e.to_string())?;
    let image = decode_tile(&bytes)?;

    if let Err(e) = fs::write(cache_path, &bytes) {
        warn!("Failed to save tile to cache: {}", e);
    }

    Ok(ctx.load_texture(texture_name(key), image, Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_mercator_round_trip() {
        let x = WebMercator::lon_to_x(-119.42, 5);
        let y = WebMercator::lat_to_y(37.09, 5);
        assert!((WebMercator::tile_to_lon(x, 5) + 119.42).abs() < 1e-9);
        assert!((WebMercator::tile_to_lat(y, 5) - 37.09).abs() < 1e-9);
    }

    #[test]
    fn test_tile_url_per_base_layer() {
        let source = TileSource::new(crate::config::DEFAULT_TILE_URL_TEMPLATE, "secret");
        let coord = TileCoord::new(5, 12, 5);

        assert_eq!(
            source.url(BaseLayer::Satellite, coord),
            "https://api.tiles.mapbox.com/v4/mapbox.streets-satellite/5/5/12.png?access_token=secret"
        );
        assert_eq!(
            source.url(BaseLayer::Grayscale, coord),
            "https://api.tiles.mapbox.com/v4/mapbox.light/5/5/12.png?access_token=secret"
        );
        assert_eq!(
            source.url(BaseLayer::Outdoors, coord),
            "https://api.tiles.mapbox.com/v4/mapbox.outdoors/5/5/12.png?access_token=secret"
        );
    }

    #[test]
    fn test_cache_filename_differs_by_base_layer() {
        let coord = TileCoord::new(1, 2, 3);
        let satellite = TileKey { base: BaseLayer::Satellite, coord };
        let outdoors = TileKey { base: BaseLayer::Outdoors, coord };
        assert_ne!(satellite.cache_filename(), outdoors.cache_filename());
        assert!(satellite.cache_filename().ends_with(".png"));
    }

    fn in_memory_manager() -> TileManager {
        TileManager {
            source: TileSource::new(crate::config::DEFAULT_TILE_URL_TEMPLATE, "secret"),
            cache_dir: std::env::temp_dir().join("quakemap-tile-tests"),
            tiles: Arc::new(Mutex::new(HashMap::new())),
            download_queue: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    #[test]
    fn test_evict_distant_zoom_levels() {
        let ctx = egui::Context::default();
        let texture = ctx.load_texture(
            "tile_test",
            ColorImage::from_rgba_unmultiplied([1, 1], &[255, 255, 255, 255]),
            Default::default(),
        );

        let key = |x, zoom| TileKey { base: BaseLayer::Satellite, coord: TileCoord::new(x, 0, zoom) };
        let near = key(0, 5);
        let far_loaded = key(1, 9);
        let far_loading = key(2, 9);
        let close_failed = key(3, 7);

        let manager = in_memory_manager();
        {
            let mut tiles = manager.tiles.lock().unwrap();
            tiles.insert(near, TileState::Loaded(texture.clone()));
            tiles.insert(far_loaded, TileState::Loaded(texture));
            tiles.insert(far_loading, TileState::Loading);
            tiles.insert(close_failed, TileState::Failed);
        }

        manager.evict_distant(5);

        let tiles = manager.tiles.lock().unwrap();
        assert_eq!(tiles.len(), 3);
        assert!(tiles.contains_key(&near));
        assert!(tiles.contains_key(&far_loading));
        assert!(tiles.contains_key(&close_failed));
        assert!(!tiles.contains_key(&far_loaded));
    }

    #[test]
    fn test_visible_tiles_wrap_and_clamp() {
        let tiles = TileManager::visible_tiles(0.0, 179.9, 1, 800.0, 600.0);
        assert!(!tiles.is_empty());
        for (coord, _, _) in &tiles {
            assert!(coord.x < 2);
            assert!(coord.y < 2);
            assert_eq!(coord.zoom, 1);
        }
    }
}
