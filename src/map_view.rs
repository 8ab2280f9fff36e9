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

//! Map canvas: base tiles, data overlays, marker popups, pan and zoom.

use egui::{Color32, Pos2, Rect, Stroke};
use quake_feed::layers::{EarthquakeLayer, PlateLayer};
use quake_feed::style::Rgb;
use quake_feed::{BaseLayer, GeoPoint, LayerControl, Layers, Overlay, Popup, QuakeMarker};

use crate::tiles::{TileManager, WebMercator, ATTRIBUTION, MAX_ZOOM, TILE_SIZE};

const MIN_ZOOM: f32 = 1.0;

/// Tiny markers stay clickable within this radius
const MIN_HIT_RADIUS: f32 = 4.0;

/// Scroll distance (points) per zoom level
const SCROLL_PER_ZOOM_LEVEL: f32 = 120.0;

pub fn rgb_to_color32(rgb: Rgb, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

/// Status message drawn over the top of the map
#[derive(Debug, Clone, PartialEq)]
pub enum Banner {
    Info(String),
    Error(String),
}

/// Maps geographic positions to screen positions for one frame
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    center_x: f64,
    center_y: f64,
    zoom: u8,
    origin: Pos2,
}

impl Projection {
    pub fn new(center_lat: f64, center_lon: f64, zoom: u8, origin: Pos2) -> Self {
        Self {
            center_x: WebMercator::lon_to_x(center_lon, zoom),
            center_y: WebMercator::lat_to_y(center_lat, zoom),
            zoom,
            origin,
        }
    }

    pub fn to_screen(&self, point: GeoPoint) -> Pos2 {
        let tile_x = WebMercator::lon_to_x(point.lon, self.zoom);
        let tile_y = WebMercator::lat_to_y(point.lat, self.zoom);

        let pixel_x = (tile_x - self.center_x) * TILE_SIZE;
        let pixel_y = (tile_y - self.center_y) * TILE_SIZE;

        egui::pos2(
            self.origin.x + pixel_x as f32,
            self.origin.y + pixel_y as f32,
        )
    }
}

/// Index of the topmost marker under `pointer`, if any.
///
/// Later markers are drawn over earlier ones, so the search runs backwards.
pub fn marker_at(markers: &[QuakeMarker], projection: &Projection, pointer: Pos2) -> Option<usize> {
    markers
        .iter()
        .enumerate()
        .rev()
        .find(|(_, marker)| {
            let pos = projection.to_screen(marker.position);
            let hit_radius = (marker.style.radius as f32).max(MIN_HIT_RADIUS);
            pos.distance(pointer) <= hit_radius
        })
        .map(|(index, _)| index)
}

#[derive(Debug)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f32,
    /// Index of the earthquake marker whose popup is open
    selected: Option<usize>,
}

impl MapView {
    pub fn new(center_lat: f64, center_lon: f64, zoom: f32) -> Self {
        Self {
            center_lat: center_lat.clamp(-85.0, 85.0),
            center_lon,
            zoom: zoom.clamp(MIN_ZOOM, f32::from(MAX_ZOOM)),
            selected: None,
        }
    }

    /// Zoom level used for tiles and projection
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.round() as u8
    }

    /// Move the map so content follows a drag of `(dx, dy)` pixels
    pub fn pan_by_pixels(&mut self, dx: f32, dy: f32) {
        let zoom = self.tile_zoom();
        let x = WebMercator::lon_to_x(self.center_lon, zoom) - f64::from(dx) / TILE_SIZE;
        let y = WebMercator::lat_to_y(self.center_lat, zoom) - f64::from(dy) / TILE_SIZE;

        let lon = WebMercator::tile_to_lon(x, zoom);
        self.center_lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
        self.center_lat = WebMercator::tile_to_lat(y, zoom).clamp(-85.0, 85.0);
    }

    pub fn zoom_by(&mut self, levels: f32) {
        self.zoom = (self.zoom + levels).clamp(MIN_ZOOM, f32::from(MAX_ZOOM));
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        tiles: Option<&TileManager>,
        control: &LayerControl,
        layers: Option<&Layers>,
        banner: Option<&Banner>,
    ) {
        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), ui.available_height()),
            egui::Sense::click_and_drag(),
        );

        let rect = response.rect;
        let zoom = self.tile_zoom();
        let projection = Projection::new(self.center_lat, self.center_lon, zoom, rect.center());

        painter.rect_filled(rect, 0.0, Color32::from_rgb(200, 210, 220));

        if let Some(tiles) = tiles {
            self.draw_tiles(ui.ctx(), &painter, rect, tiles, control.base_layer());
        }

        if let Some(layers) = layers {
            for overlay in control.draw_order() {
                match overlay {
                    Overlay::Plates => draw_plates(&painter, &projection, &layers.plates),
                    Overlay::Earthquakes => {
                        draw_earthquakes(&painter, &projection, rect, &layers.earthquakes);
                    }
                }
            }
        }

        // Attribution (required by the imagery provider)
        painter.text(
            rect.left_bottom() + egui::vec2(10.0, -10.0),
            egui::Align2::LEFT_BOTTOM,
            ATTRIBUTION,
            egui::FontId::proportional(10.0),
            Color32::from_black_alpha(180),
        );

        if let Some(banner) = banner {
            draw_banner(&painter, rect, banner);
        }

        // Pinch and scroll zoom
        let (zoom_delta, scroll) = ui.input(|i| (i.zoom_delta(), i.smooth_scroll_delta.y));
        if (zoom_delta - 1.0).abs() > 0.001 {
            self.zoom_by(zoom_delta.log2());
        } else if response.hovered() && scroll.abs() > 0.0 {
            self.zoom_by(scroll / SCROLL_PER_ZOOM_LEVEL);
        }

        if response.dragged() {
            let delta = response.drag_delta();
            self.pan_by_pixels(delta.x, delta.y);
        }

        let quakes_visible = control.is_visible(Overlay::Earthquakes);
        let markers = layers
            .filter(|_| quakes_visible)
            .map(|l| l.earthquakes.markers.as_slice())
            .unwrap_or_default();

        if response.clicked() {
            self.selected = response
                .interact_pointer_pos()
                .and_then(|pointer| marker_at(markers, &projection, pointer));
        }

        match self.selected.and_then(|index| markers.get(index)) {
            Some(marker) => show_popup(ui.ctx(), projection.to_screen(marker.position), marker),
            None => self.selected = None,
        }
    }

    fn draw_tiles(
        &self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        rect: Rect,
        tiles: &TileManager,
        base: BaseLayer,
    ) {
        let center = rect.center();
        let tile_size = TILE_SIZE as f32;

        tiles.evict_distant(self.tile_zoom());

        let visible = TileManager::visible_tiles(
            self.center_lat,
            self.center_lon,
            self.tile_zoom(),
            rect.width(),
            rect.height(),
        );

        for (coord, offset_x, offset_y) in visible {
            if let Some(texture) = tiles.get_tile(base, coord, ctx) {
                let tile_rect = Rect::from_min_size(
                    egui::pos2(center.x + offset_x, center.y + offset_y),
                    egui::vec2(tile_size, tile_size),
                );

                painter.image(
                    texture.id(),
                    tile_rect,
                    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
        }

        let failed = tiles.error_count(base);
        if failed > 0 {
            painter.text(
                rect.right_top() + egui::vec2(-10.0, 10.0),
                egui::Align2::RIGHT_TOP,
                format!("{failed} tiles failed to load"),
                egui::FontId::proportional(10.0),
                Color32::from_rgb(180, 40, 40),
            );
        } else if tiles.has_loading_tiles(base) {
            ctx.request_repaint();
        }
    }
}

fn draw_plates(painter: &egui::Painter, projection: &Projection, layer: &PlateLayer) {
    let stroke = Stroke::new(layer.style.width, rgb_to_color32(layer.style.color, 1.0));

    for boundary in &layer.boundaries {
        for line in &boundary.lines {
            let mut run: Vec<Pos2> = Vec::with_capacity(line.len());
            let mut previous: Option<GeoPoint> = None;

            for point in line {
                // Break the line where it crosses the antimeridian
                if previous.is_some_and(|p| (point.lon - p.lon).abs() > 180.0) {
                    let finished = std::mem::take(&mut run);
                    if finished.len() > 1 {
                        painter.line(finished, stroke);
                    }
                }
                run.push(projection.to_screen(*point));
                previous = Some(*point);
            }

            if run.len() > 1 {
                painter.line(run, stroke);
            }
        }
    }
}

fn draw_earthquakes(
    painter: &egui::Painter,
    projection: &Projection,
    rect: Rect,
    layer: &EarthquakeLayer,
) {
    for marker in &layer.markers {
        let pos = projection.to_screen(marker.position);
        let radius = marker.style.radius as f32;

        if !rect.expand(radius + marker.style.stroke_width).contains(pos) {
            continue;
        }

        painter.circle(
            pos,
            radius,
            rgb_to_color32(marker.style.fill, marker.style.fill_opacity),
            Stroke::new(marker.style.stroke_width, rgb_to_color32(marker.style.stroke, 1.0)),
        );
    }
}

/// Split the popup text into a heading (the place) and the remaining rows
fn popup_rows(popup: &Popup) -> (String, Vec<String>) {
    let text = popup.text();
    let mut lines = text.lines().map(str::to_string);
    let heading = lines.next().unwrap_or_default();
    (heading, lines.collect())
}

fn show_popup(ctx: &egui::Context, anchor: Pos2, marker: &QuakeMarker) {
    let popup = &marker.popup;

    egui::Area::new(egui::Id::new("quake_popup"))
        .fixed_pos(anchor + egui::vec2(marker.style.radius as f32 + 6.0, -12.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(280.0);
                let (heading, rows) = popup_rows(popup);
                ui.label(egui::RichText::new(heading).strong().size(14.0));
                for row in rows {
                    ui.label(row);
                }
            });
        });
}

fn draw_banner(painter: &egui::Painter, rect: Rect, banner: &Banner) {
    let (message, bg_color) = match banner {
        Banner::Info(message) => (message, Color32::from_rgb(255, 200, 100)),
        Banner::Error(message) => (message, Color32::from_rgb(220, 50, 50)),
    };

    let pos = rect.center_top() + egui::vec2(0.0, 20.0);
    let galley = painter.layout_no_wrap(
        message.clone(),
        egui::FontId::proportional(12.0),
        Color32::WHITE,
    );

    let padding = egui::vec2(12.0, 6.0);
    let bubble_rect = Rect::from_center_size(pos, galley.size() + padding * 2.0);

    painter.rect_filled(bubble_rect, 5.0, bg_color);
    painter.text(
        pos,
        egui::Align2::CENTER_CENTER,
        message,
        egui::FontId::proportional(12.0),
        Color32::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quake_feed::style::MarkerStyle;

    fn marker(lat: f64, lon: f64, magnitude: f64) -> QuakeMarker {
        QuakeMarker {
            position: GeoPoint::new(lat, lon),
            style: MarkerStyle::for_magnitude(magnitude),
            popup: Popup {
                place: "Test Quake".to_string(),
                magnitude,
                time: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            },
        }
    }

    #[test]
    fn test_projection_orientation() {
        let origin = egui::pos2(400.0, 300.0);
        let projection = Projection::new(37.09, -119.42, 5, origin);

        let center = projection.to_screen(GeoPoint::new(37.09, -119.42));
        assert!(center.distance(origin) < 0.01);

        let east = projection.to_screen(GeoPoint::new(37.09, -118.0));
        let north = projection.to_screen(GeoPoint::new(38.0, -119.42));
        assert!(east.x > origin.x);
        assert!(north.y < origin.y);
    }

    #[test]
    fn test_marker_at_prefers_topmost() {
        let projection = Projection::new(0.0, 0.0, 5, egui::pos2(0.0, 0.0));
        let markers = vec![marker(0.0, 0.0, 3.0), marker(0.0, 0.0, 2.0)];

        assert_eq!(marker_at(&markers, &projection, egui::pos2(1.0, 1.0)), Some(1));
        assert_eq!(marker_at(&markers, &projection, egui::pos2(200.0, 200.0)), None);
    }

    #[test]
    fn test_tiny_marker_still_clickable() {
        let projection = Projection::new(0.0, 0.0, 5, egui::pos2(0.0, 0.0));
        let markers = vec![marker(0.0, 0.0, 0.0)];
        assert_eq!(marker_at(&markers, &projection, egui::pos2(3.0, 0.0)), Some(0));
    }

    #[test]
    fn test_pan_by_pixels() {
        let mut view = MapView::new(0.0, 0.0, 2.0);
        view.pan_by_pixels(0.0, 0.0);
        assert!(view.center_lon.abs() < 1e-9);
        assert!(view.center_lat.abs() < 1e-9);

        // Dragging left by one tile moves a quarter of the world east
        view.pan_by_pixels(-256.0, 0.0);
        assert!((view.center_lon - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = MapView::new(37.09, -119.42, 5.0);
        view.zoom_by(40.0);
        assert_eq!(view.tile_zoom(), MAX_ZOOM);
        view.zoom_by(-40.0);
        assert_eq!(view.tile_zoom(), 1);
    }

    #[test]
    fn test_popup_rows() {
        let quake = marker(0.0, 0.0, 4.2);
        let (heading, rows) = popup_rows(&quake.popup);

        assert_eq!(heading, "Test Quake");
        assert_eq!(
            rows,
            vec![
                "Magnitude: 4.2".to_string(),
                "Tue Nov 14 2023 22:13:20 UTC".to_string(),
            ]
        );
    }

    #[test]
    fn test_rgb_to_color32() {
        let color = rgb_to_color32(Rgb::new(0xee, 0x6c, 0x6e), 1.0);
        assert_eq!(color, Color32::from_rgb(0xee, 0x6c, 0x6e));
    }
}
