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

//! Magnitude legend in the bottom-right corner.

use egui::{Color32, Stroke};
use quake_feed::style::legend_entries;

use crate::map_view::rgb_to_color32;

const SWATCH_SIZE: f32 = 14.0;

pub fn show(ctx: &egui::Context) {
    egui::Area::new(egui::Id::new("magnitude_legend"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-10.0, -24.0))
        .order(egui::Order::Foreground)
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .fill(Color32::from_white_alpha(230))
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Magnitude").strong().color(Color32::BLACK));

                    for entry in legend_entries() {
                        ui.horizontal(|ui| {
                            let (rect, _) = ui.allocate_exact_size(
                                egui::vec2(SWATCH_SIZE, SWATCH_SIZE),
                                egui::Sense::hover(),
                            );
                            ui.painter().rect_filled(rect, 2.0, rgb_to_color32(entry.color, 1.0));
                            ui.painter().rect_stroke(
                                rect,
                                2.0,
                                Stroke::new(1.0, Color32::from_black_alpha(120)),
                                egui::StrokeKind::Inside,
                            );
                            ui.label(egui::RichText::new(entry.label).color(Color32::BLACK));
                        });
                    }
                });
        });
}
