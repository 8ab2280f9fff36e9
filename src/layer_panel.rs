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

//! Layer switcher anchored to the top-right corner of the map.
//!
//! Base layers are mutually exclusive (radio buttons); overlays toggle
//! independently (checkboxes). All state lives in [`LayerControl`], the
//! panel only edits it and logs what changed.

use log::info;
use quake_feed::{BaseLayer, LayerControl, LayerEvent, Overlay};

pub fn show(ctx: &egui::Context, control: &mut LayerControl) {
    egui::Window::new("Layers")
        .id(egui::Id::new("layer_panel"))
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            for event in contents(ui, control) {
                log_event(event);
            }
        });
}

fn contents(ui: &mut egui::Ui, control: &mut LayerControl) -> Vec<LayerEvent> {
    let mut events = Vec::new();

    let mut base = control.base_layer();
    for layer in BaseLayer::ALL {
        ui.radio_value(&mut base, layer, layer.display_name());
    }
    events.extend(control.set_base_layer(base));

    ui.separator();

    for overlay in Overlay::ALL {
        let mut visible = control.is_visible(overlay);
        if ui.checkbox(&mut visible, overlay.display_name()).changed() {
            events.extend(control.set_overlay_visible(overlay, visible));
        }
    }

    events
}

fn log_event(event: LayerEvent) {
    match event {
        LayerEvent::BaseChanged(base) => info!("Base layer: {}", base.display_name()),
        LayerEvent::OverlayAdded(overlay) => info!("Overlay shown: {overlay}"),
        LayerEvent::OverlayRemoved(overlay) => info!("Overlay hidden: {overlay}"),
    }
}
