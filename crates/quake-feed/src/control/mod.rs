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

//! Layer control state: one active base layer, toggleable overlays, and
//! the order overlays are drawn in.
//!
//! Newly shown overlays are stacked on top of the others. Every time an
//! overlay is added the earthquake overlay is raised back to the top, so
//! markers are never hidden under plate boundary lines.

use std::fmt;

use log::debug;

/// Alternative base imagery. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BaseLayer {
    #[default]
    Satellite,
    Grayscale,
    Outdoors,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Satellite, BaseLayer::Grayscale, BaseLayer::Outdoors];

    /// Tile style identifier used in imagery URLs.
    #[must_use]
    pub fn style_id(&self) -> &'static str {
        match self {
            BaseLayer::Satellite => "mapbox.streets-satellite",
            BaseLayer::Grayscale => "mapbox.light",
            BaseLayer::Outdoors => "mapbox.outdoors",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            BaseLayer::Satellite => "Satellite",
            BaseLayer::Grayscale => "Grayscale",
            BaseLayer::Outdoors => "Outdoors",
        }
    }
}

/// Toggleable data overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Earthquakes,
    Plates,
}

impl Overlay {
    pub const ALL: [Overlay; 2] = [Overlay::Earthquakes, Overlay::Plates];

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Overlay::Earthquakes => "Earthquakes",
            Overlay::Plates => "Plates",
        }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Changes reported by [`LayerControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    BaseChanged(BaseLayer),
    OverlayAdded(Overlay),
    OverlayRemoved(Overlay),
}

/// Base layer selection and overlay stacking.
#[derive(Debug, Clone)]
pub struct LayerControl {
    base: BaseLayer,
    /// Visible overlays, bottom to top.
    order: Vec<Overlay>,
}

impl Default for LayerControl {
    /// Default base layer with plates and earthquakes shown, earthquakes on top.
    fn default() -> Self {
        Self {
            base: BaseLayer::default(),
            order: vec![Overlay::Plates, Overlay::Earthquakes],
        }
    }
}

impl LayerControl {
    #[must_use]
    pub fn base_layer(&self) -> BaseLayer {
        self.base
    }

    /// Switch base imagery. Overlays are not touched.
    pub fn set_base_layer(&mut self, base: BaseLayer) -> Option<LayerEvent> {
        if self.base == base {
            return None;
        }
        debug!("Base layer {} -> {}", self.base.display_name(), base.display_name());
        self.base = base;
        Some(LayerEvent::BaseChanged(base))
    }

    #[must_use]
    pub fn is_visible(&self, overlay: Overlay) -> bool {
        self.order.contains(&overlay)
    }

    /// Show or hide an overlay.
    pub fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool) -> Option<LayerEvent> {
        if self.is_visible(overlay) == visible {
            return None;
        }

        let event = if visible {
            self.order.push(overlay);
            LayerEvent::OverlayAdded(overlay)
        } else {
            self.order.retain(|o| *o != overlay);
            LayerEvent::OverlayRemoved(overlay)
        };

        debug!("Overlay event: {:?}", event);
        self.handle_event(event);
        Some(event)
    }

    fn handle_event(&mut self, event: LayerEvent) {
        if let LayerEvent::OverlayAdded(_) = event {
            self.bring_to_front(Overlay::Earthquakes);
        }
    }

    /// Move a visible overlay to the top of the stack.
    pub fn bring_to_front(&mut self, overlay: Overlay) {
        if let Some(pos) = self.order.iter().position(|o| *o == overlay) {
            let raised = self.order.remove(pos);
            self.order.push(raised);
        }
    }

    /// Visible overlays, bottom to top.
    #[must_use]
    pub fn draw_order(&self) -> &[Overlay] {
        &self.order
    }

    #[must_use]
    pub fn topmost(&self) -> Option<Overlay> {
        self.order.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let control = LayerControl::default();
        assert_eq!(control.base_layer(), BaseLayer::Satellite);
        assert!(control.is_visible(Overlay::Earthquakes));
        assert!(control.is_visible(Overlay::Plates));
        assert_eq!(control.topmost(), Some(Overlay::Earthquakes));
    }

    #[test]
    fn test_earthquakes_stay_on_top_when_plates_added() {
        let mut control = LayerControl::default();
        control.set_overlay_visible(Overlay::Plates, false);
        let event = control.set_overlay_visible(Overlay::Plates, true);

        assert_eq!(event, Some(LayerEvent::OverlayAdded(Overlay::Plates)));
        assert_eq!(control.draw_order(), &[Overlay::Plates, Overlay::Earthquakes]);
    }

    #[test]
    fn test_earthquakes_on_top_when_toggled_back_on() {
        let mut control = LayerControl::default();
        control.set_overlay_visible(Overlay::Earthquakes, false);
        assert_eq!(control.draw_order(), &[Overlay::Plates]);

        control.set_overlay_visible(Overlay::Earthquakes, true);
        assert_eq!(control.topmost(), Some(Overlay::Earthquakes));
    }

    #[test]
    fn test_redundant_toggle_is_noop() {
        let mut control = LayerControl::default();
        assert_eq!(control.set_overlay_visible(Overlay::Plates, true), None);
        assert_eq!(control.set_base_layer(BaseLayer::Satellite), None);
    }

    #[test]
    fn test_base_switch_leaves_overlays_alone() {
        let mut control = LayerControl::default();
        control.set_overlay_visible(Overlay::Plates, false);
        let before = control.draw_order().to_vec();

        for base in [BaseLayer::Grayscale, BaseLayer::Outdoors, BaseLayer::Satellite] {
            assert_eq!(control.set_base_layer(base), Some(LayerEvent::BaseChanged(base)));
            assert_eq!(control.base_layer(), base);
            assert_eq!(control.draw_order(), before.as_slice());
        }
    }

    #[test]
    fn test_style_ids() {
        assert_eq!(BaseLayer::Satellite.style_id(), "mapbox.streets-satellite");
        assert_eq!(BaseLayer::Grayscale.style_id(), "mapbox.light");
        assert_eq!(BaseLayer::Outdoors.style_id(), "mapbox.outdoors");
    }
}
