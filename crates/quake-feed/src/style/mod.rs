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

//! Style rules for earthquake markers, plate boundaries and the legend.
//!
//! Everything here is a pure function of magnitude. The color ladder is an
//! ordered table of `(threshold, color)` pairs evaluated top-down, first
//! strict `>` match wins.

use std::fmt;

/// Marker radius in pixels per unit of magnitude.
pub const RADIUS_PER_MAGNITUDE: f64 = 5.0;

/// An sRGB color without alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const ORANGE: Rgb = Rgb::new(0xff, 0xa5, 0x00);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Magnitude color ladder, strongest first.
const MAGNITUDE_COLORS: [(f64, Rgb); 5] = [
    (5.0, Rgb::new(0xee, 0x6c, 0x6e)),
    (4.0, Rgb::new(0xee, 0xa7, 0x70)),
    (3.0, Rgb::new(0xf2, 0xb9, 0x57)),
    (2.0, Rgb::new(0xf2, 0xdb, 0x5a)),
    (1.0, Rgb::new(0xe2, 0xf1, 0x5b)),
];

/// Color for anything at or below the lowest threshold.
const BASE_COLOR: Rgb = Rgb::new(0xb8, 0xf1, 0x5a);

/// Legend rows: label and a representative magnitude inside the bucket.
const LEGEND_BUCKETS: [(&str, f64); 6] = [
    ("0-1", 0.5),
    ("1-2", 1.5),
    ("2-3", 2.5),
    ("3-4", 3.5),
    ("4-5", 4.5),
    ("5+", 5.5),
];

/// Fill color for a given magnitude.
#[must_use]
pub fn color_for_magnitude(magnitude: f64) -> Rgb {
    MAGNITUDE_COLORS
        .iter()
        .find(|(threshold, _)| magnitude > *threshold)
        .map_or(BASE_COLOR, |(_, color)| *color)
}

/// Marker radius in pixels. Never negative.
#[must_use]
pub fn marker_radius(magnitude: f64) -> f64 {
    (magnitude * RADIUS_PER_MAGNITUDE).max(0.0)
}

/// Visual style of one earthquake marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub fill: Rgb,
    pub fill_opacity: f32,
    pub radius: f64,
    pub stroke: Rgb,
    pub stroke_width: f32,
}

impl MarkerStyle {
    /// Style derived from magnitude alone.
    #[must_use]
    pub fn for_magnitude(magnitude: f64) -> Self {
        Self {
            fill: color_for_magnitude(magnitude),
            fill_opacity: 1.0,
            radius: marker_radius(magnitude),
            stroke: Rgb::BLACK,
            stroke_width: 1.0,
        }
    }
}

/// Outline style shared by every plate boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Rgb,
    pub width: f32,
}

/// The one style used for the plate boundary layer.
pub const PLATE_STYLE: LineStyle = LineStyle {
    color: Rgb::ORANGE,
    width: 3.0,
};

/// One legend row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: Rgb,
}

/// The six static legend rows, weakest first.
#[must_use]
pub fn legend_entries() -> Vec<LegendEntry> {
    LEGEND_BUCKETS
        .iter()
        .map(|&(label, magnitude)| LegendEntry {
            label,
            color: color_for_magnitude(magnitude),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_thresholds_are_exclusive() {
        assert_eq!(color_for_magnitude(5.1).to_string(), "#ee6c6e");
        assert_eq!(color_for_magnitude(5.0).to_string(), "#eea770");
        assert_eq!(color_for_magnitude(4.0).to_string(), "#f2b957");
        assert_eq!(color_for_magnitude(3.0).to_string(), "#f2db5a");
        assert_eq!(color_for_magnitude(2.0).to_string(), "#e2f15b");
        assert_eq!(color_for_magnitude(1.0).to_string(), "#b8f15a");
        assert_eq!(color_for_magnitude(0.0).to_string(), "#b8f15a");
    }

    #[test]
    fn test_color_just_above_each_threshold() {
        assert_eq!(color_for_magnitude(4.01).to_string(), "#eea770");
        assert_eq!(color_for_magnitude(3.01).to_string(), "#f2b957");
        assert_eq!(color_for_magnitude(2.01).to_string(), "#f2db5a");
        assert_eq!(color_for_magnitude(1.01).to_string(), "#e2f15b");
        assert_eq!(color_for_magnitude(9.5).to_string(), "#ee6c6e");
        assert_eq!(color_for_magnitude(-1.2).to_string(), "#b8f15a");
    }

    #[test]
    fn test_color_is_one_of_six() {
        let palette: Vec<Rgb> = MAGNITUDE_COLORS
            .iter()
            .map(|(_, c)| *c)
            .chain(std::iter::once(BASE_COLOR))
            .collect();
        for tenths in -20..=100 {
            let color = color_for_magnitude(f64::from(tenths) / 10.0);
            assert!(palette.contains(&color));
        }
    }

    #[test]
    fn test_marker_radius() {
        assert!((marker_radius(4.2) - 21.0).abs() < 1e-9);
        assert!(marker_radius(0.0).abs() < f64::EPSILON);
        assert!(marker_radius(-0.5) >= 0.0);
    }

    #[test]
    fn test_marker_style() {
        let style = MarkerStyle::for_magnitude(3.5);
        assert_eq!(style.fill, color_for_magnitude(3.5));
        assert_eq!(style.stroke, Rgb::BLACK);
        assert!((style.fill_opacity - 1.0).abs() < f32::EPSILON);
        assert!((style.stroke_width - 1.0).abs() < f32::EPSILON);
        assert!((style.radius - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_legend_matches_marker_colors() {
        let entries = legend_entries();
        let labels: Vec<&str> = entries.iter().map(|e| e.label).collect();
        assert_eq!(labels, ["0-1", "1-2", "2-3", "3-4", "4-5", "5+"]);
        assert_eq!(entries[0].color, color_for_magnitude(0.0));
        assert_eq!(entries[5].color, color_for_magnitude(7.0));
        assert_eq!(entries[3].color.to_string(), "#f2b957");
    }
}
