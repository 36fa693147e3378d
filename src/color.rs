use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.55, 0.50);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Fill for single-series charts (bars, lines).
pub const SERIES_COLOR: Color32 = Color32::from_rgb(0x4A, 0x55, 0xA2);

/// Fill for the bucket matching the active filter.
pub const ACTIVE_COLOR: Color32 = Color32::from_rgb(0xE7, 0x61, 0x61);

// ---------------------------------------------------------------------------
// Color mapping: dimension key → Color32
// ---------------------------------------------------------------------------

/// Stable colour per dimension key, so a slice keeps its colour while the
/// other filters change.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: HashMap<CellValue, Color32>,
}

impl ColorMap {
    /// Assign palette colours to `keys` in order.
    pub fn new(keys: &[CellValue]) -> Self {
        let palette = generate_palette(keys.len());
        let mapping = keys.iter().cloned().zip(palette).collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a given key.
    pub fn color_for(&self, key: &CellValue) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(Color32::GRAY)
    }
}
