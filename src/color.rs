use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb, named};

use crate::data::model::Species;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize, saturation: f32, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, saturation, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Muted pastel tones, one per species (bar fills).
pub fn pastel_species_palette() -> Vec<(Species, Color32)> {
    Species::ALL
        .into_iter()
        .zip(generate_palette(Species::ALL.len(), 0.45, 0.65))
        .collect()
}

/// Strong saturated tones, one per species (scatter markers).
pub fn bold_species_palette() -> Vec<(Species, Color32)> {
    Species::ALL
        .into_iter()
        .zip(generate_palette(Species::ALL.len(), 0.75, 0.45))
        .collect()
}

// ---------------------------------------------------------------------------
// Named colours
// ---------------------------------------------------------------------------

/// Convert one of `palette::named` into an egui colour.
pub fn from_named(color: Srgb<u8>) -> Color32 {
    Color32::from_rgb(color.red, color.green, color.blue)
}

pub fn teal() -> Color32 {
    from_named(named::TEAL)
}

pub fn sky_blue() -> Color32 {
    from_named(named::SKYBLUE)
}
