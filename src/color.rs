use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Accent used for single-series charts.
pub const ACCENT: Color32 = Color32::from_rgb(29, 185, 84);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

/// Red (-1) through yellow (0) to green (+1); grey when there is no value.
pub fn diverging(value: Option<f64>) -> Color32 {
    match value {
        Some(v) => {
            let t = ((v.clamp(-1.0, 1.0) + 1.0) / 2.0) as f32;
            hsl_to_color32(t * 120.0, 0.65, 0.45)
        }
        None => Color32::DARK_GRAY,
    }
}

// ---------------------------------------------------------------------------
// Color mapping: label → Color32
// ---------------------------------------------------------------------------

/// Maps distinct labels (e.g. artist names) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map over the distinct labels, in sorted order.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: Vec<&str> = labels
            .into_iter()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let mapping = unique
            .iter()
            .zip(generate_palette(unique.len()))
            .map(|(label, c)| (label.to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn color_map_is_stable_per_label() {
        let map = ColorMap::new(["b", "a", "b"]);
        assert_eq!(map.color_for("b"), map.color_for("b"));
        assert_ne!(map.color_for("a"), map.color_for("b"));
        assert_eq!(map.color_for("zzz"), Color32::GRAY);
    }

    #[test]
    fn diverging_ends_differ() {
        assert_ne!(diverging(Some(-1.0)), diverging(Some(1.0)));
        assert_eq!(diverging(None), Color32::DARK_GRAY);
    }
}
