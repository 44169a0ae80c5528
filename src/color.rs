use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBAColor;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Rgba – colour with components in 0..=1
// ---------------------------------------------------------------------------

/// An RGBA colour, components in `0.0..=1.0`. Deserializes from `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f32; 4]")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Rgba::new(r, g, b, a)
    }
}

impl Rgba {
    pub const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0.0
    }

    fn channel(v: f32) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_plotters(self) -> RGBAColor {
        RGBAColor(
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b),
            self.a.clamp(0.0, 1.0) as f64,
        )
    }

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgba_unmultiplied(
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b),
            Self::channel(self.a),
        )
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgba> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgba::new(rgb.red, rgb.green, rgb.blue, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let colours = generate_palette(5);
        assert_eq!(colours.len(), 5);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a.to_color32(), b.to_color32());
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn converts_to_backend_colours() {
        let c = Rgba::new(0.0, 1.0, 0.0, 0.5);
        let p = c.to_plotters();
        assert_eq!((p.0, p.1, p.2), (0, 255, 0));
        assert!((p.3 - 0.5).abs() < 1e-6);
        assert_eq!(c.to_color32().a(), 128);
    }

    #[test]
    fn deserializes_from_array() {
        let c: Rgba = serde_json::from_str("[1.0, 0.0, 0.0, 0.25]").unwrap();
        assert_eq!(c, Rgba::new(1.0, 0.0, 0.0, 0.25));
        assert!(c.is_visible());
        assert!(!Rgba::new(0.0, 0.0, 0.0, 0.0).is_visible());
    }
}
