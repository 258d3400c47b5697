//! Color and small numeric helpers.

use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// An opaque sRGB color (8 bits per channel). Serializes as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `rgb`, `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        parse_hex(hex)
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        rgb_to_hex(self.r as i32, self.g as i32, self.b as i32)
    }

    /// Channels as floats in `[0, 1]`.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::str::FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl From<Color> for Rgb {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b)
    }
}

impl From<Rgb> for Color {
    fn from(color: Rgb) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, 255)
    }
}

/// Hue (degrees), saturation and value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// Parse a hex color string.
pub fn parse_hex(hex: &str) -> Result<Rgb, ColorError> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    let invalid = || ColorError::InvalidHex(hex.to_string());

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };

    let num = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
    Ok(Rgb::new(
        ((num >> 16) & 0xff) as u8,
        ((num >> 8) & 0xff) as u8,
        (num & 0xff) as u8,
    ))
}

/// Format channels as `#rrggbb`, clamping each to 0..=255.
pub fn rgb_to_hex(r: i32, g: i32, b: i32) -> String {
    let c = |n: i32| n.clamp(0, 255);
    format!("#{:02x}{:02x}{:02x}", c(r), c(g), c(b))
}

pub fn rgb_to_hsv(color: Rgb) -> Hsv {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;
    let s = if max == 0.0 { 0.0 } else { d / max };

    let h = if d == 0.0 {
        0.0
    } else if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsv { h: h / 6.0 * 360.0, s, v: max }
}

pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let h = hsv.h.rem_euclid(360.0);
    let c = hsv.v * hsv.s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = hsv.v - c;

    let (r1, g1, b1) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_u8(r1), to_u8(g1), to_u8(b1))
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

pub fn distance(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    (x1 - x0).hypot(y1 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_and_short_hex() {
        assert_eq!(parse_hex("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(parse_hex("FF8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(parse_hex("#fff").unwrap(), Rgb::WHITE);
        assert_eq!(parse_hex("0a0").unwrap(), Rgb::new(0, 170, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_hex("").is_err());
        assert!(parse_hex("#ff80").is_err());
        assert!(parse_hex("#gg0000").is_err());
        assert!(parse_hex("#+12345").is_err());
    }

    #[test]
    fn test_hex_output_clamps_channels() {
        assert_eq!(rgb_to_hex(300, -5, 16), "#ff0010");
        assert_eq!(Rgb::new(1, 2, 3).to_hex(), "#010203");
    }

    #[test]
    fn test_hsv_primaries() {
        let red = rgb_to_hsv(Rgb::new(255, 0, 0));
        assert!((red.h - 0.0).abs() < 1e-9);
        assert!((red.s - 1.0).abs() < 1e-9);
        assert!((red.v - 1.0).abs() < 1e-9);

        let blue = rgb_to_hsv(Rgb::new(0, 0, 255));
        assert!((blue.h - 240.0).abs() < 1e-9);

        let gray = rgb_to_hsv(Rgb::new(128, 128, 128));
        assert_eq!(gray.s, 0.0);
        assert_eq!(gray.h, 0.0);
    }

    #[test]
    fn test_hsv_back_to_rgb() {
        for color in [
            Rgb::new(12, 200, 99),
            Rgb::new(255, 255, 0),
            Rgb::new(200, 10, 180),
            Rgb::BLACK,
            Rgb::WHITE,
        ] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(color)), color);
        }
    }

    #[test]
    fn test_hsv_hue_wraps() {
        let a = hsv_to_rgb(Hsv { h: 480.0, s: 1.0, v: 1.0 });
        let b = hsv_to_rgb(Hsv { h: 120.0, s: 1.0, v: 1.0 });
        assert_eq!(a, b);
        let c = hsv_to_rgb(Hsv { h: -120.0, s: 1.0, v: 1.0 });
        assert_eq!(c, Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_peniko_conversion() {
        let color: Color = Rgb::new(10, 20, 30).into();
        assert_eq!(Rgb::from(color), Rgb::new(10, 20, 30));
    }

    #[test]
    fn test_serde_as_hex() {
        assert_eq!(serde_json::to_string(&Rgb::new(255, 0, 16)).unwrap(), "\"#ff0010\"");
        let color: Rgb = serde_json::from_str("\"#0f0\"").unwrap();
        assert_eq!(color, Rgb::new(0, 255, 0));
        assert!(serde_json::from_str::<Rgb>("\"nope\"").is_err());
    }

    #[test]
    fn test_clamp_and_distance() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert!((distance(0.0, 0.0, 3.0, 4.0) - 5.0).abs() < 1e-12);
    }
}
