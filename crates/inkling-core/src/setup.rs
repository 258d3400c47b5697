//! Canvas setup parameters and their validation.

use crate::color::{ColorError, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Setup validation errors. Nothing is initialized when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Please enter numeric values for width and height.")]
    NotNumeric,
    #[error(
        "The dimensions are incorrect. The width must be between {min_width}-{max_width}, \
         the height must be between {min_height}-{max_height} pixels."
    )]
    OutOfRange {
        min_width: u32,
        max_width: u32,
        min_height: u32,
        max_height: u32,
    },
    #[error("Invalid background color: {0}")]
    InvalidBackground(#[from] ColorError),
}

/// Allowed canvas dimensions, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupLimits {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl Default for SetupLimits {
    fn default() -> Self {
        Self {
            min_width: 1,
            max_width: 10_000,
            min_height: 1,
            max_height: 10_000,
        }
    }
}

impl SetupLimits {
    fn out_of_range(&self) -> SetupError {
        SetupError::OutOfRange {
            min_width: self.min_width,
            max_width: self.max_width,
            min_height: self.min_height,
            max_height: self.max_height,
        }
    }
}

/// How the canvas starts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupMode {
    /// Blank canvas.
    #[default]
    Draw,
    /// An image will be imported; its background pixels count as baked in.
    Upload,
}

/// Validated canvas parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSetup {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_background")]
    pub background: Rgb,
    #[serde(default)]
    pub mode: SetupMode,
}

fn default_background() -> Rgb {
    Rgb::WHITE
}

impl CanvasSetup {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            mode: SetupMode::Draw,
        }
    }

    pub fn with_mode(mut self, mode: SetupMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse raw form inputs. Numbers are read like a leading integer
    /// (`"640px"` is 640); anything without leading digits is rejected.
    pub fn from_inputs(width: &str, height: &str, background: &str, limits: &SetupLimits) -> Result<Self, SetupError> {
        let (Some(w), Some(h)) = (leading_int(width), leading_int(height)) else {
            return Err(SetupError::NotNumeric);
        };
        let fits = |v: i64, min: u32, max: u32| v >= min as i64 && v <= max as i64;
        if !fits(w, limits.min_width, limits.max_width) || !fits(h, limits.min_height, limits.max_height) {
            return Err(limits.out_of_range());
        }
        let background = Rgb::from_hex(background)?;
        Ok(Self::new(w as u32, h as u32, background))
    }

    pub fn validate(&self, limits: &SetupLimits) -> Result<(), SetupError> {
        let width_ok = (limits.min_width..=limits.max_width).contains(&self.width);
        let height_ok = (limits.min_height..=limits.max_height).contains(&self.height);
        if width_ok && height_ok {
            Ok(())
        } else {
            Err(limits.out_of_range())
        }
    }
}

fn leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    // Saturate absurdly long inputs; they are out of range either way.
    Some(digits.parse::<i64>().unwrap_or(i64::MAX) * sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_inputs() {
        let setup = CanvasSetup::from_inputs("800", " 600 ", "#ffeedd", &SetupLimits::default()).unwrap();
        assert_eq!(setup, CanvasSetup::new(800, 600, Rgb::new(0xff, 0xee, 0xdd)));
        assert_eq!(setup.mode, SetupMode::Draw);
    }

    #[test]
    fn test_leading_integer_parsing() {
        let setup = CanvasSetup::from_inputs("640px", "480.9", "#fff", &SetupLimits::default()).unwrap();
        assert_eq!((setup.width, setup.height), (640, 480));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let limits = SetupLimits::default();
        for (w, h) in [("", "10"), ("abc", "10"), ("10", "x10"), ("-", "5")] {
            assert_eq!(CanvasSetup::from_inputs(w, h, "#fff", &limits), Err(SetupError::NotNumeric));
        }
    }

    #[test]
    fn test_out_of_range_message() {
        let limits = SetupLimits::default();
        let err = CanvasSetup::from_inputs("0", "600", "#fff", &limits).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The dimensions are incorrect. The width must be between 1-10000, \
             the height must be between 1-10000 pixels."
        );
        assert!(CanvasSetup::from_inputs("10001", "5", "#fff", &limits).is_err());
        assert!(CanvasSetup::from_inputs("-5", "5", "#fff", &limits).is_err());
        assert!(CanvasSetup::from_inputs("99999999999999999999999", "5", "#fff", &limits).is_err());
    }

    #[test]
    fn test_bad_background() {
        let err = CanvasSetup::from_inputs("10", "10", "#12", &SetupLimits::default()).unwrap_err();
        assert!(matches!(err, SetupError::InvalidBackground(_)));
    }

    #[test]
    fn test_validate_against_limits() {
        let limits = SetupLimits {
            min_width: 10,
            max_width: 100,
            min_height: 10,
            max_height: 50,
        };
        assert!(CanvasSetup::new(100, 50, Rgb::WHITE).validate(&limits).is_ok());
        assert!(CanvasSetup::new(100, 51, Rgb::WHITE).validate(&limits).is_err());
        assert!(CanvasSetup::new(9, 20, Rgb::WHITE).validate(&limits).is_err());
    }

    #[test]
    fn test_setup_json_defaults() {
        let setup: CanvasSetup = serde_json::from_str(r#"{"width":4,"height":3}"#).unwrap();
        assert_eq!(setup.background, Rgb::WHITE);
        assert_eq!(setup.mode, SetupMode::Draw);
    }
}
