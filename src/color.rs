//! # Color and Lighting Math
//!
//! Pure conversions between hex, RGB, HSL and HSV, plus the two operations
//! the normalizer builds on:
//!
//! - [`adjust_rgb`] / [`adjust_lighting_hex`] - nudge a lighting color warmer,
//!   cooler, more saturated or brighter
//! - [`complementary`] - rotate the hue by 180° for negative emotions
//!
//! Malformed hex input yields `None`; nothing here returns an error.
//!
//! ```rust
//! use moodlight::color::{hex_to_rgb, Rgb};
//!
//! assert_eq!(hex_to_rgb("#0f8"), Some(Rgb::new(0x00, 0xFF, 0x88)));
//! assert_eq!(Rgb::new(117, 111, 181).to_hex(), "#756FB5");
//! assert!(hex_to_rgb("not-a-color").is_none());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Six uppercase hex digits, after `#` stripping, doubling and uppercasing.
static HEX6_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-F]{6}$").unwrap());

/// Degrees of hue shifted per unit of `warm` / `cool`.
const HUE_SHIFT_PER_UNIT: f64 = 18.0;

// ============================================================================
// TYPES
// ============================================================================

/// An 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from floating channels, clamping each to [0, 255] and rounding.
    pub fn from_f64(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }

    /// `#RRGGBB`, uppercase
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Hue in degrees [0, 360), saturation and lightness in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// Hue in degrees [0, 360), saturation and value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// Smart-bulb style HSB triple: hue 0..=65535, saturation and brightness 0..=254
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: u16,
    pub saturation: u8,
    pub brightness: u8,
}

/// Relative nudges applied to a lighting color.
///
/// `warm` rotates hue toward red, `cool` away from it, both by 18° per unit.
/// `saturate` and `brighten` are added to S and L and clamped to [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingAdjust {
    pub warm: f64,
    pub cool: f64,
    pub saturate: f64,
    pub brighten: f64,
}

impl LightingAdjust {
    pub fn warm(amount: f64, brighten: f64) -> Self {
        Self {
            warm: amount,
            brighten,
            ..Self::default()
        }
    }

    pub fn cool(amount: f64, brighten: f64) -> Self {
        Self {
            cool: amount,
            brighten,
            ..Self::default()
        }
    }
}

// ============================================================================
// HEX
// ============================================================================

/// Parse `#RRGGBB`, `#RGB` or either without the leading `#`, case-insensitive.
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed).to_ascii_uppercase();

    let expanded = if digits.chars().count() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect::<String>()
    } else {
        digits
    };

    if !HEX6_PATTERN.is_match(&expanded) {
        return None;
    }

    let value = u32::from_str_radix(&expanded, 16).ok()?;
    Some(Rgb::new(
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    ))
}

/// Encode floating channels as `#RRGGBB`, clamping and rounding each one.
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    Rgb::from_f64(r, g, b).to_hex()
}

fn channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// HSL / HSV
// ============================================================================

/// Hue shared by HSL and HSV, in degrees [0, 360). Zero for greys.
fn hue_of(r: f64, g: f64, b: f64, max: f64, delta: f64) -> f64 {
    if delta == 0.0 {
        return 0.0;
    }
    let sector = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    sector * 60.0
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let (r, g, b) = unit_channels(rgb);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;

    if delta == 0.0 {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    Hsl {
        h: hue_of(r, g, b, max, delta),
        s,
        l,
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0);
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (rp, gp, bp) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Rgb::from_f64((rp + m) * 255.0, (gp + m) * 255.0, (bp + m) * 255.0)
}

pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let (r, g, b) = unit_channels(rgb);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    Hsv {
        h: hue_of(r, g, b, max, delta),
        s: if max == 0.0 { 0.0 } else { delta / max },
        v: max,
    }
}

fn unit_channels(rgb: Rgb) -> (f64, f64, f64) {
    (
        f64::from(rgb.r) / 255.0,
        f64::from(rgb.g) / 255.0,
        f64::from(rgb.b) / 255.0,
    )
}

/// HSB display triple for a colored light.
///
/// With an explicit brightness percentage the HSV value is ignored and the
/// percentage (clamped to 0..=100) is scaled to 0..=254.
pub fn hsb_for_rgb(rgb: Rgb, brightness_pct: Option<f64>) -> Hsb {
    let hsv = rgb_to_hsv(rgb);
    let brightness = match brightness_pct {
        Some(pct) => brightness_254(pct),
        None => (hsv.v * 254.0).round() as u8,
    };
    Hsb {
        hue: ((hsv.h / 360.0) * 65535.0).round() as u16,
        saturation: (hsv.s * 254.0).round() as u8,
        brightness,
    }
}

/// HSB display triple for a white (color temperature) light.
pub fn hsb_for_white(brightness_pct: f64) -> Hsb {
    Hsb {
        hue: 0,
        saturation: 0,
        brightness: brightness_254(brightness_pct),
    }
}

fn brightness_254(pct: f64) -> u8 {
    (pct.clamp(0.0, 100.0) * 2.54).round() as u8
}

// ============================================================================
// ADJUSTMENTS
// ============================================================================

/// Rotate hue by `degrees`, keeping saturation and lightness.
pub fn rotate_hue(rgb: Rgb, degrees: f64) -> Rgb {
    let mut hsl = rgb_to_hsl(rgb);
    hsl.h = (hsl.h + degrees).rem_euclid(360.0);
    hsl_to_rgb(hsl)
}

/// The 180° complement used as a calming tone for negative emotions.
pub fn complementary(rgb: Rgb) -> Rgb {
    rotate_hue(rgb, 180.0)
}

pub fn adjust_rgb(rgb: Rgb, adjust: &LightingAdjust) -> Rgb {
    let mut hsl = rgb_to_hsl(rgb);

    if adjust.warm != 0.0 {
        hsl.h = (hsl.h + HUE_SHIFT_PER_UNIT * adjust.warm).rem_euclid(360.0);
    }
    if adjust.cool != 0.0 {
        hsl.h = (hsl.h - HUE_SHIFT_PER_UNIT * adjust.cool).rem_euclid(360.0);
    }
    if adjust.saturate != 0.0 {
        hsl.s = (hsl.s + adjust.saturate).clamp(0.0, 1.0);
    }
    if adjust.brighten != 0.0 {
        hsl.l = (hsl.l + adjust.brighten).clamp(0.0, 1.0);
    }

    hsl_to_rgb(hsl)
}

/// Hex-in, hex-out form of [`adjust_rgb`]. Malformed input comes back untouched.
pub fn adjust_lighting_hex(base_hex: &str, adjust: &LightingAdjust) -> String {
    match hex_to_rgb(base_hex) {
        Some(rgb) => adjust_rgb(rgb, adjust).to_hex(),
        None => base_hex.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
