//! Normalizer profile
//!
//! Allowed value sets, defaults and comfort-cue targets. The built-in
//! profile is [`NormalizerProfile::default`]. A YAML file is merged onto it
//! key by key, so anything the file leaves out keeps its built-in value:
//!
//! ```yaml
//! default_brightness: 50
//! cues:
//!   cold:
//!     temperature: { min: 24 }
//!     lighting: { warm: 0.5 }
//! ```

use crate::color::LightingAdjust;
use crate::emotion::{EnvironmentTarget, Quadrant};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ============================================================================
// PROFILE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerProfile {
    /// Allowed temperatures (°C)
    pub temperatures: Vec<f64>,
    /// Allowed relative humidities (%)
    pub humidities: Vec<f64>,
    /// Allowed lighting brightness percentages
    pub brightness: Vec<f64>,
    pub default_brightness: f64,
    pub kelvin: KelvinRange,
    pub targets: QuadrantTargets,
    pub cues: CueTargets,
}

impl Default for NormalizerProfile {
    fn default() -> Self {
        Self {
            temperatures: stepped(20.0, 30.0, 0.5),
            humidities: stepped(30.0, 70.0, 2.5),
            brightness: stepped(10.0, 100.0, 10.0),
            default_brightness: 60.0,
            kelvin: KelvinRange::default(),
            targets: QuadrantTargets::default(),
            cues: CueTargets::default(),
        }
    }
}

impl NormalizerProfile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let overrides: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mut merged = serde_yaml::to_value(Self::default())?;
        if !overrides.is_null() {
            merge(&mut merged, overrides);
        }
        Ok(serde_yaml::from_value(merged)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn target_for(&self, quadrant: Quadrant) -> EnvironmentTarget {
        self.targets.get(quadrant)
    }
}

/// Mappings merge recursively; any other override replaces the base value.
fn merge(base: &mut serde_yaml::Value, overrides: serde_yaml::Value) {
    match (base, overrides) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, value) => *base = value,
    }
}

/// White-light color temperature bounds (Kelvin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KelvinRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Default for KelvinRange {
    fn default() -> Self {
        Self {
            min: 2200.0,
            max: 6500.0,
            default: 4000.0,
        }
    }
}

impl KelvinRange {
    pub fn clamp(&self, kelvin: f64) -> f64 {
        kelvin.round().clamp(self.min, self.max)
    }
}

/// Per-quadrant climate targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadrantTargets {
    pub positive_active: EnvironmentTarget,
    pub positive_passive: EnvironmentTarget,
    pub negative_active: EnvironmentTarget,
    pub negative_passive: EnvironmentTarget,
    pub neutral: EnvironmentTarget,
}

impl Default for QuadrantTargets {
    fn default() -> Self {
        Self {
            positive_active: Quadrant::PositiveActive.target(),
            positive_passive: Quadrant::PositivePassive.target(),
            negative_active: Quadrant::NegativeActive.target(),
            negative_passive: Quadrant::NegativePassive.target(),
            neutral: Quadrant::Neutral.target(),
        }
    }
}

impl QuadrantTargets {
    pub fn get(&self, quadrant: Quadrant) -> EnvironmentTarget {
        match quadrant {
            Quadrant::PositiveActive => self.positive_active,
            Quadrant::PositivePassive => self.positive_passive,
            Quadrant::NegativeActive => self.negative_active,
            Quadrant::NegativePassive => self.negative_passive,
            Quadrant::Neutral => self.neutral,
        }
    }
}

// ============================================================================
// CUE TARGETS
// ============================================================================

/// Bounds a cue pushes a field into. Each bound is an ideal value that is
/// snapped to the nearest allowed value before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    /// Raise the field to at least this value
    pub min: Option<f64>,
    /// Lower the field to at most this value
    pub max: Option<f64>,
}

impl Range {
    pub const fn at_least(v: f64) -> Self {
        Self {
            min: Some(v),
            max: None,
        }
    }

    pub const fn at_most(v: f64) -> Self {
        Self {
            min: None,
            max: Some(v),
        }
    }

    pub const fn exactly(v: f64) -> Self {
        Self {
            min: Some(v),
            max: Some(v),
        }
    }

    /// Push `value` into the range, snapping both bounds to `allowed`.
    pub fn apply(&self, value: f64, allowed: &[f64]) -> f64 {
        let mut out = value;
        if let Some(min) = self.min {
            let floor = nearest_allowed(allowed, min, min);
            if out < floor {
                out = floor;
            }
        }
        if let Some(max) = self.max {
            let ceiling = nearest_allowed(allowed, max, max);
            if out > ceiling {
                out = ceiling;
            }
        }
        out
    }
}

/// What one comfort cue does when it matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueRule {
    pub temperature: Option<Range>,
    pub humidity: Option<Range>,
    pub brightness: Option<Range>,
    /// Hue/lightness nudge for colored lighting
    pub lighting: Option<LightingAdjust>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueTargets {
    pub cold: CueRule,
    pub hot: CueRule,
    pub dry: CueRule,
    pub humid: CueRule,
    pub stuffy: CueRule,
    pub bright: CueRule,
    pub dim: CueRule,
    pub sleepy: CueRule,
    pub focus: CueRule,
}

impl Default for CueTargets {
    fn default() -> Self {
        Self {
            cold: CueRule {
                temperature: Some(Range::at_least(25.0)),
                humidity: Some(Range::at_least(52.0)),
                brightness: Some(Range::at_least(40.0)),
                lighting: Some(LightingAdjust::warm(1.0, 0.06)),
            },
            hot: CueRule {
                temperature: Some(Range::at_most(20.0)),
                humidity: Some(Range::at_most(43.0)),
                brightness: Some(Range::at_least(60.0)),
                lighting: Some(LightingAdjust::cool(1.0, 0.08)),
            },
            dry: CueRule {
                humidity: Some(Range::at_least(55.0)),
                lighting: Some(LightingAdjust::warm(0.6, 0.04)),
                ..CueRule::default()
            },
            humid: CueRule {
                humidity: Some(Range::at_most(40.0)),
                lighting: Some(LightingAdjust::cool(0.8, 0.06)),
                ..CueRule::default()
            },
            stuffy: CueRule {
                temperature: Some(Range::at_most(20.0)),
                humidity: Some(Range::at_most(43.0)),
                brightness: Some(Range::at_least(60.0)),
                lighting: Some(LightingAdjust::cool(1.0, 0.08)),
            },
            bright: CueRule {
                brightness: Some(Range::at_most(40.0)),
                ..CueRule::default()
            },
            dim: CueRule {
                brightness: Some(Range::at_least(80.0)),
                ..CueRule::default()
            },
            sleepy: CueRule {
                temperature: Some(Range::at_least(23.0)),
                brightness: Some(Range::at_most(40.0)),
                ..CueRule::default()
            },
            focus: CueRule {
                temperature: Some(Range::exactly(21.0)),
                humidity: Some(Range::exactly(45.0)),
                brightness: Some(Range::at_least(60.0)),
                lighting: None,
            },
        }
    }
}

// ============================================================================
// VALUE HELPERS
// ============================================================================

/// `start, start + step, ..., end`
pub fn stepped(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step).round() as usize;
    (0..=count).map(|i| start + i as f64 * step).collect()
}

/// The allowed value closest to `target`; the earliest one wins ties.
pub fn nearest_allowed(allowed: &[f64], target: f64, default: f64) -> f64 {
    let Some(&first) = allowed.first() else {
        return default;
    };
    let mut best = first;
    let mut best_delta = (first - target).abs();
    for &v in allowed {
        let delta = (v - target).abs();
        if delta < best_delta {
            best = v;
            best_delta = delta;
        }
    }
    best
}

/// Numbers pass through; strings keep only digits and dots, then parse.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Coerce and snap to the nearest allowed value, or `default` if unparsable.
pub fn clamp_to_allowed(value: &Value, allowed: &[f64], default: f64) -> f64 {
    match coerce_number(value) {
        Some(v) => nearest_allowed(allowed, v, default),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_sets_contain_quadrant_targets() {
        let profile = NormalizerProfile::default();
        for quadrant in Quadrant::ALL {
            let target = profile.target_for(quadrant);
            assert!(profile.temperatures.contains(&target.temperature));
            assert!(profile.humidities.contains(&target.humidity));
        }
        assert_eq!(profile.temperatures.len(), 21);
        assert_eq!(profile.humidities.len(), 17);
        assert!(profile.brightness.contains(&profile.default_brightness));
    }

    #[test]
    fn test_nearest_allowed() {
        let ints = stepped(20.0, 30.0, 1.0);
        assert_eq!(nearest_allowed(&ints, 23.9, 21.0), 24.0);
        assert_eq!(nearest_allowed(&ints, 99.0, 21.0), 30.0);
        assert_eq!(nearest_allowed(&[], 23.9, 21.0), 21.0);
    }

    #[test]
    fn test_nearest_allowed_tie_goes_to_first() {
        assert_eq!(nearest_allowed(&[20.0, 21.0], 20.5, 0.0), 20.0);
        assert_eq!(nearest_allowed(&[21.0, 20.0], 20.5, 0.0), 21.0);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(24)), Some(24.0));
        assert_eq!(coerce_number(&json!("23.5°C")), Some(23.5));
        assert_eq!(coerce_number(&json!("about 55 %")), Some(55.0));
        assert_eq!(coerce_number(&json!("warm")), None);
        assert_eq!(coerce_number(&json!("1.2.3")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn test_clamp_to_allowed() {
        let profile = NormalizerProfile::default();
        assert_eq!(clamp_to_allowed(&json!(23.9), &profile.temperatures, 24.0), 24.0);
        assert_eq!(clamp_to_allowed(&json!(18), &profile.temperatures, 24.0), 20.0);
        assert_eq!(clamp_to_allowed(&json!("hot"), &profile.temperatures, 24.0), 24.0);
        assert_eq!(clamp_to_allowed(&json!(51.0), &profile.humidities, 50.0), 50.0);
    }

    #[test]
    fn test_range_apply() {
        let temps = NormalizerProfile::default().temperatures;
        assert_eq!(Range::at_least(25.0).apply(22.0, &temps), 25.0);
        assert_eq!(Range::at_least(25.0).apply(27.0, &temps), 27.0);
        assert_eq!(Range::at_most(20.0).apply(26.0, &temps), 20.0);
        assert_eq!(Range::exactly(21.0).apply(26.0, &temps), 21.0);
        assert_eq!(Range::exactly(21.0).apply(20.0, &temps), 21.0);
    }

    #[test]
    fn test_range_snaps_ideal() {
        let humids = NormalizerProfile::default().humidities;
        // 43 snaps to 42.5, 52 to 52.5
        assert_eq!(Range::at_most(43.0).apply(60.0, &humids), 42.5);
        assert_eq!(Range::at_least(52.0).apply(30.0, &humids), 52.5);
    }

    #[test]
    fn test_kelvin_clamp() {
        let kelvin = KelvinRange::default();
        assert_eq!(kelvin.clamp(1800.0), 2200.0);
        assert_eq!(kelvin.clamp(9000.0), 6500.0);
        assert_eq!(kelvin.clamp(2700.4), 2700.0);
    }

    #[test]
    fn test_yaml_override_keeps_other_defaults() {
        let profile = NormalizerProfile::from_yaml(
            "default_brightness: 50\ncues:\n  cold:\n    temperature: { min: 24 }\n",
        )
        .unwrap();
        let builtin = CueTargets::default();
        assert_eq!(profile.default_brightness, 50.0);
        assert_eq!(profile.cues.cold.temperature, Some(Range::at_least(24.0)));
        assert_eq!(profile.cues.cold.humidity, Some(Range::at_least(52.0)));
        assert_eq!(profile.cues.cold.brightness, builtin.cold.brightness);
        assert_eq!(profile.cues.cold.lighting, builtin.cold.lighting);
        assert_eq!(profile.cues.hot, builtin.hot);
        assert_eq!(profile.temperatures, NormalizerProfile::default().temperatures);
    }

    #[test]
    fn test_yaml_partial_quadrant_target() {
        let profile =
            NormalizerProfile::from_yaml("targets:\n  negative_passive: { temperature: 24 }\n")
                .unwrap();
        let target = profile.target_for(Quadrant::NegativePassive);
        assert_eq!(target.temperature, 24.0);
        assert_eq!(target.humidity, 37.5);
        assert_eq!(profile.target_for(Quadrant::Neutral), Quadrant::Neutral.target());
    }

    #[test]
    fn test_yaml_null_bound_clears_it() {
        let profile =
            NormalizerProfile::from_yaml("cues:\n  cold:\n    humidity: null\n").unwrap();
        assert_eq!(profile.cues.cold.humidity, None);
        assert_eq!(profile.cues.cold.temperature, Some(Range::at_least(25.0)));
    }

    #[test]
    fn test_empty_yaml_is_builtin() {
        assert_eq!(NormalizerProfile::from_yaml("").unwrap(), NormalizerProfile::default());
        assert_eq!(NormalizerProfile::from_yaml("{}").unwrap(), NormalizerProfile::default());
    }

    #[test]
    fn test_yaml_parse_error() {
        assert!(NormalizerProfile::from_yaml("temperatures: [oops").is_err());
    }
}
