//! Response schema variants
//!
//! Prompt presets have produced three JSON shapes over time. They carry the
//! same information under different key names, so the normalizer reads
//! through alias lists and writes back with the detected variant's names.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const TEMPERATURE_ALIASES: &[&str] = &["temperature_celsius", "temperature_c", "tempC"];
pub const HUMIDITY_ALIASES: &[&str] = &["humidity_percent", "humidity_pct", "humidity"];
pub const KELVIN_ALIASES: &[&str] = &["lighting_color_temp", "lighting_temp_k", "lighting_kelvin"];
pub const HSB_KEYS: &[&str] = &["lighting_hue", "lighting_saturation", "lighting_brightness_254"];

/// Keys whose presence marks the lighting-mode schema
const LIGHTING_MARKERS: &[&str] = &[
    "lighting_mode",
    "lighting_color_temp",
    "lighting_hue",
    "lighting_saturation",
    "lighting_brightness_254",
];

/// Keys whose presence marks the compact schema
const COMPACT_MARKERS: &[&str] = &["temperature_c", "humidity_pct", "brightness_level", "music"];

/// Brightness percent per compact `brightness_level` step
pub const PERCENT_PER_LEVEL: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// `temperature_celsius`, `music_title`/`music_artist`, `lighting_temp_k`
    Quadrant,
    /// Quadrant keys plus `lighting_mode`, `lighting_color_temp` and HSB fields
    Lighting,
    /// `temperature_c`, `humidity_pct`, `brightness_level`, single `music` string
    Compact,
}

impl SchemaVariant {
    /// Detect the variant from the keys present. Lighting markers win over
    /// compact ones; anything else is the quadrant schema.
    pub fn detect(obj: &Map<String, Value>) -> Self {
        if LIGHTING_MARKERS.iter().any(|k| obj.contains_key(*k)) {
            SchemaVariant::Lighting
        } else if COMPACT_MARKERS.iter().any(|k| obj.contains_key(*k)) {
            SchemaVariant::Compact
        } else {
            SchemaVariant::Quadrant
        }
    }

    /// Variant a system prompt asks for, judged by the marker keys it names.
    /// Keys only count as whole words, so `temperature_celsius` does not
    /// mark the compact schema. The bare word `music` is ignored here.
    pub fn detect_from_text(text: &str) -> Self {
        let words: HashSet<&str> = text
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .collect();

        if LIGHTING_MARKERS.iter().any(|k| words.contains(k)) {
            SchemaVariant::Lighting
        } else if COMPACT_MARKERS
            .iter()
            .filter(|k| **k != "music")
            .any(|k| words.contains(k))
        {
            SchemaVariant::Compact
        } else {
            SchemaVariant::Quadrant
        }
    }

    pub fn temperature_key(self) -> &'static str {
        match self {
            SchemaVariant::Compact => "temperature_c",
            _ => "temperature_celsius",
        }
    }

    pub fn humidity_key(self) -> &'static str {
        match self {
            SchemaVariant::Compact => "humidity_pct",
            _ => "humidity_percent",
        }
    }

    pub fn kelvin_key(self) -> &'static str {
        match self {
            SchemaVariant::Quadrant => "lighting_temp_k",
            SchemaVariant::Lighting => "lighting_color_temp",
            SchemaVariant::Compact => "lighting_kelvin",
        }
    }

    /// Compact responses carry brightness as a 1-5 level
    pub fn uses_brightness_level(self) -> bool {
        self == SchemaVariant::Compact
    }

    /// Compact responses carry music as one `"Title - Artist"` string
    pub fn uses_music_line(self) -> bool {
        self == SchemaVariant::Compact
    }

    /// Keys the repair request asks the model to produce
    pub fn repair_keys(self) -> Vec<&'static str> {
        let mut keys = vec!["emotion", "hex", self.temperature_key(), self.humidity_key()];
        if self.uses_music_line() {
            keys.extend(["music", "brightness_level"]);
        } else {
            keys.extend(["music_title", "music_artist", "lighting_brightness"]);
        }
        keys.extend(["lighting_r", "lighting_g", "lighting_b", self.kelvin_key()]);
        if self == SchemaVariant::Lighting {
            keys.push("lighting_mode");
            keys.extend(HSB_KEYS);
        }
        keys.push("similarity_reason");
        keys
    }
}

/// First alias present in the object (a present `null` counts)
pub fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|k| obj.get(*k))
}

/// Remove every alias, then insert under `key`.
pub fn replace_aliased(obj: &mut Map<String, Value>, aliases: &[&str], key: &str, value: Value) {
    for alias in aliases {
        obj.remove(*alias);
    }
    obj.insert(key.to_string(), value);
}

/// JSON number, written as an integer when it has no fractional part
pub fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
