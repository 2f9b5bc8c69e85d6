//! # Environment Normalizer
//!
//! Turns a model's free-form JSON answer into a fully populated payload:
//!
//! 1. Climate and brightness fields are filled from the emotion's quadrant
//!    target when absent, and snapped to the nearest allowed value otherwise
//! 2. A missing or unknown music track is replaced by a deterministic pick
//!    from the quadrant's list
//! 3. Lighting resolves to exactly one of RGB or color temperature; when the
//!    model gave neither it is derived from the emotion swatch (negative
//!    emotions get the 180° complement)
//! 4. Comfort cues in the user's prompt (cold, hot, dry, ...) push fields
//!    toward cue-specific targets, in a fixed order, last cue wins
//!
//! Normalization never fails. The only signal is [`Normalized::repaired`],
//! which is true when the output differs from the input.
//!
//! ```rust
//! use moodlight::normalize::Normalizer;
//! use serde_json::json;
//!
//! let normalizer = Normalizer::default();
//! let raw = json!({"emotion": "피로", "hex": "756FB5"});
//! let out = normalizer.normalize_value(&raw, "오늘 하루");
//!
//! assert!(out.repaired);
//! assert_eq!(out.payload["temperature_celsius"], json!(25.5));
//! assert_eq!(out.payload["humidity_percent"], json!(37.5));
//! ```

mod cues;
mod profile;
mod schema;

pub use cues::{ComfortCues, Thermal};
pub use profile::{
    clamp_to_allowed, coerce_number, nearest_allowed, stepped, CueRule, CueTargets, KelvinRange,
    NormalizerProfile, QuadrantTargets, Range,
};
pub use schema::SchemaVariant;

use crate::color::{adjust_rgb, complementary, hex_to_rgb, hsb_for_rgb, hsb_for_white, Rgb};
use crate::emotion::{hex_for, quadrant_of, Quadrant, FALLBACK_EMOTION};
use crate::music::{choose_for, find_track, library, parse_track, Track};
use schema::{
    lookup, number, replace_aliased, HSB_KEYS, HUMIDITY_ALIASES, KELVIN_ALIASES,
    PERCENT_PER_LEVEL, TEMPERATURE_ALIASES,
};
use serde_json::{Map, Value};

const MUSIC_KEYS: &[&str] = &["music", "music_title", "music_artist"];
const BRIGHTNESS_KEYS: &[&str] = &["lighting_brightness", "brightness_level"];

// ============================================================================
// TYPES
// ============================================================================

/// Active lighting representation; exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lighting {
    Rgb(Rgb),
    Temp { kelvin: f64 },
}

impl Lighting {
    pub fn mode(&self) -> &'static str {
        match self {
            Lighting::Rgb(_) => "rgb",
            Lighting::Temp { .. } => "temp",
        }
    }
}

/// Fully resolved environment of one response
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub temperature: f64,
    pub humidity: f64,
    /// Lighting brightness, percent
    pub brightness: f64,
    pub track: Track,
    pub lighting: Lighting,
}

/// Result of normalizing one response
#[derive(Debug, Clone)]
pub struct Normalized {
    pub payload: Value,
    pub repaired: bool,
    pub variant: SchemaVariant,
    pub quadrant: Quadrant,
    /// `None` for the content-filter fallback emotion
    pub environment: Option<Environment>,
}

impl Normalized {
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.payload).unwrap_or_else(|_| self.payload.to_string())
    }
}

// ============================================================================
// NORMALIZER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    profile: NormalizerProfile,
}

impl Normalizer {
    pub fn new(profile: NormalizerProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &NormalizerProfile {
        &self.profile
    }

    /// Allowed value lists handed to the model when asking for a repair
    pub fn allowed_values(&self) -> Value {
        let numbers = |values: &[f64]| Value::Array(values.iter().map(|v| number(*v)).collect());
        serde_json::json!({
            "temperature": numbers(&self.profile.temperatures),
            "humidity": numbers(&self.profile.humidities),
            "brightness": numbers(&self.profile.brightness),
            "music": library().map(ToString::to_string).collect::<Vec<_>>(),
        })
    }

    /// Parse and normalize completion text. `None` if it is not a JSON object.
    pub fn normalize_text(&self, text: &str, user_prompt: &str) -> Option<Normalized> {
        let value: Value = serde_json::from_str(text).ok()?;
        let obj = value.as_object()?;
        Some(self.normalize(obj, user_prompt))
    }

    /// Normalize any JSON value; non-objects are treated as an empty object.
    pub fn normalize_value(&self, value: &Value, user_prompt: &str) -> Normalized {
        match value.as_object() {
            Some(obj) => self.normalize(obj, user_prompt),
            None => self.normalize(&Map::new(), user_prompt),
        }
    }

    pub fn normalize(&self, obj: &Map<String, Value>, user_prompt: &str) -> Normalized {
        let variant = SchemaVariant::detect(obj);
        let mut out = obj.clone();

        let emotion = obj
            .get("emotion")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        fill_hex(&mut out, &emotion);
        let quadrant = quadrant_of(&emotion);

        let environment = if emotion == FALLBACK_EMOTION {
            write_fallback(&mut out, variant);
            None
        } else {
            let env = self.resolve(&out, variant, &emotion, quadrant, user_prompt);
            let env = self.apply_cues(env, &ComfortCues::parse(user_prompt));
            write_environment(&mut out, variant, &env);
            Some(env)
        };

        let repaired = !same_object(&out, obj);
        if repaired {
            tracing::debug!(
                emotion = %emotion,
                quadrant = %quadrant,
                variant = ?variant,
                "Normalizer repaired model response"
            );
        }

        Normalized {
            payload: Value::Object(out),
            repaired,
            variant,
            quadrant,
            environment,
        }
    }

    // ------------------------------------------------------------------------
    // Field resolution
    // ------------------------------------------------------------------------

    fn resolve(
        &self,
        obj: &Map<String, Value>,
        variant: SchemaVariant,
        emotion: &str,
        quadrant: Quadrant,
        user_prompt: &str,
    ) -> Environment {
        let profile = &self.profile;
        let target = profile.target_for(quadrant);

        let temperature = match lookup(obj, TEMPERATURE_ALIASES) {
            Some(v) => clamp_to_allowed(v, &profile.temperatures, target.temperature),
            None => target.temperature,
        };
        let humidity = match lookup(obj, HUMIDITY_ALIASES) {
            Some(v) => clamp_to_allowed(v, &profile.humidities, target.humidity),
            None => target.humidity,
        };

        let track = read_track(obj, variant).unwrap_or_else(|| choose_for(emotion, user_prompt));

        Environment {
            temperature,
            humidity,
            brightness: self.read_brightness(obj),
            track,
            lighting: self.read_lighting(obj, quadrant),
        }
    }

    fn read_brightness(&self, obj: &Map<String, Value>) -> f64 {
        let profile = &self.profile;
        let percent = obj
            .get("lighting_brightness")
            .and_then(coerce_number)
            .or_else(|| {
                obj.get("brightness_level")
                    .and_then(coerce_number)
                    .map(|level| level * PERCENT_PER_LEVEL)
            });
        match percent {
            Some(p) => nearest_allowed(&profile.brightness, p, profile.default_brightness),
            None => profile.default_brightness,
        }
    }

    fn read_lighting(&self, obj: &Map<String, Value>, quadrant: Quadrant) -> Lighting {
        let mode = obj
            .get("lighting_mode")
            .and_then(Value::as_str)
            .map(|m| m.trim().to_ascii_lowercase());
        let rgb = read_rgb(obj);
        let kelvin = lookup(obj, KELVIN_ALIASES)
            .and_then(coerce_number)
            .map(|k| self.profile.kelvin.clamp(k));

        match (mode.as_deref(), rgb, kelvin) {
            (Some("temp"), _, Some(k)) => Lighting::Temp { kelvin: k },
            (_, Some(c), _) => Lighting::Rgb(c),
            (_, None, Some(k)) => Lighting::Temp { kelvin: k },
            _ => self.derive_lighting(obj, quadrant),
        }
    }

    /// Lighting from the emotion swatch: complement for negative quadrants.
    fn derive_lighting(&self, obj: &Map<String, Value>, quadrant: Quadrant) -> Lighting {
        match obj.get("hex").and_then(Value::as_str).and_then(hex_to_rgb) {
            Some(swatch) if quadrant.is_negative() => Lighting::Rgb(complementary(swatch)),
            Some(swatch) => Lighting::Rgb(swatch),
            None => Lighting::Temp {
                kelvin: self.profile.kelvin.default,
            },
        }
    }

    // ------------------------------------------------------------------------
    // Comfort cues
    // ------------------------------------------------------------------------

    fn apply_cues(&self, mut env: Environment, cues: &ComfortCues) -> Environment {
        let rules = &self.profile.cues;

        let thermal = match cues.thermal() {
            Some(Thermal::Cold) => Some(&rules.cold),
            Some(Thermal::Hot) => Some(&rules.hot),
            None => None,
        };
        let comfort = [
            (cues.dry, &rules.dry),
            (cues.humid, &rules.humid),
            (cues.stuffy, &rules.stuffy),
            (cues.bright, &rules.bright),
            (cues.dim, &rules.dim),
            (cues.sleepy, &rules.sleepy),
            (cues.focus, &rules.focus),
        ];

        let active = thermal
            .into_iter()
            .chain(comfort.into_iter().filter(|(on, _)| *on).map(|(_, rule)| rule));
        for rule in active {
            self.apply_rule(&mut env, rule);
        }
        env
    }

    fn apply_rule(&self, env: &mut Environment, rule: &CueRule) {
        let profile = &self.profile;
        if let Some(range) = rule.temperature {
            env.temperature = range.apply(env.temperature, &profile.temperatures);
        }
        if let Some(range) = rule.humidity {
            env.humidity = range.apply(env.humidity, &profile.humidities);
        }
        if let Some(range) = rule.brightness {
            env.brightness = range.apply(env.brightness, &profile.brightness);
        }
        // White light has no hue to shift.
        if let (Some(adjust), Lighting::Rgb(color)) = (rule.lighting, env.lighting) {
            env.lighting = Lighting::Rgb(adjust_rgb(color, &adjust));
        }
    }
}

// ============================================================================
// READ HELPERS
// ============================================================================

fn fill_hex(out: &mut Map<String, Value>, emotion: &str) {
    let missing = match out.get("hex") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if missing {
        if let Some(hex) = hex_for(emotion) {
            out.insert("hex".to_string(), Value::from(hex));
        }
    }
}

/// Equality that treats `24` and `24.0` as the same number
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(x), Value::Object(y)) => same_object(x, y),
        _ => a == b,
    }
}

fn same_object(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.get(k).is_some_and(|other| same_value(v, other)))
}

fn read_track(obj: &Map<String, Value>, variant: SchemaVariant) -> Option<Track> {
    let pair = || {
        let title = obj.get("music_title").and_then(Value::as_str)?;
        let artist = obj.get("music_artist").and_then(Value::as_str)?;
        find_track(title, artist)
    };
    let line = || obj.get("music").and_then(Value::as_str).and_then(parse_track);

    if variant.uses_music_line() {
        line().or_else(pair)
    } else {
        pair().or_else(line)
    }
}

fn read_rgb(obj: &Map<String, Value>) -> Option<Rgb> {
    let r = obj.get("lighting_r").and_then(coerce_number)?;
    let g = obj.get("lighting_g").and_then(coerce_number)?;
    let b = obj.get("lighting_b").and_then(coerce_number)?;
    Some(Rgb::from_f64(r, g, b))
}

// ============================================================================
// WRITE HELPERS
// ============================================================================

fn remove_all(out: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        out.remove(*key);
    }
}

fn write_environment(out: &mut Map<String, Value>, variant: SchemaVariant, env: &Environment) {
    replace_aliased(out, TEMPERATURE_ALIASES, variant.temperature_key(), number(env.temperature));
    replace_aliased(out, HUMIDITY_ALIASES, variant.humidity_key(), number(env.humidity));

    remove_all(out, BRIGHTNESS_KEYS);
    if variant.uses_brightness_level() {
        let level = (env.brightness / PERCENT_PER_LEVEL).round().clamp(1.0, 5.0);
        out.insert("brightness_level".to_string(), number(level));
    } else {
        out.insert("lighting_brightness".to_string(), number(env.brightness));
    }

    remove_all(out, MUSIC_KEYS);
    if variant.uses_music_line() {
        out.insert("music".to_string(), Value::from(env.track.to_string()));
    } else {
        out.insert("music_title".to_string(), Value::from(env.track.title));
        out.insert("music_artist".to_string(), Value::from(env.track.artist));
    }

    let hsb = match env.lighting {
        Lighting::Rgb(color) => {
            out.insert("lighting_r".to_string(), Value::from(color.r));
            out.insert("lighting_g".to_string(), Value::from(color.g));
            out.insert("lighting_b".to_string(), Value::from(color.b));
            replace_aliased(out, KELVIN_ALIASES, variant.kelvin_key(), Value::Null);
            hsb_for_rgb(color, Some(env.brightness))
        }
        Lighting::Temp { kelvin } => {
            for key in ["lighting_r", "lighting_g", "lighting_b"] {
                out.insert(key.to_string(), Value::Null);
            }
            replace_aliased(out, KELVIN_ALIASES, variant.kelvin_key(), number(kelvin));
            hsb_for_white(env.brightness)
        }
    };

    if variant == SchemaVariant::Lighting {
        out.insert("lighting_mode".to_string(), Value::from(env.lighting.mode()));
        out.insert("lighting_hue".to_string(), Value::from(hsb.hue));
        out.insert("lighting_saturation".to_string(), Value::from(hsb.saturation));
        out.insert("lighting_brightness_254".to_string(), Value::from(hsb.brightness));
    }
}

/// Content-filter fallback: every environment field is null.
fn write_fallback(out: &mut Map<String, Value>, variant: SchemaVariant) {
    replace_aliased(out, TEMPERATURE_ALIASES, variant.temperature_key(), Value::Null);
    replace_aliased(out, HUMIDITY_ALIASES, variant.humidity_key(), Value::Null);
    replace_aliased(out, KELVIN_ALIASES, variant.kelvin_key(), Value::Null);

    remove_all(out, MUSIC_KEYS);
    remove_all(out, BRIGHTNESS_KEYS);
    let mut nulls = vec!["lighting_r", "lighting_g", "lighting_b"];
    if variant.uses_music_line() {
        nulls.extend(["music", "brightness_level"]);
    } else {
        nulls.extend(["music_title", "music_artist", "lighting_brightness"]);
    }
    if variant == SchemaVariant::Lighting {
        nulls.push("lighting_mode");
        nulls.extend(HSB_KEYS);
    }
    for key in nulls {
        out.insert(key.to_string(), Value::Null);
    }
}

// ============================================================================
// TESTS
// ============================================================================
