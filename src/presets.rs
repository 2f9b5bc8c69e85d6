//! Built-in system prompts

use crate::error::{MoodlightError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub summary: &'static str,
    pub text: &'static str,
}

pub const PRESETS: [Preset; 3] = [
    Preset {
        name: "brain",
        summary: "Four-step pipeline with comfort cues and lighting",
        text: include_str!("../prompts/brain.txt"),
    },
    Preset {
        name: "quadrant",
        summary: "100-emotion table with quadrant climate targets",
        text: include_str!("../prompts/quadrant.txt"),
    },
    Preset {
        name: "lighting",
        summary: "Emotion to color, environment, music and lighting mode",
        text: include_str!("../prompts/lighting.txt"),
    },
];

/// Look up by name (case-insensitive) or 1-based index.
pub fn find(key: &str) -> Result<&'static Preset> {
    let key = key.trim();
    if let Ok(index) = key.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| PRESETS.get(i))
            .ok_or_else(|| MoodlightError::UnknownPreset(key.to_string()));
    }
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(key))
        .ok_or_else(|| MoodlightError::UnknownPreset(key.to_string()))
}
