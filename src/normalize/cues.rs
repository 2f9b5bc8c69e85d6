//! Comfort cue detection
//!
//! Keyword patterns (Korean and English) matched against the lowercased
//! user prompt. Each cue is an independent boolean.

use once_cell::sync::Lazy;
use regex::Regex;

static COLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(추워|춥|cold|chilly|freez|한기|시려)").unwrap());
static HOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(더워|덥|hot|heat|뜨거|무더)").unwrap());
static DRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(건조|dry|dehydrated|static)").unwrap());
static HUMID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(습해|습함|끈적|sticky|humid|muggy)").unwrap());
static STUFFY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(답답|stuffy|stifling|환기|airless)").unwrap());
static BRIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(눈부셔|밝아|too bright|glare)").unwrap());
static DIM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(어두워|dim|dark)").unwrap());
static SLEEPY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(졸려|sleepy|drowsy|피곤|나른)").unwrap());
static FOCUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(집중|focus|study|work)").unwrap());

/// Thermal reading of a prompt; cold is checked first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thermal {
    Cold,
    Hot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComfortCues {
    pub cold: bool,
    pub hot: bool,
    pub dry: bool,
    pub humid: bool,
    pub stuffy: bool,
    pub bright: bool,
    pub dim: bool,
    pub sleepy: bool,
    pub focus: bool,
}

impl ComfortCues {
    pub fn parse(text: &str) -> Self {
        let t = text.to_lowercase();
        Self {
            cold: COLD.is_match(&t),
            hot: HOT.is_match(&t),
            dry: DRY.is_match(&t),
            humid: HUMID.is_match(&t),
            stuffy: STUFFY.is_match(&t),
            bright: BRIGHT.is_match(&t),
            dim: DIM.is_match(&t),
            sleepy: SLEEPY.is_match(&t),
            focus: FOCUS.is_match(&t),
        }
    }

    pub fn thermal(&self) -> Option<Thermal> {
        if self.cold {
            Some(Thermal::Cold)
        } else if self.hot {
            Some(Thermal::Hot)
        } else {
            None
        }
    }
}
