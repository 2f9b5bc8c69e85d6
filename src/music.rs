//! # Music Library
//!
//! The fixed 16-track library grouped by affect quadrant, and the
//! deterministic pick used when a model response carries no valid track.
//!
//! Picks are seeded with [`seed_hash`], a rolling hash (multiplier 31,
//! modulo 2^31 - 1) over UTF-16 code units, so the same emotion and prompt
//! always yield the same track.

use crate::emotion::{quadrant_of, Quadrant};

/// Modulus of the rolling seed hash (2^31 - 1)
const HASH_MODULUS: u64 = 2_147_483_647;

/// Multiplier of the rolling seed hash
const HASH_MULTIPLIER: u64 = 31;

/// A (title, artist) pair from the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Track {
    pub title: &'static str,
    pub artist: &'static str,
}

impl Track {
    const fn new(title: &'static str, artist: &'static str) -> Self {
        Self { title, artist }
    }

    fn matches(&self, title: &str, artist: &str) -> bool {
        self.title.eq_ignore_ascii_case(title.trim()) && self.artist.eq_ignore_ascii_case(artist.trim())
    }
}

/// `"Title - Artist"`, the single-string form used by compact responses
impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

/// Returned whenever no other pick is possible
pub const FALLBACK_TRACK: Track = Track::new("life is", "Scott Buckley");

const POSITIVE_PASSIVE: &[Track] = &[
    Track::new("life is", "Scott Buckley"),
    Track::new("Glow", "Scott Buckley"),
    Track::new("Clean Soul - Calming", "Kevin MacLeod"),
    Track::new("Solace", "Scott Buckley"),
];

const POSITIVE_ACTIVE: &[Track] = &[
    Track::new("happy stroll", "331music"),
    Track::new("Ukulele Dance", "Derek Fiechter & Brandon Fiechter"),
    Track::new("Happy Alley", "Kevin MacLeod"),
    Track::new("sunny side up", "Victor Lundberg"),
];

const NEGATIVE_PASSIVE: &[Track] = &[
    Track::new("solstice", "Scott Buckley"),
    Track::new("Amberlight", "Scott Buckley"),
    Track::new("Borealis", "Scott Buckley"),
    Track::new("A Kind Of Hope", "Scott Buckley"),
];

const NEGATIVE_ACTIVE: &[Track] = &[
    Track::new("New Beginnings", "Tokyo Music Walker"),
    Track::new("the travelling symphony", "Savfk"),
    Track::new("Echoes", "Scott Buckley"),
    Track::new("Shoulders Of Giants", "Scott Buckley"),
];

const NEUTRAL: &[Track] = &[
    Track::new("life is", "Scott Buckley"),
    Track::new("Glow", "Scott Buckley"),
    Track::new("Clean Soul - Calming", "Kevin MacLeod"),
];

/// Candidate list for a quadrant
pub fn tracks_for(quadrant: Quadrant) -> &'static [Track] {
    match quadrant {
        Quadrant::PositiveActive => POSITIVE_ACTIVE,
        Quadrant::PositivePassive => POSITIVE_PASSIVE,
        Quadrant::NegativeActive => NEGATIVE_ACTIVE,
        Quadrant::NegativePassive => NEGATIVE_PASSIVE,
        Quadrant::Neutral => NEUTRAL,
    }
}

/// Every track of the library, once
pub fn library() -> impl Iterator<Item = &'static Track> {
    POSITIVE_PASSIVE
        .iter()
        .chain(POSITIVE_ACTIVE)
        .chain(NEGATIVE_PASSIVE)
        .chain(NEGATIVE_ACTIVE)
}

/// Case-insensitive library lookup by title and artist
pub fn find_track(title: &str, artist: &str) -> Option<Track> {
    library().find(|t| t.matches(title, artist)).copied()
}

/// Resolve a single-string track (`"Title - Artist"` or `"Artist - Title"`).
pub fn parse_track(line: &str) -> Option<Track> {
    let wanted = line.trim().to_lowercase();
    library()
        .find(|t| {
            let forward = format!("{} - {}", t.title, t.artist).to_lowercase();
            let reverse = format!("{} - {}", t.artist, t.title).to_lowercase();
            wanted == forward || wanted == reverse
        })
        .copied()
}

/// Rolling hash over UTF-16 code units: `h = (h * 31 + c) mod (2^31 - 1)`.
pub fn seed_hash(seed: &str) -> u32 {
    let hash = seed.encode_utf16().fold(0u64, |h, unit| {
        (h * HASH_MULTIPLIER + u64::from(unit)) % HASH_MODULUS
    });
    hash as u32
}

/// Pick one candidate by seed; an empty list yields [`FALLBACK_TRACK`].
pub fn choose_from(candidates: &[Track], seed: &str) -> Track {
    if candidates.is_empty() {
        return FALLBACK_TRACK;
    }
    let index = seed_hash(seed) as usize % candidates.len();
    candidates[index]
}

/// Pick from the emotion's quadrant list, seeded with emotion then prompt.
pub fn choose_for(emotion: &str, user_prompt: &str) -> Track {
    let emotion = emotion.trim();
    let seed = format!("{}{}", emotion, user_prompt);
    let pick = choose_from(tracks_for(quadrant_of(emotion)), &seed);

    if find_track(pick.title, pick.artist).is_some() {
        pick
    } else {
        FALLBACK_TRACK
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_hash_vectors() {
        assert_eq!(seed_hash(""), 0);
        assert_eq!(seed_hash("a"), 97);
        assert_eq!(seed_hash("ab"), 97 * 31 + 98);
        // '피' is U+D53C
        assert_eq!(seed_hash("피"), 0xD53C);
    }

    #[test]
    fn test_seed_hash_stays_below_modulus() {
        let long = "오늘 너무 피곤해 ".repeat(200);
        assert!(u64::from(seed_hash(&long)) < HASH_MODULUS);
    }

    #[test]
    fn test_library_has_16_distinct_tracks() {
        let tracks: HashSet<_> = library().collect();
        assert_eq!(tracks.len(), 16);
    }

    #[test]
    fn test_every_quadrant_list_is_in_library() {
        for quadrant in Quadrant::ALL {
            let list = tracks_for(quadrant);
            assert!((3..=4).contains(&list.len()));
            for track in list {
                assert!(find_track(track.title, track.artist).is_some());
            }
        }
    }

    #[test]
    fn test_find_track_ignores_case_and_padding() {
        assert_eq!(
            find_track(" AMBERLIGHT ", "scott buckley"),
            Some(Track::new("Amberlight", "Scott Buckley"))
        );
        assert_eq!(find_track("Amberlight", "Someone Else"), None);
    }

    #[test]
    fn test_parse_track_both_orders() {
        let expected = Some(Track::new("Echoes", "Scott Buckley"));
        assert_eq!(parse_track("Echoes - Scott Buckley"), expected);
        assert_eq!(parse_track("scott buckley - echoes"), expected);
        assert_eq!(
            parse_track("Clean Soul - Calming - Kevin MacLeod"),
            Some(Track::new("Clean Soul - Calming", "Kevin MacLeod"))
        );
        assert_eq!(parse_track("Unknown - Nobody"), None);
    }

    #[test]
    fn test_choose_from_empty_falls_back() {
        assert_eq!(choose_from(&[], "seed"), FALLBACK_TRACK);
    }

    #[test]
    fn test_choose_from_exact_index() {
        // seed_hash("ab") = 3105, 3105 % 4 = 1
        assert_eq!(choose_from(NEGATIVE_PASSIVE, "ab"), NEGATIVE_PASSIVE[1]);
    }

    #[test]
    fn test_choose_for_is_deterministic_and_in_quadrant() {
        let first = choose_for("피로", "오늘 너무 피곤해");
        assert_eq!(choose_for("피로", "오늘 너무 피곤해"), first);
        assert!(NEGATIVE_PASSIVE.contains(&first));
    }

    #[test]
    fn test_choose_for_unknown_emotion_uses_neutral_list() {
        let pick = choose_for("???", "hello");
        assert!(NEUTRAL.contains(&pick));
    }

    #[test]
    fn test_choose_for_spreads_over_list() {
        let picks: HashSet<_> = (0..64)
            .map(|i| choose_for("기쁨", &format!("prompt {}", i)))
            .collect();
        assert!(picks.len() > 1);
    }
}
