//! # Emotion Vocabulary and Affect Quadrants
//!
//! The closed 100-label emotion vocabulary, each label paired with its fixed
//! swatch color, and the static classification of labels into the four
//! affect quadrants (positive/negative × active/passive).
//!
//! Classification is a fixed table lookup. Lists are checked in declaration
//! order and the first match wins; labels in no list fall back to
//! [`Quadrant::Neutral`].
//!
//! ```rust
//! use moodlight::emotion::{hex_for, quadrant_of, Quadrant};
//!
//! assert_eq!(hex_for("피로"), Some("756FB5"));
//! assert_eq!(quadrant_of("피로"), Quadrant::NegativePassive);
//! assert_eq!(quadrant_of("unknown"), Quadrant::Neutral);
//! ```

use serde::{Deserialize, Serialize};

/// Label used by the content filter; environment fields are nulled for it.
pub const FALLBACK_EMOTION: &str = "무색";

// ============================================================================
// VOCABULARY
// ============================================================================

/// One label of the vocabulary and its paired swatch (six hex digits, no `#`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emotion {
    pub label: &'static str,
    pub hex: &'static str,
}

impl Emotion {
    const fn new(label: &'static str, hex: &'static str) -> Self {
        Self { label, hex }
    }
}

/// The vocabulary in its canonical order.
///
/// `무심함` appears twice with different swatches; lookups return the first.
pub const EMOTIONS: [Emotion; 100] = [
    Emotion::new("충격", "F06725"),
    Emotion::new("놀라움", "F78D4D"),
    Emotion::new("당혹", "FBA87A"),
    Emotion::new("분노", "F0282E"),
    Emotion::new("짜증", "F6694F"),
    Emotion::new("경계", "DB595B"),
    Emotion::new("긴장", "EA8C86"),
    Emotion::new("흥분", "D26680"),
    Emotion::new("설렘", "E6B1B9"),
    Emotion::new("고독", "7C51A2"),
    Emotion::new("두려움", "9474B5"),
    Emotion::new("번아웃", "524EA2"),
    Emotion::new("피로", "756FB5"),
    Emotion::new("실망", "4467B8"),
    Emotion::new("후회", "99A5D3"),
    Emotion::new("무력", "CAD0EA"),
    Emotion::new("갈증", "1D9C9D"),
    Emotion::new("공허", "C8E0E0"),
    Emotion::new("활력", "1FC67A"),
    Emotion::new("만족", "8CC63E"),
    Emotion::new("느긋", "D0E1B0"),
    Emotion::new("평온", "D4E25B"),
    Emotion::new("편안", "DDE68B"),
    Emotion::new("심심함", "F2F6D5"),
    Emotion::new("흥미", "FECD4F"),
    Emotion::new("감격", "FFE089"),
    Emotion::new("기쁨", "FFF652"),
    Emotion::new("기대", "FCFAAD"),
    Emotion::new("안정감", "B7D8C8"),
    Emotion::new("수줍음", "EAC8D5"),
    Emotion::new("애틋함", "E3B7C8"),
    Emotion::new("향수", "F1D9C9"),
    Emotion::new("체념", "C4C4D3"),
    Emotion::new("서늘함", "C7D3E6"),
    Emotion::new("아득함", "DEDFF2"),
    Emotion::new("해갈감", "A9D8D1"),
    Emotion::new("몰입", "8BB5C3"),
    Emotion::new("집중", "7EA3B2"),
    Emotion::new("충만함", "D8E6C2"),
    Emotion::new("회복", "9EC9A3"),
    Emotion::new("위안", "D9EBD1"),
    Emotion::new("자각", "B5CBE0"),
    Emotion::new("고요함", "E4E9ED"),
    Emotion::new("침착함", "C5D2D8"),
    Emotion::new("균형감", "BFD7D1"),
    Emotion::new("흐릿함", "E8E6F1"),
    Emotion::new("도취", "E9C4B8"),
    Emotion::new("영감", "F2E1C7"),
    Emotion::new("호기심", "F5E2B0"),
    Emotion::new("상쾌함", "C7E8DD"),
    Emotion::new("온화함", "F4E6D5"),
    Emotion::new("차분함", "DED9C9"),
    Emotion::new("무심함", "D9D6CF"),
    Emotion::new("감상", "A8A6C9"),
    Emotion::new("진정", "9CB7C9"),
    Emotion::new("음울", "8C8CA3"),
    Emotion::new("갈망", "DDB0C4"),
    Emotion::new("회피", "C0BBD1"),
    Emotion::new("포용", "E3D0E3"),
    Emotion::new("충족감", "E5E8C3"),
    Emotion::new("여유", "E0E6D3"),
    Emotion::new("기대감", "F9EDC2"),
    Emotion::new("꿈결", "DED7F0"),
    Emotion::new("몽환", "CFBCE0"),
    Emotion::new("무기력", "E3E3E3"),
    Emotion::new("흐트러짐", "C8C8CC"),
    Emotion::new("무심함", "B4BABD"),
    Emotion::new("산뜻함", "D7E9C8"),
    Emotion::new("뿌듯함", "E7F0C9"),
    Emotion::new("편애", "F0ECD4"),
    Emotion::new("감미로움", "F2D7E3"),
    Emotion::new("기력회복", "B7D6A3"),
    Emotion::new("포근함", "F1E5E4"),
    Emotion::new("희미함", "E6E0E2"),
    Emotion::new("가라앉음", "B8C0C8"),
    Emotion::new("소진", "C1BAD0"),
    Emotion::new("억눌림", "A99EB5"),
    Emotion::new("허무", "D5D9E0"),
    Emotion::new("무색", "CECED0"),
    Emotion::new("미온", "EDE2DA"),
    Emotion::new("관조", "BDCED3"),
    Emotion::new("평정심", "D4E0E1"),
    Emotion::new("해소", "B9DACC"),
    Emotion::new("청량", "E0F2EB"),
    Emotion::new("편유", "F5F3D8"),
    Emotion::new("조용함", "E4E8E9"),
    Emotion::new("온기", "F2E9D5"),
    Emotion::new("담담", "F1EFEA"),
    Emotion::new("완화", "B7C9B6"),
    Emotion::new("설원감", "E8EEF5"),
    Emotion::new("은은함", "F6F6EE"),
    Emotion::new("명료", "A8C4D4"),
    Emotion::new("맑음", "DDEFF7"),
    Emotion::new("회한", "D4C7D8"),
    Emotion::new("실소", "E3C9BB"),
    Emotion::new("경쾌", "F7EBAC"),
    Emotion::new("발돋움", "C7D9AF"),
    Emotion::new("잔잔함", "E2E7DB"),
    Emotion::new("포커스", "A7B5C1"),
    Emotion::new("자기확신", "C0D8A8"),
];

/// Swatch for a label, first occurrence wins
pub fn hex_for(label: &str) -> Option<&'static str> {
    let label = label.trim();
    EMOTIONS.iter().find(|e| e.label == label).map(|e| e.hex)
}

// ============================================================================
// QUADRANTS
// ============================================================================

/// Affect quadrant of an emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    PositiveActive,
    PositivePassive,
    NegativeActive,
    NegativePassive,
    /// Ambiguous or unclassified labels
    Neutral,
}

impl Quadrant {
    pub const ALL: [Quadrant; 5] = [
        Quadrant::PositiveActive,
        Quadrant::PositivePassive,
        Quadrant::NegativeActive,
        Quadrant::NegativePassive,
        Quadrant::Neutral,
    ];

    pub fn is_negative(self) -> bool {
        matches!(self, Quadrant::NegativeActive | Quadrant::NegativePassive)
    }

    /// Korean name used in the system prompts
    pub fn label(self) -> &'static str {
        match self {
            Quadrant::PositiveActive => "긍정-능동",
            Quadrant::PositivePassive => "긍정-수동",
            Quadrant::NegativeActive => "부정-능동",
            Quadrant::NegativePassive => "부정-수동",
            Quadrant::Neutral => "기본",
        }
    }

    /// Fixed (temperature °C, humidity %) target of the quadrant
    pub fn target(self) -> EnvironmentTarget {
        match self {
            Quadrant::PositiveActive => EnvironmentTarget::new(22.5, 57.5),
            Quadrant::PositivePassive => EnvironmentTarget::new(26.0, 57.5),
            Quadrant::NegativeActive => EnvironmentTarget::new(21.0, 37.5),
            Quadrant::NegativePassive => EnvironmentTarget::new(25.5, 37.5),
            Quadrant::Neutral => EnvironmentTarget::new(24.0, 50.0),
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Climate target for a quadrant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentTarget {
    pub temperature: f64,
    pub humidity: f64,
}

impl EnvironmentTarget {
    pub const fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

const POSITIVE_ACTIVE: &[&str] = &[
    "놀라움", "흥분", "설렘", "활력", "만족", "흥미", "감격", "기쁨", "기대", "몰입", "집중",
    "도취", "영감", "호기심", "상쾌함", "충족감", "기대감", "산뜻함", "뿌듯함", "기력회복",
    "청량", "명료", "맑음", "경쾌", "발돋움", "포커스", "자기확신",
];

const POSITIVE_PASSIVE: &[&str] = &[
    "느긋", "평온", "편안", "안정감", "애틋함", "해갈감", "충만함", "회복", "위안", "고요함",
    "침착함", "온화함", "차분함", "진정", "포용", "여유", "꿈결", "몽환", "편애", "감미로움",
    "포근함", "해소", "편유", "조용함", "온기", "담담", "완화", "은은함", "잔잔함",
];

const NEGATIVE_ACTIVE: &[&str] = &[
    "충격", "당혹", "분노", "짜증", "경계", "긴장", "갈증", "갈망", "실소",
];

const NEGATIVE_PASSIVE: &[&str] = &[
    "고독", "두려움", "번아웃", "피로", "실망", "후회", "무력", "공허", "심심함", "수줍음",
    "향수", "체념", "서늘함", "흐릿함", "무심함", "음울", "회피", "무기력", "흐트러짐",
    "희미함", "가라앉음", "소진", "억눌림", "허무", "회한",
];

/// Membership lists in lookup order
const QUADRANT_LISTS: [(Quadrant, &[&str]); 4] = [
    (Quadrant::PositiveActive, POSITIVE_ACTIVE),
    (Quadrant::PositivePassive, POSITIVE_PASSIVE),
    (Quadrant::NegativeActive, NEGATIVE_ACTIVE),
    (Quadrant::NegativePassive, NEGATIVE_PASSIVE),
];

/// Quadrant of a label; anything unlisted (including unknown labels) is neutral.
pub fn quadrant_of(label: &str) -> Quadrant {
    let label = label.trim();
    QUADRANT_LISTS
        .iter()
        .find(|(_, members)| members.contains(&label))
        .map(|(quadrant, _)| *quadrant)
        .unwrap_or(Quadrant::Neutral)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_has_100_entries_with_valid_hex() {
        assert_eq!(EMOTIONS.len(), 100);
        for emotion in EMOTIONS {
            assert_eq!(emotion.hex.len(), 6, "{}", emotion.label);
            assert!(
                crate::color::hex_to_rgb(emotion.hex).is_some(),
                "{}",
                emotion.label
            );
        }
    }

    #[test]
    fn test_duplicate_label_uses_first_hex() {
        assert_eq!(hex_for("무심함"), Some("D9D6CF"));
    }

    #[test]
    fn test_fallback_pair() {
        assert_eq!(hex_for(FALLBACK_EMOTION), Some("CECED0"));
        assert_eq!(quadrant_of(FALLBACK_EMOTION), Quadrant::Neutral);
    }

    #[test]
    fn test_every_listed_label_is_in_vocabulary() {
        for (_, members) in QUADRANT_LISTS {
            for label in members {
                assert!(hex_for(label).is_some(), "{} is not in the vocabulary", label);
            }
        }
    }

    #[test]
    fn test_no_label_in_two_lists() {
        let mut seen = HashSet::new();
        for (_, members) in QUADRANT_LISTS {
            for label in members {
                assert!(seen.insert(*label), "{} listed twice", label);
            }
        }
    }

    #[test]
    fn test_lookup_is_deterministic() {
        for emotion in EMOTIONS {
            let first = quadrant_of(emotion.label);
            assert_eq!(quadrant_of(emotion.label), first);
            assert!(Quadrant::ALL.contains(&first));
        }
    }

    #[test]
    fn test_known_quadrants() {
        assert_eq!(quadrant_of("기쁨"), Quadrant::PositiveActive);
        assert_eq!(quadrant_of("평온"), Quadrant::PositivePassive);
        assert_eq!(quadrant_of("분노"), Quadrant::NegativeActive);
        assert_eq!(quadrant_of(" 피로 "), Quadrant::NegativePassive);
        assert_eq!(quadrant_of("균형감"), Quadrant::Neutral);
    }

    #[test]
    fn test_targets() {
        assert_eq!(
            Quadrant::PositiveActive.target(),
            EnvironmentTarget::new(22.5, 57.5)
        );
        assert_eq!(
            Quadrant::NegativePassive.target(),
            EnvironmentTarget::new(25.5, 37.5)
        );
        assert_eq!(Quadrant::Neutral.target(), EnvironmentTarget::new(24.0, 50.0));
    }

    #[test]
    fn test_negativity() {
        assert!(quadrant_of("짜증").is_negative());
        assert!(quadrant_of("무기력").is_negative());
        assert!(!quadrant_of("기쁨").is_negative());
        assert!(!quadrant_of("").is_negative());
    }
}
