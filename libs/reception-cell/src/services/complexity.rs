// libs/reception-cell/src/services/complexity.rs
//
// Heuristic scoring of how likely a spoken name was mis-transcribed by the
// speech-to-text layer. The score is a proxy for ASR error risk, not a
// linguistic classifier; a mis-score degrades to "ask for spelling", which
// is the safe direction.

use std::sync::LazyLock;

use regex::Regex;

use crate::services::normalize::split_patient_name;

/// Confidence below this asks the caller to spell their name.
pub const SPELLING_THRESHOLD: i32 = 70;

#[derive(Debug, Clone)]
pub struct NameComplexityAssessment {
    /// 0-100, higher means the transcription is more likely correct.
    pub confidence: i32,
    pub needs_spelling: bool,
    pub cultural_indicators: Vec<String>,
    pub complexity_factors: Vec<&'static str>,
    /// Culturally aware spelling-request phrasing for this name.
    pub suggestion: String,
}

/// Pluggable scoring strategy so the heuristic table can be swapped without
/// touching resolver logic.
pub trait NameComplexityScorer: Send + Sync {
    fn assess(&self, name: &str) -> NameComplexityAssessment;
}

static CONSONANT_CLUSTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[bcdfghjklmnpqrstvwxyz]{3,}").unwrap());

static UNUSUAL_COMBINATIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"nk[aeiou]", r"gb[aeiou]", r"mb[aeiou]",
        r"dh", r"bh", r"kh", r"th[aeiou]",
        r"ñ", r"ç", r"ü", r"é", r"á", r"í", r"ó",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// (culture, penalty, name fragments). Fragments are curated substrings of
/// common given names and surnames; Arabic and Chinese fragments carry no
/// penalty but still select the warmer confirmation phrasing.
const CULTURAL_PATTERNS: [(&str, i32, &[&str]); 5] = [
    (
        "nigerian",
        25,
        &[
            "chukw", "nkem", "nneka", "emeka", "eze", "ogo", "uchi", "obi",
            "adaora", "chioma", "ngozi", "kelechi", "oluchi",
        ],
    ),
    (
        "indian",
        25,
        &[
            "krishna", "venkat", "srinivas", "priya", "lakshmi", "rajesh",
            "suresh", "ramesh", "mukesh", "mahesh", "ganesh",
        ],
    ),
    (
        "spanish",
        15,
        &[
            "josé", "maría", "gonzález", "rodríguez", "hernández", "garcía",
            "martínez", "lópez", "pérez", "sánchez", "jiménez",
        ],
    ),
    (
        "arabic",
        0,
        &[
            "mohammed", "ahmad", "hassan", "hussein", "fatima", "aisha",
            "abdul", "omar", "ali", "ibrahim",
        ],
    ),
    (
        "chinese",
        0,
        &[
            "wang", "li", "zhang", "liu", "chen", "yang", "huang", "zhao",
            "wu", "zhou", "xu", "sun",
        ],
    ),
];

pub struct HeuristicNameScorer;

impl NameComplexityScorer for HeuristicNameScorer {
    fn assess(&self, name: &str) -> NameComplexityAssessment {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return NameComplexityAssessment {
                confidence: 0,
                needs_spelling: true,
                cultural_indicators: Vec::new(),
                complexity_factors: vec!["no_name"],
                suggestion: spelling_request_message(&[], ""),
            };
        }

        let lower = trimmed.to_lowercase();
        let mut confidence: i32 = 100;
        let mut cultural_indicators = Vec::new();
        let mut complexity_factors = Vec::new();

        if trimmed.chars().count() > 15 {
            confidence -= 20;
            complexity_factors.push("long_name");
        }

        // Runs of 3+ consonants are common in African and Eastern European
        // names and a frequent ASR stumbling point.
        if CONSONANT_CLUSTER.is_match(&lower) {
            confidence -= 15;
            complexity_factors.push("consonant_clusters");
        }

        for (culture, penalty, fragments) in CULTURAL_PATTERNS {
            if fragments.iter().any(|fragment| lower.contains(fragment)) {
                cultural_indicators.push(culture.to_string());
                confidence -= penalty;
            }
        }

        if UNUSUAL_COMBINATIONS.iter().any(|pattern| pattern.is_match(&lower)) {
            confidence -= 10;
            complexity_factors.push("unusual_combinations");
        }

        // More than three tokens usually means multiple surnames.
        if trimmed.split_whitespace().count() > 3 {
            confidence -= 10;
            complexity_factors.push("multiple_surnames");
        }

        if trimmed.contains('-') {
            confidence -= 5;
            complexity_factors.push("hyphenated");
        }

        let confidence = confidence.max(0);
        NameComplexityAssessment {
            confidence,
            needs_spelling: confidence < SPELLING_THRESHOLD,
            suggestion: spelling_request_message(&cultural_indicators, trimmed),
            cultural_indicators,
            complexity_factors,
        }
    }
}

/// Culturally sensitive spelling-request phrasing. Selection only affects
/// the wording, never the control flow.
pub fn spelling_request_message(cultural_indicators: &[String], name: &str) -> String {
    let (first_name, _) = split_patient_name(name);
    let has = |culture: &str| cultural_indicators.iter().any(|c| c == culture);

    if has("nigerian") {
        format!(
            "That's a beautiful Nigerian name! I want to make sure I have {} spelled exactly right. Could you spell your first and last name for me?",
            first_name
        )
    } else if has("indian") {
        format!(
            "What a lovely name! I want to make sure I pronounce {} correctly. Could you please spell your full name for me?",
            first_name
        )
    } else if has("spanish") {
        format!(
            "That's a beautiful name! I want to make sure I have all the accents and spelling correct for {}. Could you spell it out for me?",
            first_name
        )
    } else if has("arabic") {
        format!(
            "That's a wonderful name! I want to make sure I have {} spelled perfectly. Could you spell your first and last name for me?",
            first_name
        )
    } else if has("chinese") {
        format!(
            "Thank you! I want to make sure I have the correct spelling for {}. Could you spell your full name for me?",
            first_name
        )
    } else {
        format!(
            "I want to make sure I have your name exactly right, {}. Could you spell your first and last name for me?",
            first_name
        )
    }
}

/// Soundex-style phonetic key: consonants map to digits, vowels drop,
/// duplicate digits collapse, padded to four characters. Advisory only; no
/// phonetic database lookup is wired up today.
pub fn soundex(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let Some(first_letter) = cleaned.chars().next() else {
        return String::new();
    };

    let mapped: String = cleaned
        .chars()
        .map(|c| match c {
            'B' | 'F' | 'P' | 'V' => '1',
            'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
            'D' | 'T' => '3',
            'L' => '4',
            'M' | 'N' => '5',
            'R' => '6',
            other => other,
        })
        .collect();

    let mut collapsed = String::new();
    for ch in mapped.chars() {
        if "AEIOUY".contains(ch) {
            continue;
        }
        if ch.is_ascii_digit() && collapsed.ends_with(ch) {
            continue;
        }
        collapsed.push(ch);
    }

    let mut code = String::new();
    code.push(first_letter);
    code.extend(collapsed.chars().skip(1).take(3));
    while code.chars().count() < 4 {
        code.push('0');
    }
    code
}
