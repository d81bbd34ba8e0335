// libs/reception-cell/src/services/compose.rs
//
// Message templating for text-to-speech playback. Pure and deterministic:
// identical inputs always produce the identical string.

use crate::services::normalize::split_patient_name;

/// Tone tag selecting the opener for a personalized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Confirmation,
    Success,
    Clarification,
    Default,
}

/// Open `body` with the caller's first name in a tone-appropriate phrasing.
/// Falls back to an impersonal variant when no name is known.
pub fn personalize(patient_name: Option<&str>, body: &str, tone: Tone) -> String {
    let first_name = patient_name
        .map(|name| split_patient_name(name).0)
        .unwrap_or_default();

    match (tone, first_name.is_empty()) {
        (Tone::Confirmation | Tone::Default, false) => format!("{}, {}", first_name, body),
        (Tone::Confirmation | Tone::Default, true) => body.to_string(),
        (Tone::Success, false) => format!("Great {}, {}", first_name, body),
        (Tone::Success, true) => format!("Great, {}", body),
        (Tone::Clarification, false) => format!("Alright {}, {}", first_name, body),
        (Tone::Clarification, true) => format!("Alright, {}", body),
    }
}

/// Culture-specific affirmation after a caller spells out their name. With no
/// recognized indicator the generic thank-you applies.
pub fn cultural_confirmation(name: &str, cultural_indicators: &[String]) -> String {
    let (first_name, _) = split_patient_name(name);
    let has = |culture: &str| cultural_indicators.iter().any(|c| c == culture);

    if has("nigerian") {
        format!(
            "Perfect! So that's {} - what a beautiful Nigerian name, {}!",
            name, first_name
        )
    } else if has("indian") {
        format!("Wonderful! I have {} - that's a lovely name, {}!", name, first_name)
    } else if has("spanish") {
        format!("Excellent! So that's {} - such a beautiful name, {}!", name, first_name)
    } else if has("arabic") {
        format!("Thank you! I have {} - that's a wonderful name, {}!", name, first_name)
    } else if has("chinese") {
        format!(
            "Perfect! So that's {} - thank you for the spelling, {}!",
            name, first_name
        )
    } else {
        format!(
            "Great! I have {} - thank you for spelling that out, {}!",
            name, first_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tones_pick_fixed_openers() {
        let body = "your appointment is booked.";
        assert_eq!(
            personalize(Some("Gboyega Ofi"), body, Tone::Success),
            "Great Gboyega, your appointment is booked."
        );
        assert_eq!(
            personalize(Some("Gboyega Ofi"), body, Tone::Clarification),
            "Alright Gboyega, your appointment is booked."
        );
        assert_eq!(
            personalize(Some("Gboyega Ofi"), body, Tone::Confirmation),
            "Gboyega, your appointment is booked."
        );
    }

    #[test]
    fn missing_name_falls_back_to_impersonal() {
        assert_eq!(personalize(None, "let me check.", Tone::Success), "Great, let me check.");
        assert_eq!(personalize(Some("  "), "let me check.", Tone::Default), "let me check.");
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = personalize(Some("Maria Garcia"), "one moment.", Tone::Clarification);
        let b = personalize(Some("Maria Garcia"), "one moment.", Tone::Clarification);
        assert_eq!(a, b);
    }

    #[test]
    fn cultural_confirmation_selects_by_indicator() {
        let message = cultural_confirmation("Gboyega Ofi", &["nigerian".to_string()]);
        assert!(message.contains("Nigerian"));
        assert!(message.contains("Gboyega Ofi"));

        let generic = cultural_confirmation("John Smith", &[]);
        assert!(generic.contains("thank you for spelling that out"));
    }
}
