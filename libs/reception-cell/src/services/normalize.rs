// libs/reception-cell/src/services/normalize.rs
//
// Lexical normalizers: free-form spoken text in, canonical EHR query
// parameters out. All total functions; a value that cannot be parsed falls
// through to the next strategy or a safe default, never an error.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

use crate::models::DateRange;

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").unwrap());
static DAY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:st|nd|rd|th)?").unwrap());
static SHORT_DAY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})(?:st|nd|rd|th)?").unwrap());
static FOUR_DIGIT_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{4})").unwrap());

const MONTHS: [(&str, u32); 23] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const WEEKDAYS: [(&str, u32); 7] = [
    ("monday", 0),
    ("tuesday", 1),
    ("wednesday", 2),
    ("thursday", 3),
    ("friday", 4),
    ("saturday", 5),
    ("sunday", 6),
];

const SOON_TERMS: [&str; 5] = [
    "earliest",
    "next available",
    "first available",
    "soonest",
    "any day",
];

/// Convert a natural-language date to a `DateRange` relative to `today`.
/// Always succeeds; unrecognized input defaults to tomorrow.
pub fn parse_spoken_date(text: &str, today: NaiveDate) -> DateRange {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    // Already MM/DD/YYYY. An invalid calendar date (Feb 30) falls through to
    // the remaining strategies instead of failing.
    if let Some(caps) = NUMERIC_DATE.captures(trimmed) {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return DateRange::single(date);
        }
    }

    // Month name plus a day number ("June 3rd"). A date already past this
    // year rolls to next year.
    if let Some(range) = parse_month_day(trimmed, &lower, today) {
        return range;
    }

    // "Any day soon" terms map to a 30-day forward window.
    if SOON_TERMS.iter().any(|term| lower.contains(term)) {
        return DateRange {
            start: today,
            end: today + Duration::days(30),
        };
    }

    if lower.contains("today") {
        return DateRange::single(today);
    }
    if lower.contains("tomorrow") {
        return DateRange::single(today + Duration::days(1));
    }
    if lower.contains("next week") {
        return DateRange::single(today + Duration::days(7));
    }
    if lower.contains("this week") {
        // Range through the week's Friday; past Friday, the next one.
        let mut until_friday = 4 - today.weekday().num_days_from_monday() as i64;
        if until_friday < 0 {
            until_friday += 7;
        }
        return DateRange {
            start: today,
            end: today + Duration::days(until_friday),
        };
    }

    // Bare day-of-month ("the 28th"): current month if the day has not
    // passed, otherwise next month, rolling December into January.
    if let Some(caps) = DAY_NUMBER.captures(trimmed) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let target = if day >= today.day() {
            NaiveDate::from_ymd_opt(today.year(), today.month(), day)
        } else if today.month() == 12 {
            NaiveDate::from_ymd_opt(today.year() + 1, 1, day)
        } else {
            NaiveDate::from_ymd_opt(today.year(), today.month() + 1, day)
        };
        return DateRange::single(target.unwrap_or(today + Duration::days(1)));
    }

    // Weekday names advance to the next occurrence, never today or earlier.
    for (name, number) in WEEKDAYS {
        if lower.contains(name) {
            let mut ahead = number as i64 - today.weekday().num_days_from_monday() as i64;
            if ahead <= 0 {
                ahead += 7;
            }
            return DateRange::single(today + Duration::days(ahead));
        }
    }

    DateRange::single(today + Duration::days(1))
}

fn parse_month_day(raw: &str, lower: &str, today: NaiveDate) -> Option<DateRange> {
    let (_, month) = MONTHS.iter().find(|(name, _)| lower.contains(name))?;
    let day: u32 = DAY_NUMBER.captures(raw)?[1].parse().ok()?;

    let this_year = NaiveDate::from_ymd_opt(today.year(), *month, day)?;
    let target = if this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, *month, day)?
    } else {
        this_year
    };
    Some(DateRange::single(target))
}

const DIGIT_WORDS: [(&str, char); 10] = [
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
];

/// Normalize a phone number to bare digits. Spelled-out digit words
/// ("two one zero...") are converted first; that path is accepted only when
/// it yields at least 10 digits, otherwise the raw string is stripped of
/// non-digits. No country-code validation.
pub fn normalize_phone(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let lower = raw.to_lowercase();
    if DIGIT_WORDS.iter().any(|(word, _)| lower.contains(word)) {
        let spaced = lower.replace('-', " ");
        let digits: String = spaced
            .split_whitespace()
            .filter_map(|token| {
                DIGIT_WORDS
                    .iter()
                    .find(|(word, _)| *word == token)
                    .map(|(_, digit)| *digit)
            })
            .collect();
        if digits.len() >= 10 {
            return digits;
        }
    }

    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a spoken date of birth to MM/DD/YYYY. When every strategy
/// fails the input is returned unchanged; downstream must tolerate an
/// unparsed string.
pub fn normalize_date_of_birth(raw: &str) -> String {
    let dob = raw.trim();
    if dob.is_empty() {
        return String::new();
    }
    let lower = dob.to_lowercase();

    // Numeric form. A leading component over 12 can only be a day, so
    // "24/10/2000" resolves day-first; anything else is taken as MM/DD.
    if let Some(caps) = NUMERIC_DATE.captures(dob) {
        let first: u32 = caps[1].parse().unwrap_or(0);
        let second: u32 = caps[2].parse().unwrap_or(0);
        let year = &caps[3];
        if first > 12 && second <= 12 {
            return format!("{:02}/{:02}/{}", second, first, year);
        }
        return format!("{:02}/{:02}/{}", first, second, year);
    }

    // Textual month form ("October 24, 2000" / "24th October 2000").
    if let Some(year) = FOUR_DIGIT_YEAR.captures(dob) {
        if let Some((_, month)) = MONTHS.iter().find(|(name, _)| lower.contains(name)) {
            if let Some(day) = SHORT_DAY_NUMBER.captures(dob) {
                return format!("{:02}/{:0>2}/{}", month, &day[1], &year[1]);
            }
        }
    }

    // Fixed-format fallback for the common remaining shapes.
    for format in ["%Y-%m-%d", "%B %d, %Y", "%B %d %Y", "%d %B %Y", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(dob, format) {
            return date.format("%m/%d/%Y").to_string();
        }
    }

    raw.to_string()
}

/// Split a full name on whitespace: first token is the first name, the rest
/// join as the last name. Single-token names have an empty last name.
pub fn split_patient_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn canonical_date_passes_through() {
        let range = parse_spoken_date("06/23/2025", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "06/23/2025");
        assert_eq!(range.end_mdy(), "06/23/2025");
    }

    #[test]
    fn canonical_parse_is_idempotent() {
        let today = day(2025, 6, 20);
        let first = parse_spoken_date("11/05/2025", today);
        let second = parse_spoken_date(&first.start_mdy(), today);
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_calendar_date_falls_through() {
        // Feb 30 is not a date; the leading "02" is then read as a bare
        // day-of-month, which has passed and rolls to next month.
        let range = parse_spoken_date("02/30/2025", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "07/02/2025");
    }

    #[test]
    fn tomorrow_is_a_single_day_range() {
        let range = parse_spoken_date("tomorrow", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "06/21/2025");
        assert_eq!(range.end_mdy(), "06/21/2025");
    }

    #[test]
    fn earliest_spans_thirty_days() {
        let range = parse_spoken_date("the earliest you have", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "06/20/2025");
        assert_eq!(range.end_mdy(), "07/20/2025");
    }

    #[test]
    fn month_name_past_date_rolls_to_next_year() {
        let range = parse_spoken_date("June 3rd", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "06/03/2026");
    }

    #[test]
    fn month_name_upcoming_date_stays_this_year() {
        let range = parse_spoken_date("October 9th", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "10/09/2025");
    }

    #[test]
    fn this_week_runs_through_friday() {
        // 2025-06-18 is a Wednesday.
        let range = parse_spoken_date("this week", day(2025, 6, 18));
        assert_eq!(range.start_mdy(), "06/18/2025");
        assert_eq!(range.end_mdy(), "06/20/2025");
    }

    #[test]
    fn bare_day_before_today_rolls_to_next_month() {
        let range = parse_spoken_date("the 3rd", day(2025, 12, 20));
        assert_eq!(range.start_mdy(), "01/03/2026");
    }

    #[test]
    fn weekday_never_resolves_to_today() {
        // 2025-06-20 is a Friday; "friday" means the next one.
        let range = parse_spoken_date("friday", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "06/27/2025");
    }

    #[test]
    fn unparseable_defaults_to_tomorrow() {
        let range = parse_spoken_date("whenever works", day(2025, 6, 20));
        assert_eq!(range.start_mdy(), "06/21/2025");
    }

    #[test]
    fn phone_spelled_out_words() {
        assert_eq!(
            normalize_phone("two one zero-seven eight four-eight five five one"),
            "2107848551"
        );
    }

    #[test]
    fn phone_strips_punctuation() {
        assert_eq!(normalize_phone("(555) 123-4567"), "5551234567");
    }

    #[test]
    fn phone_short_input_is_returned_not_rejected() {
        let digits = normalize_phone("555-12");
        assert_eq!(digits, "55512");
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn phone_word_path_requires_ten_digits() {
        // Too few digit words: falls back to stripping, which finds nothing.
        assert_eq!(normalize_phone("five five five"), "");
    }

    #[test]
    fn dob_numeric_passthrough_zero_pads() {
        assert_eq!(normalize_date_of_birth("1/2/1988"), "01/02/1988");
    }

    #[test]
    fn dob_european_day_first() {
        assert_eq!(normalize_date_of_birth("24/10/2000"), "10/24/2000");
    }

    #[test]
    fn dob_textual_month() {
        assert_eq!(normalize_date_of_birth("October 24, 2000"), "10/24/2000");
        assert_eq!(normalize_date_of_birth("24th October 2000"), "10/24/2000");
    }

    #[test]
    fn dob_iso_fallback() {
        assert_eq!(normalize_date_of_birth("2000-10-24"), "10/24/2000");
    }

    #[test]
    fn dob_unparseable_returned_unchanged() {
        assert_eq!(
            normalize_date_of_birth("sometime in the eighties"),
            "sometime in the eighties"
        );
    }

    #[test]
    fn name_splits_first_and_rest() {
        assert_eq!(
            split_patient_name("Maria Garcia Lopez"),
            ("Maria".to_string(), "Garcia Lopez".to_string())
        );
        assert_eq!(split_patient_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_patient_name("  "), (String::new(), String::new()));
    }
}
