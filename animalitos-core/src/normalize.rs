//! Record normalizer — one raw scraped row in, one validated record or a
//! rejection reason out.
//!
//! Pure function over its inputs (the wall-clock `processed_at` stamp is
//! injected by the caller), no I/O. Rules apply in order and the first
//! failure wins:
//!
//! 1. date parses under an accepted format → else `BadDate`
//! 2. time parses 12h/24h; missing defaults to 00:00:00 (flagged, not rejected)
//! 3. number in the fixed 0/00–36 domain → else `BadNumber`
//! 4. animal in the fixed label set after folding → else `UnknownAnimal`
//! 5. number↔animal cross-check against the table, per `MismatchPolicy`

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::warn;

use crate::animals::{animal_for_number, fold_label, is_valid_animal};
use crate::config::MismatchPolicy;
use crate::record::{CanonicalRecord, RawRow, RejectionReason, SOURCE_ID};

/// Spanish month names, index 0 = enero.
const SPANISH_MONTHS: &[&str] = &[
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Stateless normalizer carrying the mismatch policy.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    policy: MismatchPolicy,
}

impl Normalizer {
    pub fn new(policy: MismatchPolicy) -> Self {
        Self { policy }
    }

    /// Normalize one raw row. `processed_at` is stamped on the record.
    pub fn normalize(
        &self,
        raw: &RawRow,
        processed_at: NaiveDateTime,
    ) -> Result<CanonicalRecord, RejectionReason> {
        let date = parse_date(&raw.date).ok_or(RejectionReason::BadDate)?;

        let time = match raw.time.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => match parse_time(t) {
                Some(parsed) => parsed,
                None => {
                    // The source sometimes carries garbage in the time cell;
                    // treat it like a missing time rather than losing the draw.
                    warn!(row = raw.row_index, time = t, "unparseable time, defaulting to 00:00:00");
                    NaiveTime::MIN
                }
            },
            _ => {
                warn!(row = raw.row_index, "missing time, defaulting to 00:00:00");
                NaiveTime::MIN
            }
        };

        let number = clean_number(&raw.number).ok_or(RejectionReason::BadNumber)?;

        let animal = fold_label(&raw.animal);
        if !is_valid_animal(&animal) {
            return Err(RejectionReason::UnknownAnimal);
        }

        let expected = animal_for_number(&number).expect("number validated against table");
        let valid = if expected == animal {
            true
        } else {
            match self.policy {
                MismatchPolicy::Reject => return Err(RejectionReason::NumberAnimalMismatch),
                MismatchPolicy::Flag => {
                    warn!(
                        row = raw.row_index,
                        number = %number,
                        animal = %animal,
                        expected,
                        "number/animal mismatch, keeping record as invalid"
                    );
                    false
                }
            }
        };

        Ok(CanonicalRecord {
            date,
            time,
            number,
            animal,
            source: SOURCE_ID.to_string(),
            processed_at,
            row_index: raw.row_index,
            valid,
        })
    }
}

/// Parse a date under the accepted formats: ISO `%Y-%m-%d`, `%d/%m/%Y`, or
/// the Spanish long form "{d} de {mes} de {yyyy}" found anywhere in the text
/// (so weekday prefixes like "martes, 15 de enero de 2025" pass).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Some(d);
    }
    parse_spanish_date(text)
}

/// Scan for "{d} de {mes} de {yyyy}" in lower-cased text.
fn parse_spanish_date(text: &str) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();

    // Window over "<day> de <month> de <year>".
    for w in words.windows(5) {
        if w[1] != "de" || w[3] != "de" {
            continue;
        }
        let day: u32 = match w[0].parse() {
            Ok(d) => d,
            Err(_) => continue,
        };
        let year: i32 = match w[4].parse() {
            Ok(y) => y,
            Err(_) => continue,
        };
        let month = match SPANISH_MONTHS.iter().position(|&m| m == w[2]) {
            Some(idx) => idx as u32 + 1,
            None => continue,
        };
        if !(1..=31).contains(&day) || !(1900..=2100).contains(&year) {
            return None;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

/// Parse "H:MM AM/PM" (optional seconds) or 24h "HH:MM[:SS]".
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let text = raw.trim();

    // 12h with meridiem, e.g. "2:30 PM" or "08:00:15 am".
    let upper = text.to_uppercase();
    for (suffix, is_pm) in [("AM", false), ("PM", true)] {
        let Some(stripped) = upper.strip_suffix(suffix) else {
            continue;
        };
        let clock = stripped.trim();
        let parsed = NaiveTime::parse_from_str(clock, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
            .ok()?;
        let hour12 = parsed.hour();
        if !(1..=12).contains(&hour12) {
            return None;
        }
        let hour24 = match (is_pm, hour12) {
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, 12) => 0,
            (false, h) => h,
        };
        return parsed.with_hour(hour24);
    }

    // Plain 24h.
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Strip non-digits and map into the fixed draw domain. "0" stays "0"
/// (DELFIN); everything else must be an integer 0–36 and is zero-padded,
/// so "5" → "05" and "00" → "00".
pub fn clean_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if digits == "0" {
        return Some("0".to_string());
    }
    let n: u32 = digits.parse().ok()?;
    if n <= 36 {
        Some(format!("{n:02}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, number: &str, animal: &str, time: Option<&str>) -> RawRow {
        RawRow {
            date: date.to_string(),
            number: number.to_string(),
            animal: animal.to_string(),
            time: time.map(str::to_string),
            row_index: 1,
        }
    }

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn spanish_row_normalizes_to_canonical_record() {
        // The worked example from the source documentation.
        let n = Normalizer::new(MismatchPolicy::Flag);
        let rec = n
            .normalize(&raw("15 de enero de 2025", "5", "León", Some("2:30 PM")), stamp())
            .unwrap();
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(rec.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(rec.number, "05");
        assert_eq!(rec.animal, "LEON");
        assert_eq!(rec.source, SOURCE_ID);
        assert!(rec.valid);
    }

    #[test]
    fn weekday_prefix_still_parses() {
        assert_eq!(
            parse_date("martes, 15 de enero de 2025"),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
    }

    #[test]
    fn iso_and_slash_dates_parse() {
        assert_eq!(parse_date("2025-09-06"), NaiveDate::from_ymd_opt(2025, 9, 6));
        assert_eq!(parse_date("06/09/2025"), NaiveDate::from_ymd_opt(2025, 9, 6));
    }

    #[test]
    fn bad_dates_reject() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        for bad in ["fecha inválida", "", "32 de enero de 2025", "5 de foo de 2025"] {
            let err = n.normalize(&raw(bad, "05", "LEON", None), stamp()).unwrap_err();
            assert_eq!(err, RejectionReason::BadDate, "input: {bad:?}");
        }
    }

    #[test]
    fn year_out_of_range_rejects() {
        assert_eq!(parse_date("6 de septiembre de 1899"), None);
        assert_eq!(parse_date("6 de septiembre de 2101"), None);
    }

    #[test]
    fn time_conversions() {
        assert_eq!(parse_time("08:00 AM"), NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(parse_time("08:00 PM"), NaiveTime::from_hms_opt(20, 0, 0));
        assert_eq!(parse_time("12:00 AM"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_time("12:15 PM"), NaiveTime::from_hms_opt(12, 15, 0));
        assert_eq!(parse_time("14:30"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_time("14:30:45"), NaiveTime::from_hms_opt(14, 30, 45));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("13:00 PM"), None);
    }

    #[test]
    fn missing_time_defaults_to_midnight() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        let rec = n.normalize(&raw("2025-01-15", "05", "LEON", None), stamp()).unwrap();
        assert_eq!(rec.time, NaiveTime::MIN);
        assert!(rec.valid);
    }

    #[test]
    fn garbage_time_is_kept_with_default() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        let rec = n
            .normalize(&raw("2025-01-15", "05", "LEON", Some("mediodía")), stamp())
            .unwrap();
        assert_eq!(rec.time, NaiveTime::MIN);
    }

    #[test]
    fn out_of_domain_number_rejects() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        for bad in ["37", "99", "abc", ""] {
            let err = n
                .normalize(&raw("2025-01-15", bad, "LEON", None), stamp())
                .unwrap_err();
            assert_eq!(err, RejectionReason::BadNumber, "input: {bad:?}");
        }
    }

    #[test]
    fn number_cleaning_keeps_zero_distinct() {
        assert_eq!(clean_number("0").as_deref(), Some("0"));
        assert_eq!(clean_number("00").as_deref(), Some("00"));
        assert_eq!(clean_number("5").as_deref(), Some("05"));
        assert_eq!(clean_number(" #36 ").as_deref(), Some("36"));
        assert_eq!(clean_number("37"), None);
    }

    #[test]
    fn unknown_animal_rejects() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        let err = n
            .normalize(&raw("2025-01-15", "05", "DRAGON", None), stamp())
            .unwrap_err();
        assert_eq!(err, RejectionReason::UnknownAnimal);
    }

    #[test]
    fn accented_animal_matches() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        let rec = n
            .normalize(&raw("2025-01-15", "09", "Águila", None), stamp())
            .unwrap();
        assert_eq!(rec.animal, "AGUILA");
        assert!(rec.valid);
    }

    #[test]
    fn mismatch_flag_policy_keeps_record_invalid() {
        let n = Normalizer::new(MismatchPolicy::Flag);
        // 05 is LEON, not TIGRE.
        let rec = n
            .normalize(&raw("2025-01-15", "05", "TIGRE", None), stamp())
            .unwrap();
        assert!(!rec.valid);
        assert_eq!(rec.number, "05");
        assert_eq!(rec.animal, "TIGRE");
    }

    #[test]
    fn mismatch_reject_policy_rejects() {
        let n = Normalizer::new(MismatchPolicy::Reject);
        let err = n
            .normalize(&raw("2025-01-15", "05", "TIGRE", None), stamp())
            .unwrap_err();
        assert_eq!(err, RejectionReason::NumberAnimalMismatch);
    }
}
