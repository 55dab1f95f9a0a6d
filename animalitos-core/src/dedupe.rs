//! Deduplicator — collapses records that describe the same draw event.
//!
//! The identity key is `(date, time, number)`. Output order follows the
//! first occurrence of each key, but the *value* comes from the last
//! occurrence: the source is append-only/corrective, so a later row for the
//! same draw supersedes an earlier one. Linear time, no I/O.

use std::collections::HashMap;

use crate::record::CanonicalRecord;

/// Collapse duplicates. Returns the surviving records and the number of
/// inputs dropped as duplicates.
pub fn dedupe(records: Vec<CanonicalRecord>) -> (Vec<CanonicalRecord>, usize) {
    let mut out: Vec<CanonicalRecord> = Vec::with_capacity(records.len());
    let mut seen: HashMap<(chrono::NaiveDate, chrono::NaiveTime, String), usize> = HashMap::new();
    let mut dropped = 0;

    for record in records {
        match seen.get(&record.key()) {
            Some(&idx) => {
                // Later observation wins, position of first occurrence kept.
                out[idx] = record;
                dropped += 1;
            }
            None => {
                seen.insert(record.key(), out.len());
                out.push(record);
            }
        }
    }

    (out, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SOURCE_ID;
    use chrono::{NaiveDate, NaiveTime};

    fn rec(day: u32, hour: u32, number: &str, row_index: usize) -> CanonicalRecord {
        CanonicalRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            number: number.to_string(),
            animal: "LEON".to_string(),
            source: SOURCE_ID.to_string(),
            processed_at: NaiveDate::from_ymd_opt(2025, 1, 20)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            row_index,
            valid: true,
        }
    }

    #[test]
    fn empty_in_empty_out() {
        let (out, dropped) = dedupe(vec![]);
        assert!(out.is_empty());
        assert_eq!(dropped, 0);
    }

    #[test]
    fn distinct_keys_pass_through_in_order() {
        let input = vec![rec(1, 8, "05", 0), rec(1, 9, "05", 1), rec(2, 8, "05", 2)];
        let (out, dropped) = dedupe(input.clone());
        assert_eq!(out, input);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn later_observation_wins_at_first_position() {
        let first = rec(1, 8, "05", 0);
        let later = rec(1, 8, "05", 7);
        let other = rec(1, 9, "10", 1);
        let (out, dropped) = dedupe(vec![first, other.clone(), later.clone()]);
        assert_eq!(out, vec![later, other]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn idempotent() {
        let input = vec![rec(1, 8, "05", 0), rec(1, 8, "05", 1), rec(2, 8, "00", 2)];
        let (once, _) = dedupe(input);
        let (twice, dropped) = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(dropped, 0);
    }
}
