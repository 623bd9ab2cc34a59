//! Conflict marking for university IDs within one course
//!
//! Two IDs conflict when they are equal after trimming surrounding whitespace
//! and lowercasing. Output is ordered by the lowercased ID with whitespace
//! kept, the shorter side padded with spaces; entries that compare equal keep
//! their submission order. Conflict status is computed on every read and never
//! stored.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::model::UniversityId;

/// A university ID with its derived conflict flag
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarkedUniversityId {
    #[serde(flatten)]
    pub record: UniversityId,
    pub is_conflicted: bool,
}

/// Comparison form of an identifier
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Sort form of an identifier: lowercased, whitespace kept
pub fn sort_key(raw: &str) -> String {
    raw.to_lowercase()
}

/// Compare two sort keys, padding the shorter one with spaces
///
/// `"20-04m\t"` sorts before `"20-04m"`, and `"20-10x"` equals `"20-10x "`.
pub fn compare_padded(a: &str, b: &str) -> Ordering {
    let mut a = a.chars();
    let mut b = b.chars();
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (x, y) => match x.unwrap_or(' ').cmp(&y.unwrap_or(' ')) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Sort `(owner, identifier)` pairs and flag collisions.
///
/// All entries are assumed to belong to one course.
pub fn mark_identifiers<O: Clone>(entries: &[(O, String)]) -> Vec<(O, String, bool)> {
    let keys: Vec<String> = entries
        .iter()
        .map(|(_, raw)| normalize_identifier(raw))
        .collect();
    let sort_keys: Vec<String> = entries.iter().map(|(_, raw)| sort_key(raw)).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in &keys {
        *counts.entry(key.as_str()).or_default() += 1;
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    // stable: equal keys stay in submission order
    order.sort_by(|&a, &b| compare_padded(&sort_keys[a], &sort_keys[b]));

    order
        .into_iter()
        .map(|i| {
            let (owner, raw) = &entries[i];
            (owner.clone(), raw.clone(), counts[keys[i].as_str()] > 1)
        })
        .collect()
}

/// Marked university IDs of one course, sorted by lowercased ID.
///
/// Records whose `course_key` differs from `course_key` are left out; callers
/// pass one course's records per call.
pub fn mark_conflicts(course_key: &str, records: &[UniversityId]) -> Vec<MarkedUniversityId> {
    let scoped: Vec<(UniversityId, String)> = records
        .iter()
        .filter(|r| r.course_key == course_key)
        .map(|r| (r.clone(), r.university_id.clone()))
        .collect();

    if scoped.len() < records.len() {
        tracing::debug!(
            course_key,
            skipped = records.len() - scoped.len(),
            "ignoring university IDs from other courses"
        );
    }

    mark_identifiers(&scoped)
        .into_iter()
        .map(|(record, _, is_conflicted)| MarkedUniversityId {
            record,
            is_conflicted,
        })
        .collect()
}
