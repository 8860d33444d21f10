use std::collections::{BTreeSet, HashSet};

/// Fingerprints exclusive to one side of a comparison.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub only_in_old: Vec<String>,
    pub only_in_new: Vec<String>,
}

/// Computes the set difference in both directions.
///
/// Results are de-duplicated and sorted so output files are stable across
/// runs regardless of extraction order.
pub fn diff(old: &[String], new: &[String]) -> DiffResult {
    let old_set: BTreeSet<&str> = old.iter().map(String::as_str).collect();
    let new_set: BTreeSet<&str> = new.iter().map(String::as_str).collect();

    DiffResult {
        only_in_old: old_set
            .difference(&new_set)
            .map(|s| (*s).to_string())
            .collect(),
        only_in_new: new_set
            .difference(&old_set)
            .map(|s| (*s).to_string())
            .collect(),
    }
}

/// Fingerprints occurring more than once in a single collection, each
/// reported once, in first-occurrence order. A non-empty result means some
/// tests were executed several times in one report set.
pub fn find_duplicates(fingerprints: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for fingerprint in fingerprints {
        if !seen.insert(fingerprint.as_str()) && reported.insert(fingerprint.as_str()) {
            duplicates.push(fingerprint.clone());
        }
    }

    duplicates
}
