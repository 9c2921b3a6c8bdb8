//! Scan ranges
//!
//! The planner's output: a byte interval over index entry keys plus the
//! residual predicates, equality pins, and point-key candidates a backend
//! can exploit. Immutable once built; one instance per query.

use serde::{Deserialize, Serialize};

use crate::scan::predicate::PartialMatch;

/// A key part pinned to an exact encoded value by an equality clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualPair {
    /// Byte offset of the part inside an index entry key.
    pub offset: usize,

    /// The pinned value encoding (post-reversal, without the marker byte).
    pub bytes: Vec<u8>,
}

/// Byte range plus residual predicates for one sorted-store scan.
///
/// Bounds are compared against candidate keys truncated to the bound's
/// length, so a bound over a key prefix covers every continuation of that
/// prefix. An empty `start` means "from the beginning"; an empty `end`
/// means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRange {
    pub start: Vec<u8>,
    pub start_inclusive: bool,
    pub end: Vec<u8>,
    pub end_inclusive: bool,

    /// Necessary-but-not-sufficient refinements, evaluated on candidates
    /// already inside the range.
    pub partial_matches: Vec<PartialMatch>,

    /// Parts pinned by equality clauses.
    pub equal_pairs: Vec<EqualPair>,

    /// Complete point-key prefixes when the filter pins every part except a
    /// final membership test; a backend may switch to point gets.
    pub uniques: Vec<Vec<u8>>,
}

impl Default for ScanRange {
    fn default() -> Self {
        Self::open()
    }
}

impl ScanRange {
    /// The fully open range: every key qualifies.
    pub fn open() -> Self {
        Self {
            start: Vec::new(),
            start_inclusive: true,
            end: Vec::new(),
            end_inclusive: true,
            partial_matches: Vec::new(),
            equal_pairs: Vec::new(),
            uniques: Vec::new(),
        }
    }

    /// True when nothing constrains the scan.
    pub fn is_open(&self) -> bool {
        self.start.is_empty() && self.end.is_empty() && self.partial_matches.is_empty()
    }

    /// Does the key sort before the lower bound?
    pub fn key_before_start(&self, key: &[u8]) -> bool {
        if self.start.is_empty() {
            return false;
        }
        let prefix = &key[..key.len().min(self.start.len())];
        match prefix.cmp(&self.start[..prefix.len()]) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                if prefix.len() < self.start.len() {
                    // A strict prefix of the bound sorts before it.
                    true
                } else {
                    !self.start_inclusive
                }
            }
        }
    }

    /// Does the key sort past the upper bound?
    pub fn key_out_of_range(&self, key: &[u8]) -> bool {
        if self.end.is_empty() {
            return false;
        }
        let prefix = &key[..key.len().min(self.end.len())];
        match prefix.cmp(&self.end[..prefix.len()]) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                if prefix.len() < self.end.len() {
                    false
                } else {
                    !self.end_inclusive
                }
            }
        }
    }

    /// Full candidate check: inside the bounds and past every predicate.
    pub fn key_matches(&self, key: &[u8]) -> bool {
        !self.key_before_start(key)
            && !self.key_out_of_range(key)
            && self.partial_matches.iter().all(|p| p.matches(key))
    }
}
