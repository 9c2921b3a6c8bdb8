//! Partial-match predicates
//!
//! Stateless matchers over a fixed byte span of a candidate index key.
//! They exist because a single byte range cannot express "equals one of
//! several values while an earlier key part varies"; they are evaluated
//! only on candidates already inside the computed range, so they add
//! precision without affecting soundness.

use serde::{Deserialize, Serialize};

/// One residual predicate over `candidate[offset..]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialMatch {
    /// Exact byte equality over the span.
    ToMatch { offset: usize, bytes: Vec<u8> },

    /// Span must compare greater than `bytes` (or equal, when inclusive).
    ToBeBigger {
        offset: usize,
        bytes: Vec<u8>,
        inclusive: bool,
    },

    /// Span must compare less than `bytes` (or equal, when inclusive).
    ToBeSmaller {
        offset: usize,
        bytes: Vec<u8>,
        inclusive: bool,
    },

    /// Span must equal one of a small literal set of alternatives.
    ToBeOneOf {
        offset: usize,
        length: usize,
        members: Vec<Vec<u8>>,
    },
}

impl PartialMatch {
    /// Evaluate against a candidate key. Candidates too short to carry the
    /// span never match; every true positive carries all of its parts.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        match self {
            PartialMatch::ToMatch { offset, bytes } => candidate
                .get(*offset..*offset + bytes.len())
                .is_some_and(|span| span == bytes.as_slice()),
            PartialMatch::ToBeBigger {
                offset,
                bytes,
                inclusive,
            } => candidate
                .get(*offset..*offset + bytes.len())
                .is_some_and(|span| span > bytes.as_slice() || (*inclusive && span == bytes.as_slice())),
            PartialMatch::ToBeSmaller {
                offset,
                bytes,
                inclusive,
            } => candidate
                .get(*offset..*offset + bytes.len())
                .is_some_and(|span| span < bytes.as_slice() || (*inclusive && span == bytes.as_slice())),
            PartialMatch::ToBeOneOf {
                offset,
                length,
                members,
            } => candidate
                .get(*offset..*offset + length)
                .is_some_and(|span| members.iter().any(|member| span == member.as_slice())),
        }
    }
}
