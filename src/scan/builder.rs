//! Scan range builder
//!
//! Recursive-conjunction compiler from a filter tree to a [`ScanRange`].
//! Key parts are processed in declared order; equality clauses keep
//! extending both bounds, the first non-equality (or missing) clause closes
//! them, and every later clause can only contribute residual predicates —
//! a sorted scan cannot skip ahead past an unconstrained earlier part.
//!
//! The builder never fails: clauses it cannot use are logged and dropped,
//! widening the range toward fully open. Soundness never depends on the
//! optimizer succeeding.

use tracing::warn;

use crate::error::{Result, TrellisError};
use crate::filter::Filter;
use crate::qualifier::{encode_scalar, invert_bytes};
use crate::scan::predicate::PartialMatch;
use crate::scan::range::{EqualPair, ScanRange};
use crate::scan::{CONTINUATION, EXCLUSIVE};
use crate::schema::{IndexPart, Indexable};
use crate::value::Value;

/// Compiles filters against one indexable.
pub struct ScanRangeBuilder<'a> {
    indexable: &'a Indexable,
}

/// Encoded-byte interval for one key part, post-reversal.
#[derive(Debug, Default)]
struct Interval {
    lower: Option<(Vec<u8>, bool)>,
    upper: Option<(Vec<u8>, bool)>,
    one_of: Option<Vec<Vec<u8>>>,
}

impl Interval {
    fn exact(bytes: Vec<u8>) -> Self {
        Self {
            lower: Some((bytes.clone(), true)),
            upper: Some((bytes, true)),
            one_of: None,
        }
    }

    fn lower(bytes: Vec<u8>, inclusive: bool) -> Self {
        Self {
            lower: Some((bytes, inclusive)),
            ..Self::default()
        }
    }

    fn upper(bytes: Vec<u8>, inclusive: bool) -> Self {
        Self {
            upper: Some((bytes, inclusive)),
            ..Self::default()
        }
    }

    /// The single pinned value, when the interval collapses to a point.
    fn equality(&self) -> Option<&[u8]> {
        match (&self.lower, &self.upper) {
            (Some((lo, true)), Some((hi, true))) if lo == hi => Some(lo),
            _ => None,
        }
    }

    /// Intersect with another clause's interval (AND semantics).
    fn intersect(&mut self, other: Interval) {
        self.lower = match (self.lower.take(), other.lower) {
            (None, bound) | (bound, None) => bound,
            (Some(a), Some(b)) => Some(tighter_lower(a, b)),
        };
        self.upper = match (self.upper.take(), other.upper) {
            (None, bound) | (bound, None) => bound,
            (Some(a), Some(b)) => Some(tighter_upper(a, b)),
        };
        self.one_of = match (self.one_of.take(), other.one_of) {
            (None, members) | (members, None) => members,
            (Some(a), Some(b)) => Some(a.into_iter().filter(|m| b.contains(m)).collect()),
        };
    }
}

fn tighter_lower(a: (Vec<u8>, bool), b: (Vec<u8>, bool)) -> (Vec<u8>, bool) {
    match a.0.cmp(&b.0) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        // Same bytes: exclusive is the tighter lower bound.
        std::cmp::Ordering::Equal => (a.0, a.1 && b.1),
    }
}

fn tighter_upper(a: (Vec<u8>, bool), b: (Vec<u8>, bool)) -> (Vec<u8>, bool) {
    match a.0.cmp(&b.0) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => (a.0, a.1 && b.1),
    }
}

impl<'a> ScanRangeBuilder<'a> {
    pub fn new(indexable: &'a Indexable) -> Self {
        Self { indexable }
    }

    /// Compile a filter into a scan range. Infallible by design: whatever
    /// cannot be planned degrades toward the open range.
    pub fn build(&self, filter: &Filter) -> ScanRange {
        let parts = self.indexable.parts();
        let mut range = ScanRange::open();

        // Flatten nested conjunctions into leaf clauses.
        let mut leaves: Vec<&Filter> = Vec::new();
        let mut pending = vec![filter];
        while let Some(node) = pending.pop() {
            match node {
                Filter::And(children) => pending.extend(children.iter()),
                leaf => leaves.push(leaf),
            }
        }

        // Group clauses by the key part they constrain.
        let mut per_part: Vec<Vec<&Filter>> = vec![Vec::new(); parts.len()];
        for leaf in leaves {
            match leaf.path().and_then(|p| self.indexable.part_for(p)) {
                Some((i, _)) => per_part[i].push(leaf),
                None => {
                    warn!("filter clause outside the indexable; no pruning from it");
                }
            }
        }

        // Both bounds grow together through equality-pinned parts, then
        // close for good.
        let mut extending = true;
        // All parts so far pinned by equality (point-get detection).
        let mut pinned = true;

        for (i, part) in parts.iter().enumerate() {
            let clauses = &per_part[i];
            if clauses.is_empty() {
                extending = false;
                pinned = false;
                continue;
            }

            let interval = match part_interval(part, clauses) {
                Ok(interval) => interval,
                Err(e) => {
                    warn!(error = %e, "cannot plan clause; leaving this key part open");
                    extending = false;
                    pinned = false;
                    continue;
                }
            };

            let offset = self.indexable.part_offset(i);
            let width = part.width();

            if let Some(bytes) = interval.equality() {
                if extending {
                    range.start.extend_from_slice(bytes);
                    range.start.push(CONTINUATION);
                    range.end.extend_from_slice(bytes);
                    range.end.push(CONTINUATION);
                    if let Some(offset) = offset {
                        range.equal_pairs.push(EqualPair {
                            offset,
                            bytes: bytes.to_vec(),
                        });
                    }
                    continue;
                }
            }

            if extending {
                let prefix = range.start.clone();
                if let Some((bytes, inclusive)) = &interval.lower {
                    range.start.extend_from_slice(bytes);
                    range
                        .start
                        .push(if *inclusive { CONTINUATION } else { EXCLUSIVE });
                }
                if let Some((bytes, inclusive)) = &interval.upper {
                    range.end.extend_from_slice(bytes);
                    range.end.push(CONTINUATION);
                    range.end_inclusive = *inclusive;
                }
                if let Some(members) = &interval.one_of {
                    match (offset, width) {
                        (Some(offset), Some(length)) => {
                            range.partial_matches.push(PartialMatch::ToBeOneOf {
                                offset,
                                length,
                                members: members.clone(),
                            });
                            if pinned && i + 1 == parts.len() {
                                // Every earlier part pinned, final part a
                                // membership test: point-get candidates.
                                range.uniques = members
                                    .iter()
                                    .map(|member| {
                                        let mut key = prefix.clone();
                                        key.extend_from_slice(member);
                                        key.push(CONTINUATION);
                                        key
                                    })
                                    .collect();
                            }
                        }
                        _ => warn!("variable-width key part; dropping membership predicate"),
                    }
                }
            } else {
                self.push_residual(&mut range, offset, &interval);
            }

            extending = false;
            pinned = false;
        }

        range
    }

    /// Predicates for a part the bounds can no longer express.
    fn push_residual(&self, range: &mut ScanRange, offset: Option<usize>, interval: &Interval) {
        let offset = match offset {
            Some(offset) => offset,
            None => {
                warn!("variable-width prefix; dropping residual predicates for this part");
                return;
            }
        };
        if let Some(bytes) = interval.equality() {
            range.partial_matches.push(PartialMatch::ToMatch {
                offset,
                bytes: bytes.to_vec(),
            });
            return;
        }
        if let Some((bytes, inclusive)) = &interval.lower {
            range.partial_matches.push(PartialMatch::ToBeBigger {
                offset,
                bytes: bytes.clone(),
                inclusive: *inclusive,
            });
        }
        if let Some((bytes, inclusive)) = &interval.upper {
            range.partial_matches.push(PartialMatch::ToBeSmaller {
                offset,
                bytes: bytes.clone(),
                inclusive: *inclusive,
            });
        }
        if let Some(members) = &interval.one_of {
            if let Some(length) = members.first().map(Vec::len) {
                range.partial_matches.push(PartialMatch::ToBeOneOf {
                    offset,
                    length,
                    members: members.clone(),
                });
            }
        }
    }
}

/// Intersect every clause constraining one part.
fn part_interval(part: &IndexPart, clauses: &[&Filter]) -> Result<Interval> {
    let mut interval = Interval::default();
    for clause in clauses {
        interval.intersect(clause_interval(part, clause)?);
    }
    Ok(interval)
}

/// Translate one clause into an encoded-byte interval, flipping the
/// comparison direction before byte encoding for reversed parts.
fn clause_interval(part: &IndexPart, clause: &Filter) -> Result<Interval> {
    let encode = |value: &Value| -> Result<Vec<u8>> {
        let mut bytes = encode_scalar(value, &part.ty)?;
        if part.reversed {
            invert_bytes(&mut bytes);
        }
        Ok(bytes)
    };

    match clause {
        Filter::Equals { value, .. } => Ok(Interval::exact(encode(value)?)),
        Filter::GreaterThan { value, .. } => {
            let bytes = encode(value)?;
            Ok(if part.reversed {
                Interval::upper(bytes, false)
            } else {
                Interval::lower(bytes, false)
            })
        }
        Filter::GreaterThanEquals { value, .. } => {
            let bytes = encode(value)?;
            Ok(if part.reversed {
                Interval::upper(bytes, true)
            } else {
                Interval::lower(bytes, true)
            })
        }
        Filter::LessThan { value, .. } => {
            let bytes = encode(value)?;
            Ok(if part.reversed {
                Interval::lower(bytes, false)
            } else {
                Interval::upper(bytes, false)
            })
        }
        Filter::LessThanEquals { value, .. } => {
            let bytes = encode(value)?;
            Ok(if part.reversed {
                Interval::lower(bytes, true)
            } else {
                Interval::upper(bytes, true)
            })
        }
        Filter::Between { low, high, .. } => {
            let a = encode(low)?;
            let b = encode(high)?;
            // Reversal may flip which end is the byte-wise minimum.
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Ok(Interval {
                lower: Some((lo, true)),
                upper: Some((hi, true)),
                one_of: None,
            })
        }
        Filter::ValueIn { values, .. } => {
            if values.is_empty() {
                return Err(TrellisError::UnsupportedFilter(
                    "empty membership set".to_string(),
                ));
            }
            let mut members = values.iter().map(encode).collect::<Result<Vec<_>>>()?;
            members.sort();
            members.dedup();
            let lower = members.first().cloned().expect("non-empty after sort");
            let upper = members.last().cloned().expect("non-empty after sort");
            if members.len() == 1 {
                return Ok(Interval::exact(lower));
            }
            Ok(Interval {
                lower: Some((lower, true)),
                upper: Some((upper, true)),
                one_of: Some(members),
            })
        }
        Filter::And(_) => Err(TrellisError::UnsupportedFilter(
            "conjunction where a leaf clause was expected".to_string(),
        )),
    }
}
