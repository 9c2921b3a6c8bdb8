//! Scan Planning Module
//!
//! Compiles filter trees against an indexable into byte-range scans with
//! residual predicates.
//!
//! ## Range anatomy
//! ```text
//! ┌──────────────┬──────┬──────────────┬──────┬─ ─ ─
//! │ part 0 bytes │ 0x01 │ part 1 bytes │ 0x01 │ …      index entry key
//! └──────────────┴──────┴──────────────┴──────┴─ ─ ─
//! ```
//! Each part's value encoding is followed by a one-byte continuation
//! marker. Bounds reuse the same shape: an inclusive boundary ends in
//! `0x01`, an exclusive lower boundary ends in `0x02` (which sorts after
//! every continuation of the excluded value). Candidate keys are compared
//! against bounds truncated to the bound's length, so a bound over a key
//! prefix covers every continuation of that prefix.
//!
//! Soundness over precision: the computed range never excludes a key whose
//! row matches the filter; partial-match predicates only sharpen what the
//! range lets through, and any filter shape the planner cannot use simply
//! degrades toward the fully open range.

mod builder;
mod predicate;
mod range;

pub use builder::ScanRangeBuilder;
pub use predicate::PartialMatch;
pub use range::{EqualPair, ScanRange};

/// Marker byte after each encoded part: an inclusive boundary / the
/// continuation of a present part.
pub const CONTINUATION: u8 = 0x01;

/// Marker byte for an exclusive lower boundary; sorts after every
/// continuation of the excluded value.
pub const EXCLUSIVE: u8 = 0x02;
