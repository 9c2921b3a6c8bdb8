//! Storage Reader Module
//!
//! Rebuilds records from sorted cell sequences handed over by the backend.
//!
//! ## Responsibilities
//! - `values`: single-version, tombstone-resolved cells → one [`crate::value::ValueTree`]
//! - `changes`: multi-version cells → ascending versioned change-sets
//!
//! Both readers are pure over their input iterator, skip unselected leaves
//! without decoding their payloads, and tolerate unknown field tags (schema
//! forward compatibility) by reporting the skipped qualifiers instead of
//! aborting the scan.

mod changes;
mod values;

pub use changes::{read_changes, ChangeOp, ChangesResult, VersionedChanges};
pub use values::{read_values, DecodedRecord};
