//! # Trellis
//!
//! A storage codec and scan planner for structured records over sorted
//! key-value stores:
//! - Property paths encoded as order-preserving byte qualifiers
//! - Value trees decomposed into versioned cells and reassembled back
//! - Per-version change extraction from raw cell history
//! - Filter trees compiled into sound byte-range scans
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Model Schemas                            │
//! │            (fields, types, reversal, indexables)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Qualifier Codec                             │
//! │        (path ⇄ sortable bytes, order-preserving)             │
//! └──────┬──────────────┬───────────────────────┬───────────────┘
//!        │              │                       │
//!        ▼              ▼                       ▼
//! ┌─────────────┐ ┌─────────────┐        ┌─────────────┐
//! │   Writer    │ │   Readers   │        │    Scan     │
//! │ (tree→cells)│ │(cells→tree, │        │  (filter→   │
//! │             │ │   changes)  │        │ byte range) │
//! └─────────────┘ └─────────────┘        └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod path;
pub mod value;
pub mod schema;
pub mod qualifier;
pub mod cell;
pub mod writer;
pub mod reader;
pub mod filter;
pub mod scan;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TrellisError};
pub use config::{CorruptCellPolicy, ReadConfig};
pub use path::{PathMask, PathSegment, PropertyPath};
pub use value::{Value, ValueTree};
pub use schema::{
    FieldDef, IndexPart, Indexable, ModelSchema, PropertyType, ScalarType, SchemaRegistry,
};
pub use qualifier::{decode_qualifier, encode_qualifier, DecodedQualifier, QualifierTarget};
pub use cell::{Cell, StorageOp, StorageType};
pub use writer::{delete_object, walk, StorageWalker};
pub use reader::{read_changes, read_values, ChangeOp, ChangesResult, DecodedRecord};
pub use filter::Filter;
pub use scan::{PartialMatch, ScanRange, ScanRangeBuilder};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Trellis
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
