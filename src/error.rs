//! Error types for Trellis
//!
//! Provides a unified error type for all codec, reader, and planner
//! operations.

use thiserror::Error;

/// Result type alias using TrellisError
pub type Result<T> = std::result::Result<T, TrellisError>;

/// Unified error type for Trellis operations
#[derive(Debug, Error)]
pub enum TrellisError {
    // -------------------------------------------------------------------------
    // Qualifier Codec Errors
    // -------------------------------------------------------------------------
    /// Qualifier bytes are shorter than a segment requires. Fatal for the
    /// single cell it was decoded from; streaming readers may skip-and-log
    /// instead of aborting (see [`crate::config::CorruptCellPolicy`]).
    #[error("malformed qualifier: {0}")]
    MalformedQualifier(String),

    /// A field storage tag the schema does not know. Recoverable on the
    /// decode path (the cell is skipped for forward compatibility); an error
    /// on the encode path, where the caller named a tag that does not exist.
    #[error("unknown field tag: 0x{tag:02x}")]
    UnknownFieldTag { tag: u8 },

    // -------------------------------------------------------------------------
    // Value Codec Errors
    // -------------------------------------------------------------------------
    /// A stored value does not decode under the schema-declared type, or a
    /// value handed to the writer does not match its declared property type.
    /// Indicates corrupted storage or a schema mismatch the caller must
    /// resolve.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    /// Schema lookup or validation failure (missing model, invalid
    /// definition).
    #[error("schema error: {0}")]
    Schema(String),

    // -------------------------------------------------------------------------
    // Cell Stream Errors
    // -------------------------------------------------------------------------
    /// A structurally valid qualifier whose cell contradicts the record
    /// around it: collection index out of declared bounds, count cell with a
    /// bad payload, truncated collection.
    #[error("invalid cell: {0}")]
    InvalidCell(String),

    // -------------------------------------------------------------------------
    // Scan Planning Errors
    // -------------------------------------------------------------------------
    /// A filter shape the planner cannot compile against the given indexable.
    /// Never surfaced from [`crate::scan::ScanRangeBuilder`]; the builder
    /// degrades to a fully open range instead.
    #[error("unsupported filter combination: {0}")]
    UnsupportedFilter(String),
}
