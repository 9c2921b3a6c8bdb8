//! Configuration for Trellis readers
//!
//! Centralized read-path policy with sensible defaults.

/// What a reader does when it hits a cell whose qualifier will not decode
/// (truncated segment, garbage bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptCellPolicy {
    /// Skip the bad cell, log at WARN, and keep reading. The default:
    /// correctness of the surviving cells never depends on the broken one.
    Skip,

    /// Abort the whole read and surface the decode error to the caller.
    Abort,
}

/// Policy knobs consumed by [`crate::reader::read_values`] and
/// [`crate::reader::read_changes`].
#[derive(Debug, Clone)]
pub struct ReadConfig {
    // -------------------------------------------------------------------------
    // Corruption Handling
    // -------------------------------------------------------------------------
    /// How to treat cells with malformed qualifiers mid-stream.
    pub corrupt_cells: CorruptCellPolicy,

    // -------------------------------------------------------------------------
    // Collection Integrity
    // -------------------------------------------------------------------------
    /// Validate collection indices against the declared count cell and
    /// detect truncated collections after the stream is exhausted. Skipped
    /// automatically when a selection mask is in play, since partial reads
    /// legitimately see fewer children than declared.
    pub validate_counts: bool,

    // -------------------------------------------------------------------------
    // Forward Compatibility
    // -------------------------------------------------------------------------
    /// Collect the qualifiers of skipped unknown-tag cells into the reader
    /// output so the caller can log or inspect them.
    pub record_ignored: bool,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            corrupt_cells: CorruptCellPolicy::Skip,
            validate_counts: true,
            record_ignored: true,
        }
    }
}

impl ReadConfig {
    /// Create a new config builder
    pub fn builder() -> ReadConfigBuilder {
        ReadConfigBuilder::default()
    }
}

/// Builder for ReadConfig
#[derive(Default)]
pub struct ReadConfigBuilder {
    config: ReadConfig,
}

impl ReadConfigBuilder {
    /// Set the corrupt-cell policy
    pub fn corrupt_cells(mut self, policy: CorruptCellPolicy) -> Self {
        self.config.corrupt_cells = policy;
        self
    }

    /// Enable or disable collection count validation
    pub fn validate_counts(mut self, on: bool) -> Self {
        self.config.validate_counts = on;
        self
    }

    /// Enable or disable collection of ignored qualifiers
    pub fn record_ignored(mut self, on: bool) -> Self {
        self.config.record_ignored = on;
        self
    }

    pub fn build(self) -> ReadConfig {
        self.config
    }
}
