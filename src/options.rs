use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Options {
    /// Run the full strategy ladder (1..6) on every failed parse instead of
    /// the shorter most-likely-first ordering tuned for LLM truncation.
    pub exhaustive_recovery: bool,
    /// Allow flat key-value salvage as the last-resort strategy. When
    /// disabled, recovery only ever returns whole-document repairs.
    pub salvage_fallback: bool,
    /// `complete_rendering()` force-finalizes components still in flight.
    /// When false it performs no transitions and is purely diagnostic.
    pub auto_finalize: bool,
    /// Optional wall-clock window for `sweep_stalled()`: components with no
    /// update inside the window are force-finalized. None disables the sweep.
    pub auto_finalize_timeout: Option<Duration>,
    /// Record a log entry per attempted recovery strategy. Use the
    /// `*_with_log` entry points to retrieve entries.
    pub logging: bool,
    /// Cap on the parser's internal buffer. Exceeding it fails the current
    /// value instead of growing unbounded on a runaway stream.
    pub max_buffer_bytes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            exhaustive_recovery: false,
            salvage_fallback: true,
            auto_finalize: true,
            auto_finalize_timeout: None,
            logging: false,
            max_buffer_bytes: 1024 * 1024,
        }
    }
}
