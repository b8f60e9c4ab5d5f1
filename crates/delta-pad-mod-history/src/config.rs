//! Configuration for the history engine.

/// Time window in milliseconds within which consecutive edits coalesce
/// into a single undo step.
const DEFAULT_DELAY_MS: u64 = 1000;

/// Maximum number of entries kept per stack. The oldest undo step is
/// evicted when the bound is exceeded.
const DEFAULT_MAX_STACK: usize = 100;

/// Configuration for the history engine.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Coalescing window in milliseconds.
    pub delay_ms: u64,
    /// Per-stack capacity.
    pub max_stack: usize,
    /// When set, only user-sourced changes are recorded; everything else
    /// is rebased against but never becomes an undo step.
    pub user_only: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            max_stack: DEFAULT_MAX_STACK,
            user_only: false,
        }
    }
}
