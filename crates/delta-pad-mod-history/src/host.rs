//! The document surface the history engine drives.
use anyhow::Result;

use delta_pad_ot::Delta;

/// Interface to the document that owns content and caret.
///
/// The engine never touches document state directly; every read and write
/// goes through this trait, and the two stacks stay private to the engine.
pub trait DocumentHost {
    /// Snapshot of the current document contents as an insert-only delta.
    fn contents(&self) -> Delta;

    /// Applies `change` to the document. With `silent`, the host must not
    /// emit its usual change notification: the engine applies its own
    /// undo/redo steps silently so they are not re-observed as fresh edits.
    fn apply(&mut self, change: &Delta, silent: bool) -> Result<()>;

    /// Moves the caret to a linear document index.
    fn set_caret(&mut self, index: usize);

    /// Whether a format name is line-scoped (block-level), e.g. `header`.
    fn is_block_format(&self, name: &str) -> bool;
}
