//! Undo/redo history engine over composable text deltas.
//!
//! Provides an `UndoManager` that keeps two bounded stacks of inverse
//! deltas, coalesces rapid edits into single undo steps, and rebases both
//! stacks against changes it does not own (remote or programmatic edits)
//! so stored entries stay valid as the document moves underneath them.
//! History lives only as long as the document session; nothing is persisted.
pub mod clock;
pub mod config;
pub mod host;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HistoryConfig;
pub use host::DocumentHost;
pub use manager::{ChangeSource, UndoManager};
