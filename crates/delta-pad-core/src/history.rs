// Re-exports from delta-pad-mod-history so downstream code can reach the
// history types through the core crate.
pub use delta_pad_mod_history::{
    ChangeSource, Clock, DocumentHost, HistoryConfig, ManualClock, SystemClock, UndoManager,
};
