//! Core document model for delta-pad.
//!
//! A `Document` holds rich-text contents as an insert-only delta with a
//! linear caret; an `Editor` ties a document to the undo/redo engine and
//! routes every applied change into it.
pub mod document;
pub mod editor;
pub mod history;

pub use document::Document;
pub use editor::Editor;
