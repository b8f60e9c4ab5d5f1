//! Delta operation algebra for rich text.
//!
//! A `Delta` is an ordered sequence of retain/insert/delete ops describing
//! either a document (insert-only) or a change to one. Deltas compose,
//! invert against a base document, and transform against concurrent deltas
//! (operational transformation), which is what makes them usable as undo
//! stack entries that survive foreign edits.
pub mod attributes;
pub mod delta;
pub mod op;

pub use attributes::AttributeMap;
pub use delta::Delta;
pub use op::{Insert, Op, OpIterator, OpKind};
