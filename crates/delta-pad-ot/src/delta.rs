//! The `Delta` sequence type and its algebra.
use serde::{Deserialize, Serialize};

use crate::attributes::{self, AttributeMap};
use crate::op::{Insert, Op, OpIterator, OpKind};

/// An ordered sequence of retain/insert/delete ops.
///
/// A delta describes either a document (insert-only) or a change to one.
/// All algebra operations return new instances; an existing delta is never
/// mutated by them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    ops: Vec<Op>,
}

impl From<Vec<Op>> for Delta {
    fn from(ops: Vec<Op>) -> Self {
        Self { ops }
    }
}

impl Delta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ops of this delta, in order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// True if this delta performs no steps at all.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Sum of all op lengths (the transformation distance of the delta).
    pub fn length(&self) -> usize {
        self.ops.iter().map(Op::length).sum()
    }

    /// Length of the document this delta applies to (retains + deletes).
    pub fn base_length(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                Op::Insert { .. } => 0,
                _ => op.length(),
            })
            .sum()
    }

    /// Appends an insert step. Chainable builder; empty content is a no-op.
    pub fn insert(mut self, content: impl Into<Insert>, attributes: Option<AttributeMap>) -> Self {
        let insert = content.into();
        if insert.length() > 0 {
            self.push(Op::Insert { insert, attributes });
        }
        self
    }

    /// Appends a retain step. Chainable builder; zero length is a no-op.
    pub fn retain(mut self, length: usize, attributes: Option<AttributeMap>) -> Self {
        if length > 0 {
            self.push(Op::Retain {
                retain: length,
                attributes,
            });
        }
        self
    }

    /// Appends a delete step. Chainable builder; zero length is a no-op.
    pub fn delete(mut self, length: usize) -> Self {
        if length > 0 {
            self.push(Op::Delete { delete: length });
        }
        self
    }

    /// Appends an op, keeping the sequence canonical: adjacent deletes
    /// merge, adjacent inserts/retains with equal attributes merge, and an
    /// insert is ordered before an immediately preceding delete (the two
    /// commute, and insert-first is the normal form).
    pub fn push(&mut self, new_op: Op) {
        let mut index = self.ops.len();
        if index > 0 {
            if let Op::Delete { delete: next } = &new_op {
                if let Some(Op::Delete { delete: prev }) = self.ops.last_mut() {
                    *prev += next;
                    return;
                }
            }
            if matches!(self.ops[index - 1], Op::Delete { .. })
                && matches!(new_op, Op::Insert { .. })
            {
                index -= 1;
                if index == 0 {
                    self.ops.insert(0, new_op);
                    return;
                }
            }
        }
        if index > 0 {
            let merged = match (&mut self.ops[index - 1], &new_op) {
                (
                    Op::Insert {
                        insert: Insert::Text(prev),
                        attributes: prev_attrs,
                    },
                    Op::Insert {
                        insert: Insert::Text(next),
                        attributes: next_attrs,
                    },
                ) if *prev_attrs == *next_attrs => {
                    prev.push_str(next);
                    true
                }
                (
                    Op::Retain {
                        retain: prev,
                        attributes: prev_attrs,
                    },
                    Op::Retain {
                        retain: next,
                        attributes: next_attrs,
                    },
                ) if *prev_attrs == *next_attrs => {
                    *prev += next;
                    true
                }
                _ => false,
            };
            if merged {
                return;
            }
        }
        if index == self.ops.len() {
            self.ops.push(new_op);
        } else {
            self.ops.insert(index, new_op);
        }
    }

    /// Drops a trailing attribute-less retain, the canonical final form.
    pub fn chop(mut self) -> Self {
        if let Some(Op::Retain {
            attributes: None, ..
        }) = self.ops.last()
        {
            self.ops.pop();
        }
        self
    }

    /// Returns the sub-delta covering `[start, end)` of this delta's
    /// target document, splitting ops at the boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Delta {
        let mut ops = Vec::new();
        let mut iter = OpIterator::new(&self.ops);
        let mut index = 0usize;
        while index < end && iter.has_next() {
            if index < start {
                index += iter.next(start - index).length();
            } else {
                let op = iter.next(end - index);
                index += op.length();
                ops.push(op);
            }
        }
        Delta { ops }
    }

    /// Combines this delta followed by `other` into one equivalent delta.
    pub fn compose(&self, other: &Delta) -> Delta {
        let mut this_iter = OpIterator::new(&self.ops);
        let mut other_iter = OpIterator::new(&other.ops);
        let mut delta = Delta::new();

        // A plain leading retain in `other` passes our leading inserts
        // through untouched.
        if let Some(Op::Retain {
            retain,
            attributes: None,
        }) = other_iter.peek()
        {
            let mut first_left = *retain;
            while this_iter.peek_kind() == OpKind::Insert
                && this_iter.peek_length() <= first_left
            {
                first_left -= this_iter.peek_length();
                delta.push(this_iter.next_full());
            }
            if retain - first_left > 0 {
                other_iter.next(retain - first_left);
            }
        }

        while this_iter.has_next() || other_iter.has_next() {
            if other_iter.peek_kind() == OpKind::Insert {
                delta.push(other_iter.next_full());
            } else if this_iter.peek_kind() == OpKind::Delete {
                delta.push(this_iter.next_full());
            } else {
                let length = this_iter.peek_length().min(other_iter.peek_length());
                let this_op = this_iter.next(length);
                let other_op = other_iter.next(length);
                match (this_op, other_op) {
                    (
                        this_op,
                        Op::Retain {
                            attributes: other_attrs,
                            ..
                        },
                    ) => {
                        let keep_null = matches!(this_op, Op::Retain { .. });
                        let composed = attributes::compose(
                            this_op.attributes(),
                            other_attrs.as_ref(),
                            keep_null,
                        );
                        match this_op {
                            Op::Insert { insert, .. } => delta.push(Op::Insert {
                                insert,
                                attributes: composed,
                            }),
                            _ => delta.push(Op::Retain {
                                retain: length,
                                attributes: composed,
                            }),
                        }
                    }
                    (Op::Retain { .. }, delete @ Op::Delete { .. }) => delta.push(delete),
                    // our insert consumed by their delete: both vanish
                    _ => {}
                }
            }
        }
        delta.chop()
    }

    /// Computes the delta that exactly reverses this one when applied to
    /// the document that results from applying it to `base`.
    pub fn invert(&self, base: &Delta) -> Delta {
        let mut inverted = Delta::new();
        let mut base_index = 0usize;
        for op in &self.ops {
            match op {
                Op::Insert { .. } => {
                    inverted.push(Op::Delete {
                        delete: op.length(),
                    });
                }
                Op::Retain {
                    retain,
                    attributes: None,
                } => {
                    inverted.push(Op::Retain {
                        retain: *retain,
                        attributes: None,
                    });
                    base_index += retain;
                }
                Op::Retain {
                    retain,
                    attributes: Some(attrs),
                } => {
                    let slice = base.slice(base_index, base_index + retain);
                    for base_op in slice.ops() {
                        inverted.push(Op::Retain {
                            retain: base_op.length(),
                            attributes: attributes::invert(Some(attrs), base_op.attributes()),
                        });
                    }
                    base_index += retain;
                }
                Op::Delete { delete } => {
                    let slice = base.slice(base_index, base_index + delete);
                    for base_op in slice.ops() {
                        inverted.push(base_op.clone());
                    }
                    base_index += delete;
                }
            }
        }
        inverted.chop()
    }

    /// Rebases `other` against this delta so both can be applied in either
    /// order with the same end state. With `priority`, this delta is
    /// considered to have happened first and wins position ties.
    pub fn transform(&self, other: &Delta, priority: bool) -> Delta {
        let mut this_iter = OpIterator::new(&self.ops);
        let mut other_iter = OpIterator::new(&other.ops);
        let mut delta = Delta::new();
        while this_iter.has_next() || other_iter.has_next() {
            if this_iter.peek_kind() == OpKind::Insert
                && (priority || other_iter.peek_kind() != OpKind::Insert)
            {
                delta.push(Op::Retain {
                    retain: this_iter.next_full().length(),
                    attributes: None,
                });
            } else if other_iter.peek_kind() == OpKind::Insert {
                delta.push(other_iter.next_full());
            } else {
                let length = this_iter.peek_length().min(other_iter.peek_length());
                let this_op = this_iter.next(length);
                let other_op = other_iter.next(length);
                match (this_op, other_op) {
                    // our delete already removed what their op targeted
                    (Op::Delete { .. }, _) => continue,
                    (_, delete @ Op::Delete { .. }) => delta.push(delete),
                    (this_op, other_op) => {
                        delta.push(Op::Retain {
                            retain: length,
                            attributes: attributes::transform(
                                this_op.attributes(),
                                other_op.attributes(),
                                priority,
                            ),
                        });
                    }
                }
            }
        }
        delta.chop()
    }

    /// Shifts a linear caret index across this delta. With `priority`, an
    /// insert exactly at the caret does not push it forward.
    pub fn transform_position(&self, index: usize, priority: bool) -> usize {
        let mut iter = OpIterator::new(&self.ops);
        let mut index = index;
        let mut offset = 0usize;
        while iter.has_next() && offset <= index {
            let length = iter.peek_length();
            let kind = iter.peek_kind();
            iter.next_full();
            match kind {
                OpKind::Delete => {
                    index -= length.min(index - offset);
                }
                OpKind::Insert => {
                    if offset < index || !priority {
                        index += length;
                    }
                    offset += length;
                }
                OpKind::Retain => {
                    offset += length;
                }
            }
        }
        index
    }
}
