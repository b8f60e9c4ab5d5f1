//! Typed ops and the splitting iterator used by the algebra.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::AttributeMap;

/// Content carried by an insert op: a text run or an embedded object
/// (image, formula, ...). An embed always occupies exactly one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),
    Embed(Value),
}

impl Insert {
    /// Length in document units: char count for text, 1 for an embed.
    pub fn length(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Embed(_) => 1,
        }
    }
}

impl From<&str> for Insert {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Insert {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A single step of a delta.
///
/// The JSON shape matches the conventional delta wire format:
/// `{"insert":"ab","attributes":{"bold":true}}`, `{"retain":3}`,
/// `{"delete":2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Op {
    Insert {
        insert: Insert,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<AttributeMap>,
    },
    Retain {
        retain: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<AttributeMap>,
    },
    Delete {
        delete: usize,
    },
}

impl Op {
    /// Length of this op in document units.
    pub fn length(&self) -> usize {
        match self {
            Self::Insert { insert, .. } => insert.length(),
            Self::Retain { retain, .. } => *retain,
            Self::Delete { delete } => *delete,
        }
    }

    /// Attributes attached to this op, if any. Deletes carry none.
    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Self::Insert { attributes, .. } | Self::Retain { attributes, .. } => {
                attributes.as_ref()
            }
            Self::Delete { .. } => None,
        }
    }

    /// The kind of this op.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Insert { .. } => OpKind::Insert,
            Self::Retain { .. } => OpKind::Retain,
            Self::Delete { .. } => OpKind::Delete,
        }
    }
}

/// Discriminant of an [`Op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Insert,
    Retain,
    Delete,
}

/// Cursor over a delta's ops that can consume partial op lengths.
///
/// Compose, transform, and slice all walk two deltas in lockstep, splitting
/// whichever op is longer. An exhausted iterator behaves as an endless
/// plain retain so the shorter delta pads out naturally.
#[derive(Debug)]
pub struct OpIterator<'a> {
    ops: &'a [Op],
    index: usize,
    offset: usize,
}

impl<'a> OpIterator<'a> {
    pub fn new(ops: &'a [Op]) -> Self {
        Self {
            ops,
            index: 0,
            offset: 0,
        }
    }

    /// Whether any real op remains.
    pub fn has_next(&self) -> bool {
        self.index < self.ops.len()
    }

    /// The current op, untouched by the consumption offset.
    pub fn peek(&self) -> Option<&'a Op> {
        self.ops.get(self.index)
    }

    /// Remaining length of the current op, or `usize::MAX` when exhausted.
    pub fn peek_length(&self) -> usize {
        match self.ops.get(self.index) {
            Some(op) => op.length() - self.offset,
            None => usize::MAX,
        }
    }

    /// Kind of the current op; an exhausted iterator reads as retain.
    pub fn peek_kind(&self) -> OpKind {
        match self.ops.get(self.index) {
            Some(op) => op.kind(),
            None => OpKind::Retain,
        }
    }

    /// Consumes and returns the whole remainder of the current op.
    pub fn next_full(&mut self) -> Op {
        self.next(usize::MAX)
    }

    /// Consumes up to `length` units of the current op, splitting it if it
    /// is longer. Past the end this returns a plain retain of `length`.
    pub fn next(&mut self, length: usize) -> Op {
        let Some(op) = self.ops.get(self.index) else {
            return Op::Retain {
                retain: length,
                attributes: None,
            };
        };
        let offset = self.offset;
        let op_length = op.length();
        let take = length.min(op_length - offset);
        if offset + take == op_length {
            self.index += 1;
            self.offset = 0;
        } else {
            self.offset += take;
        }
        match op {
            Op::Delete { .. } => Op::Delete { delete: take },
            Op::Retain { attributes, .. } => Op::Retain {
                retain: take,
                attributes: attributes.clone(),
            },
            Op::Insert {
                insert: Insert::Text(text),
                attributes,
            } => Op::Insert {
                insert: Insert::Text(text.chars().skip(offset).take(take).collect()),
                attributes: attributes.clone(),
            },
            Op::Insert {
                insert: Insert::Embed(value),
                attributes,
            } => Op::Insert {
                insert: Insert::Embed(value.clone()),
                attributes: attributes.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_op_lengths() {
        let text = Op::Insert {
            insert: Insert::from("héllo"),
            attributes: None,
        };
        assert_eq!(text.length(), 5);
        let embed = Op::Insert {
            insert: Insert::Embed(json!({"image": "logo.png"})),
            attributes: None,
        };
        assert_eq!(embed.length(), 1);
        assert_eq!(
            Op::Retain {
                retain: 3,
                attributes: None
            }
            .length(),
            3
        );
        assert_eq!(Op::Delete { delete: 2 }.length(), 2);
    }

    #[test]
    fn test_iterator_splits_text_inserts() {
        let ops = vec![Op::Insert {
            insert: Insert::from("hello"),
            attributes: None,
        }];
        let mut iter = OpIterator::new(&ops);
        assert_eq!(iter.peek_length(), 5);
        let first = iter.next(2);
        assert_eq!(
            first,
            Op::Insert {
                insert: Insert::from("he"),
                attributes: None
            }
        );
        assert_eq!(iter.peek_length(), 3);
        let rest = iter.next_full();
        assert_eq!(
            rest,
            Op::Insert {
                insert: Insert::from("llo"),
                attributes: None
            }
        );
        assert!(!iter.has_next());
    }

    #[test]
    fn test_exhausted_iterator_yields_retain() {
        let ops: Vec<Op> = Vec::new();
        let mut iter = OpIterator::new(&ops);
        assert_eq!(iter.peek_kind(), OpKind::Retain);
        assert_eq!(iter.peek_length(), usize::MAX);
        assert_eq!(
            iter.next(4),
            Op::Retain {
                retain: 4,
                attributes: None
            }
        );
    }

    #[test]
    fn test_op_json_shapes() {
        let op = Op::Insert {
            insert: Insert::from("a"),
            attributes: Some(
                [("bold".to_string(), json!(true))]
                    .into_iter()
                    .collect(),
            ),
        };
        let encoded = serde_json::to_value(&op).expect("serialize");
        assert_eq!(encoded, json!({"insert": "a", "attributes": {"bold": true}}));

        let retain: Op = serde_json::from_value(json!({"retain": 3})).expect("deserialize");
        assert_eq!(
            retain,
            Op::Retain {
                retain: 3,
                attributes: None
            }
        );
        let delete: Op = serde_json::from_value(json!({"delete": 2})).expect("deserialize");
        assert_eq!(delete, Op::Delete { delete: 2 });
        let embed: Op =
            serde_json::from_value(json!({"insert": {"image": "x.png"}})).expect("deserialize");
        assert_eq!(embed.length(), 1);
    }
}
