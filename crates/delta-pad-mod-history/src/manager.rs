//! Core undo/redo engine.
//!
//! Keeps two bounded stacks of inverse deltas. Undo entries are not static:
//! every undo re-inverts the replayed delta against the live document to
//! mint the matching redo entry, and `transform` rebases both stacks when a
//! change the engine does not own lands on the document.
use std::cell::Cell;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;

use delta_pad_ot::{Delta, Insert, Op};

use crate::clock::{Clock, SystemClock};
use crate::config::HistoryConfig;
use crate::host::DocumentHost;

/// Who caused an observed document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// A direct user action.
    User,
    /// A programmatic or remote change.
    Api,
}

/// Which stack a replay cycle pops from.
#[derive(Debug, Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

/// Scoped reentrancy latch: set on construction, cleared on drop, so an
/// early return or a failing apply cannot leave it stuck.
struct ApplyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ApplyGuard<'a> {
    fn hold(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Manages undo/redo history for a single document session.
///
/// One engine per document; constructed empty and torn down with it.
pub struct UndoManager {
    /// Undo entries, oldest at the front, most recent at the back.
    undo_stack: VecDeque<Delta>,
    /// Redo entries, most recently undone at the back.
    redo_stack: VecDeque<Delta>,
    /// Timestamp of the last non-coalesced record; `None` forces the next
    /// record to open a fresh coalescing window.
    last_recorded: Option<Instant>,
    /// True only while the engine itself is applying a delta.
    ignore_change: Cell<bool>,
    /// Configuration parameters.
    config: HistoryConfig,
    /// Time source for the coalescing window.
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo_len", &self.undo_stack.len())
            .field("redo_len", &self.redo_stack.len())
            .field("last_recorded", &self.last_recorded)
            .field("ignore_change", &self.ignore_change.get())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl UndoManager {
    /// Creates an empty engine using the real monotonic clock.
    pub fn new(config: HistoryConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Creates an empty engine with an injected clock.
    pub fn with_clock(config: HistoryConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            last_recorded: None,
            ignore_change: Cell::new(false),
            config,
            clock,
        }
    }

    /// Dispatch point for every observed document change.
    ///
    /// Ignored while the engine is applying its own delta. Otherwise the
    /// change is recorded, unless `user_only` is set and the source is not
    /// the user, in which case the stacks are only rebased against it.
    pub fn on_change(&mut self, change: &Delta, base: &Delta, source: ChangeSource) {
        if self.ignore_change.get() {
            return;
        }
        if !self.config.user_only || source == ChangeSource::User {
            self.record(change, base);
        } else {
            self.transform(change);
        }
    }

    /// Records a change the engine did not cause itself.
    ///
    /// `base` is the document state immediately before the change, used as
    /// the basis for inversion. Within the coalescing window the inverse is
    /// merged into the previous undo step instead of starting a new one.
    pub fn record(&mut self, change: &Delta, base: &Delta) {
        if change.is_empty() {
            return;
        }
        // A new edit invalidates any pending redo branch.
        self.redo_stack.clear();

        let mut undo_op = change.invert(base);
        let now = self.clock.now();
        let delay = Duration::from_millis(self.config.delay_ms);
        let coalesce = !self.undo_stack.is_empty()
            && self
                .last_recorded
                .map_or(false, |last| now.duration_since(last) < delay);
        if coalesce {
            if let Some(previous) = self.undo_stack.pop_back() {
                undo_op = undo_op.compose(&previous);
            }
        } else {
            self.last_recorded = Some(now);
        }
        // Coalescing can cancel out entirely (e.g. type then delete).
        if undo_op.length() == 0 {
            return;
        }
        self.undo_stack.push_back(undo_op);
        if self.undo_stack.len() > self.config.max_stack {
            self.undo_stack.pop_front();
        }
        tracing::trace!(undo_len = self.undo_stack.len(), "recorded change");
    }

    /// Reverts the most recent undo step. Returns whether anything changed.
    pub fn undo(&mut self, host: &mut dyn DocumentHost) -> Result<bool> {
        self.change(Direction::Undo, host)
    }

    /// Replays the most recently undone step. Returns whether anything
    /// changed.
    pub fn redo(&mut self, host: &mut dyn DocumentHost) -> Result<bool> {
        self.change(Direction::Redo, host)
    }

    /// Shared replay cycle for undo and redo.
    fn change(&mut self, direction: Direction, host: &mut dyn DocumentHost) -> Result<bool> {
        let (source, dest) = match direction {
            Direction::Undo => (&mut self.undo_stack, &mut self.redo_stack),
            Direction::Redo => (&mut self.redo_stack, &mut self.undo_stack),
        };
        let Some(op) = source.pop_back() else {
            return Ok(false);
        };
        // The replayed entry must itself be undoable in the opposite
        // direction, inverted against the live document, not the one it was
        // recorded on.
        let base = host.contents();
        dest.push_back(op.invert(&base));
        self.last_recorded = None;
        {
            let _guard = ApplyGuard::hold(&self.ignore_change);
            host.apply(&op, true)?;
        }
        let index = last_change_index(&*host, &op);
        host.set_caret(index);
        Ok(true)
    }

    /// Rebases both stacks against a change the engine does not own.
    pub fn transform(&mut self, foreign: &Delta) {
        Self::transform_stack(&mut self.undo_stack, foreign);
        Self::transform_stack(&mut self.redo_stack, foreign);
    }

    /// Walks a stack newest-first so each older entry is rebased against
    /// the foreign change advanced past every entry applied after it.
    fn transform_stack(stack: &mut VecDeque<Delta>, foreign: &Delta) {
        let mut foreign = foreign.clone();
        for i in (0..stack.len()).rev() {
            let entry = std::mem::take(&mut stack[i]);
            let rebased = foreign.transform(&entry, true);
            foreign = entry.transform(&foreign, false);
            if rebased.length() == 0 {
                tracing::debug!("dropping history entry subsumed by foreign change");
                stack.remove(i);
            } else {
                stack[i] = rebased;
            }
        }
    }

    /// Empties both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_recorded = None;
    }

    /// Forces the next recorded change to start a fresh coalescing window.
    pub fn cutoff(&mut self) {
        self.last_recorded = None;
    }

    /// Whether undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo entries.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo entries.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

/// Caret index after replaying `delta`: past the net inserted/retained
/// content, stepping back over a trailing structural line break or a
/// block-format-only tail so the caret lands at the end of visible text.
fn last_change_index(host: &dyn DocumentHost, delta: &Delta) -> usize {
    let delete_length: usize = delta
        .ops()
        .iter()
        .map(|op| match op {
            Op::Delete { delete } => *delete,
            _ => 0,
        })
        .sum();
    let change_index = delta.length() - delete_length;
    if ends_with_block_change(host, delta) {
        change_index.saturating_sub(1)
    } else {
        change_index
    }
}

fn ends_with_block_change(host: &dyn DocumentHost, delta: &Delta) -> bool {
    match delta.ops().last() {
        Some(Op::Insert {
            insert: Insert::Text(text),
            ..
        }) => text.ends_with('\n'),
        Some(Op::Insert { .. }) => false,
        Some(op) => op.attributes().map_or(false, |attrs| {
            attrs.keys().any(|name| host.is_block_format(name))
        }),
        None => false,
    }
}
