//! Editing session: a document wired to the undo/redo engine.
use anyhow::{Context, Result};
use serde_json::Value;

use delta_pad_mod_history::{ChangeSource, HistoryConfig, UndoManager};
use delta_pad_ot::{AttributeMap, Delta};

use crate::document::Document;

/// A document session.
///
/// Owns the document and its history engine and is the single funnel for
/// changes: every edit goes through [`Editor::apply_delta`], which applies
/// the change and hands it to the engine to record or rebase.
#[derive(Debug)]
pub struct Editor {
    document: Document,
    history: UndoManager,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Creates an empty session with default history configuration.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Creates an empty session with the given history configuration.
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            document: Document::new(),
            history: UndoManager::new(config),
        }
    }

    /// Creates a session around an existing engine (e.g. one with an
    /// injected clock) and document.
    pub fn with_history(document: Document, history: UndoManager) -> Self {
        Self { document, history }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    /// The document contents as a delta.
    pub fn contents(&self) -> &Delta {
        self.document.contents()
    }

    /// The document's plain text.
    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn caret(&self) -> usize {
        self.document.caret()
    }

    /// Applies a raw change delta from the given source.
    ///
    /// This is the entry point for programmatic and remote changes; the
    /// engine records user changes and rebases its stacks against the rest
    /// (subject to `user_only`).
    pub fn apply_delta(&mut self, change: Delta, source: ChangeSource) -> Result<()> {
        let base = self.document.contents().clone();
        self.document
            .apply_change(&change, false)
            .context("failed to apply change to document")?;
        self.history.on_change(&change, &base, source);
        Ok(())
    }

    /// Inserts plain text at `index`.
    pub fn insert_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.insert_text_with(index, text, None)
    }

    /// Inserts text at `index` with formatting attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is past the end of the document.
    pub fn insert_text_with(
        &mut self,
        index: usize,
        text: &str,
        attributes: Option<AttributeMap>,
    ) -> Result<()> {
        let length = self.document.length();
        if index > length {
            anyhow::bail!(
                "insert index {} out of bounds (document has {} units)",
                index,
                length
            );
        }
        if text.is_empty() {
            return Ok(());
        }
        let inserted = text.chars().count();
        let change = Delta::new().retain(index, None).insert(text, attributes);
        self.apply_delta(change, ChangeSource::User)?;
        self.document.move_caret(index + inserted);
        Ok(())
    }

    /// Inserts an embedded object (image, formula, ...) at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is past the end of the document.
    pub fn insert_embed(
        &mut self,
        index: usize,
        embed: Value,
        attributes: Option<AttributeMap>,
    ) -> Result<()> {
        let length = self.document.length();
        if index > length {
            anyhow::bail!(
                "insert index {} out of bounds (document has {} units)",
                index,
                length
            );
        }
        let change = Delta::new()
            .retain(index, None)
            .insert(delta_pad_ot::Insert::Embed(embed), attributes);
        self.apply_delta(change, ChangeSource::User)?;
        self.document.move_caret(index + 1);
        Ok(())
    }

    /// Deletes `len` units starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range exceeds the document.
    pub fn delete_range(&mut self, index: usize, len: usize) -> Result<()> {
        let length = self.document.length();
        if index + len > length {
            anyhow::bail!(
                "delete range {}..{} out of bounds (document has {} units)",
                index,
                index + len,
                length
            );
        }
        if len == 0 {
            return Ok(());
        }
        let change = Delta::new().retain(index, None).delete(len);
        self.apply_delta(change, ChangeSource::User)?;
        self.document.move_caret(index);
        Ok(())
    }

    /// Sets format `name` to `value` over `len` units starting at `index`.
    /// A `null` value removes the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the range exceeds the document.
    pub fn format(&mut self, index: usize, len: usize, name: &str, value: Value) -> Result<()> {
        let length = self.document.length();
        if index + len > length {
            anyhow::bail!(
                "format range {}..{} out of bounds (document has {} units)",
                index,
                index + len,
                length
            );
        }
        if len == 0 {
            return Ok(());
        }
        let attrs: AttributeMap = [(name.to_string(), value)].into_iter().collect();
        let change = Delta::new().retain(index, None).retain(len, Some(attrs));
        self.apply_delta(change, ChangeSource::User)
    }

    /// Reverts the most recent undo step.
    pub fn undo(&mut self) -> Result<bool> {
        self.history.undo(&mut self.document)
    }

    /// Replays the most recently undone step.
    pub fn redo(&mut self) -> Result<bool> {
        self.history.redo(&mut self.document)
    }

    /// Forces the next edit to start a new undo step (session boundary,
    /// e.g. blur).
    pub fn cutoff(&mut self) {
        self.history.cutoff();
    }

    /// Drops all history (e.g. after loading new content).
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delta_pad_mod_history::ManualClock;
    use serde_json::json;
    use std::time::Duration;

    fn session() -> (Editor, ManualClock) {
        let clock = ManualClock::new();
        let history = UndoManager::with_clock(HistoryConfig::default(), Box::new(clock.clone()));
        (Editor::with_history(Document::new(), history), clock)
    }

    #[test]
    fn test_insert_delete_and_text() {
        let (mut editor, _clock) = session();
        editor.insert_text(0, "hello world").expect("insert");
        editor.delete_range(5, 6).expect("delete");
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.caret(), 5);
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let (mut editor, _clock) = session();
        let err = editor.insert_text(1, "x").expect_err("must fail");
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn test_delete_out_of_bounds() {
        let (mut editor, _clock) = session();
        editor.insert_text(0, "ab").expect("insert");
        assert!(editor.delete_range(1, 5).is_err());
    }

    #[test]
    fn test_format_records_undoable_step() {
        let (mut editor, clock) = session();
        editor.insert_text(0, "hello").expect("insert");
        clock.advance(Duration::from_millis(2000));
        editor.format(0, 5, "bold", json!(true)).expect("format");
        assert_eq!(
            editor.contents().ops()[0].attributes().and_then(|a| a.get("bold")),
            Some(&json!(true))
        );

        editor.undo().expect("undo");
        assert_eq!(editor.contents().ops()[0].attributes(), None);
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn test_embed_roundtrip() {
        let (mut editor, clock) = session();
        editor.insert_text(0, "see: ").expect("insert");
        clock.advance(Duration::from_millis(2000));
        editor
            .insert_embed(5, json!({"image": "logo.png"}), None)
            .expect("embed");
        assert_eq!(editor.document().length(), 6);
        assert_eq!(editor.caret(), 6);

        editor.undo().expect("undo");
        assert_eq!(editor.document().length(), 5);
        editor.redo().expect("redo");
        assert_eq!(editor.document().length(), 6);
    }

    #[test]
    fn test_undo_redo_through_editor() {
        let (mut editor, clock) = session();
        editor.insert_text(0, "one").expect("insert");
        clock.advance(Duration::from_millis(2000));
        editor.insert_text(3, " two").expect("insert");

        editor.undo().expect("undo");
        assert_eq!(editor.text(), "one");
        editor.undo().expect("undo");
        assert_eq!(editor.text(), "");
        editor.redo().expect("redo");
        editor.redo().expect("redo");
        assert_eq!(editor.text(), "one two");
    }

    #[test]
    fn test_api_change_with_user_only_is_not_undoable() {
        let clock = ManualClock::new();
        let config = HistoryConfig {
            user_only: true,
            ..HistoryConfig::default()
        };
        let history = UndoManager::with_clock(config, Box::new(clock.clone()));
        let mut editor = Editor::with_history(Document::new(), history);

        editor.insert_text(0, "local").expect("insert");
        clock.advance(Duration::from_millis(2000));
        editor
            .apply_delta(Delta::new().insert("remote ", None), ChangeSource::Api)
            .expect("apply");
        assert_eq!(editor.text(), "remote local");

        // undo skips the remote change and reverts the local edit
        editor.undo().expect("undo");
        assert_eq!(editor.text(), "remote ");
        assert!(!editor.undo().expect("undo"));
    }

    #[test]
    fn test_cutoff_and_clear() {
        let (mut editor, _clock) = session();
        editor.insert_text(0, "a").expect("insert");
        editor.cutoff();
        editor.insert_text(1, "b").expect("insert");
        assert_eq!(editor.history().undo_len(), 2);

        editor.clear_history();
        assert!(!editor.history().can_undo());
    }
}
