//! Rich-text document: contents as an insert-only delta plus a caret.
use anyhow::Result;

use delta_pad_mod_history::DocumentHost;
use delta_pad_ot::{Delta, Insert, Op};

/// Format names that are line-scoped (block-level). Attribute changes to
/// these apply to the line's implicit trailing newline marker.
const BLOCK_FORMATS: &[&str] = &[
    "header",
    "list",
    "align",
    "indent",
    "blockquote",
    "code-block",
    "direction",
];

/// A single rich-text document.
///
/// Contents are an insert-only delta; the caret is a linear unit index into
/// it, always clamped to the document length.
#[derive(Debug, Clone, Default)]
pub struct Document {
    contents: Delta,
    caret: usize,
    /// Bumped on every applied change so callers can detect mutation
    /// without comparing content.
    revision: u64,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from plain text, unformatted.
    pub fn from_text(text: &str) -> Self {
        Self {
            contents: Delta::new().insert(text, None),
            caret: 0,
            revision: 0,
        }
    }

    /// The document contents as an insert-only delta.
    pub fn contents(&self) -> &Delta {
        &self.contents
    }

    /// Total document length in units (chars, embeds counting as one).
    pub fn length(&self) -> usize {
        self.contents.length()
    }

    /// Flattens the text inserts; embeds are skipped.
    pub fn text(&self) -> String {
        self.contents
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    insert: Insert::Text(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Current caret index.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Current revision counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Moves the caret, clamped to the document length.
    pub fn move_caret(&mut self, index: usize) {
        self.caret = index.min(self.length());
    }

    /// Applies a change delta to the contents.
    ///
    /// The caret is shifted across the change; `silent` marks applies the
    /// history engine performs itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the change consumes more units than the document
    /// has. A change like that is a contract violation and is rejected
    /// before it can corrupt the contents.
    pub fn apply_change(&mut self, change: &Delta, silent: bool) -> Result<()> {
        let length = self.length();
        if change.base_length() > length {
            anyhow::bail!(
                "change consumes {} units but document has only {}",
                change.base_length(),
                length
            );
        }
        self.contents = self.contents.compose(change);
        self.caret = change.transform_position(self.caret, false).min(self.length());
        self.revision = self.revision.wrapping_add(1);
        tracing::trace!(revision = self.revision, silent, "document changed");
        Ok(())
    }
}

impl DocumentHost for Document {
    fn contents(&self) -> Delta {
        self.contents.clone()
    }

    fn apply(&mut self, change: &Delta, silent: bool) -> Result<()> {
        self.apply_change(change, silent)
    }

    fn set_caret(&mut self, index: usize) {
        self.move_caret(index);
    }

    fn is_block_format(&self, name: &str) -> bool {
        BLOCK_FORMATS.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_and_length() {
        let doc = Document::from_text("héllo\n");
        assert_eq!(doc.length(), 6);
        assert_eq!(doc.text(), "héllo\n");
    }

    #[test]
    fn test_apply_change_composes_contents() {
        let mut doc = Document::from_text("hello");
        let change = Delta::new().retain(5, None).insert(" world", None);
        doc.apply_change(&change, false).expect("apply");
        assert_eq!(doc.text(), "hello world");
        assert_eq!(doc.revision(), 1);
    }

    #[test]
    fn test_apply_change_rejects_oversized_change() {
        let mut doc = Document::from_text("ab");
        let change = Delta::new().retain(2, None).delete(1);
        let err = doc.apply_change(&change, false).expect_err("must fail");
        assert!(err.to_string().contains("consumes 3 units"));
        // contents untouched
        assert_eq!(doc.text(), "ab");
    }

    #[test]
    fn test_caret_shifts_across_change() {
        let mut doc = Document::from_text("abc");
        doc.move_caret(2);
        let change = Delta::new().insert("xx", None);
        doc.apply_change(&change, false).expect("apply");
        assert_eq!(doc.caret(), 4);

        let delete = Delta::new().delete(3);
        doc.apply_change(&delete, false).expect("apply");
        assert_eq!(doc.caret(), 1);
    }

    #[test]
    fn test_move_caret_clamps() {
        let mut doc = Document::from_text("ab");
        doc.move_caret(10);
        assert_eq!(doc.caret(), 2);
    }

    #[test]
    fn test_block_format_registry() {
        let doc = Document::new();
        assert!(doc.is_block_format("header"));
        assert!(doc.is_block_format("code-block"));
        assert!(!doc.is_block_format("bold"));
        assert!(!doc.is_block_format("color"));
    }
}
