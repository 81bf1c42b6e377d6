//! The ordered paragraph list every editing operation mutates.

use log::info;
use std::fmt;
use std::path::Path;

use crate::chunker::TextChunker;
use crate::config::{ChunkBudget, EditorConfig};
use crate::error::{Result, TextError};
use crate::escape::escape;
use crate::loader::{is_markup_file, load_text_file};
use crate::markup::{
    MarkupRechunker, NoopListener, Prosody, TagKind, VoiceListener, parse_and_flatten,
    render_break, render_phoneme, render_prosody,
};
use crate::paragraph::Paragraph;
use crate::shorthand::ShorthandConverter;

/// Where an insertion lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    /// After the current last paragraph
    #[default]
    End,
    /// Before the paragraph at this index; past the end means append
    At(usize),
}

impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Self::At(index)
    }
}

/// Paragraphs in playback order.
///
/// Every insertion builds its complete paragraph list before touching the
/// document, so a failed call leaves it unchanged.
pub struct Document {
    paragraphs: Vec<Paragraph>,
    budget: ChunkBudget,
    supported_extensions: Vec<String>,
    listener: Box<dyn VoiceListener>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("paragraphs", &self.paragraphs)
            .field("budget", &self.budget)
            .field("supported_extensions", &self.supported_extensions)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create an empty document from the editor configuration.
    pub fn new(config: &EditorConfig) -> Result<Self> {
        Ok(Self {
            paragraphs: Vec::new(),
            budget: config.budget()?,
            supported_extensions: config.supported_extensions.clone(),
            listener: Box::new(NoopListener),
        })
    }

    /// Create an empty document with an explicit budget and default extensions.
    pub fn with_budget(budget: ChunkBudget) -> Self {
        Self {
            paragraphs: Vec::new(),
            budget,
            supported_extensions: EditorConfig::default().supported_extensions,
            listener: Box::new(NoopListener),
        }
    }

    /// Start from an existing list of paragraphs.
    pub fn with_paragraphs(mut self, paragraphs: Vec<Paragraph>) -> Self {
        self.paragraphs = paragraphs;
        self
    }

    /// Install a listener notified of every `<voice>` name in inserted SSML.
    pub fn with_listener(mut self, listener: impl VoiceListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn budget(&self) -> ChunkBudget {
        self.budget
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraph texts in playback order.
    pub fn texts(&self) -> Vec<String> {
        if self.paragraphs.is_empty() {
            info!("Text is empty.");
        }
        self.paragraphs
            .iter()
            .map(|p| p.text().to_string())
            .collect()
    }

    /// Add plain text, escaped and split to the budget.
    pub fn add_text(&mut self, text: &str, position: impl Into<Position>) -> Result<()> {
        let paragraphs = self.split_escaped(text)?;
        self.splice(position.into(), paragraphs);
        Ok(())
    }

    /// Add text containing `[:N秒]` pauses and `字[:ph]` overrides, each
    /// paragraph wrapped in a prosody tag built from `prosody`.
    pub fn add_shorthand_text(
        &mut self,
        text: &str,
        prosody: &Prosody,
        position: impl Into<Position>,
    ) -> Result<()> {
        let paragraphs = self.split_escaped(text)?;
        let paragraphs = ShorthandConverter::new(self.budget).convert(paragraphs, prosody);
        self.splice(position.into(), paragraphs);
        Ok(())
    }

    /// Add an SSML document, re-chunked so each paragraph is well-formed.
    ///
    /// # Errors
    /// * [`TextError::MalformedMarkup`] if the document cannot be parsed
    /// * [`TextError::MarkupReadFailure`] for other parser failures
    pub fn add_ssml_text(&mut self, markup: &str, position: impl Into<Position>) -> Result<()> {
        let segments = parse_and_flatten(markup)?;
        let chunks = MarkupRechunker::new(self.budget).rechunk(&segments)?;

        for segment in segments.iter().filter(|s| s.kind == TagKind::Voice) {
            if let Some(name) = segment.attribute("name") {
                self.listener.voice_changed(name);
            }
        }

        let paragraphs = chunks.into_iter().map(Paragraph::new).collect();
        self.splice(position.into(), paragraphs);
        Ok(())
    }

    /// Add text read with a fixed pronunciation.
    pub fn insert_phoneme(&mut self, text: &str, ph: &str, position: impl Into<Position>) -> Result<()> {
        let ph = escape(ph);
        let mut paragraphs = self.split_escaped(text)?;
        for paragraph in &mut paragraphs {
            paragraph.update(render_phoneme(paragraph.text(), &ph));
        }
        self.splice(position.into(), paragraphs);
        Ok(())
    }

    /// Add a pause of `ms` milliseconds (clamped to 0-5000).
    pub fn insert_break(&mut self, ms: i64, position: impl Into<Position>) {
        self.splice(position.into(), vec![Paragraph::new(render_break(ms))]);
    }

    /// Add text spoken with the given prosody.
    pub fn insert_prosody(
        &mut self,
        text: &str,
        prosody: &Prosody,
        position: impl Into<Position>,
    ) -> Result<()> {
        let mut paragraphs = self.split_escaped(text)?;
        for paragraph in &mut paragraphs {
            paragraph.update(render_prosody(paragraph.text(), prosody));
        }
        self.splice(position.into(), paragraphs);
        Ok(())
    }

    /// Add text with a fixed pronunciation, spoken with the given prosody.
    pub fn insert_prosody_and_phoneme(
        &mut self,
        text: &str,
        ph: &str,
        prosody: &Prosody,
        position: impl Into<Position>,
    ) -> Result<()> {
        let ph = escape(ph);
        let mut paragraphs = self.split_escaped(text)?;
        for paragraph in &mut paragraphs {
            let phoneme = render_phoneme(paragraph.text(), &ph);
            paragraph.update(render_prosody(&phoneme, prosody));
        }
        self.splice(position.into(), paragraphs);
        Ok(())
    }

    /// Remove the paragraph at `position`.
    ///
    /// Deleting from an empty document succeeds without doing anything.
    pub fn delete_paragraph(&mut self, position: usize) -> Result<()> {
        if self.paragraphs.is_empty() {
            info!("Text is empty.");
            return Ok(());
        }
        if position >= self.paragraphs.len() {
            return Err(TextError::PositionOutOfRange {
                position,
                len: self.paragraphs.len(),
            });
        }
        self.paragraphs.remove(position);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.paragraphs.clear();
    }

    /// Load a file and insert it; `.ssml` and `.xml` take the SSML path.
    pub fn open_text_file(
        &mut self,
        path: &Path,
        encoding: &str,
        position: impl Into<Position>,
    ) -> Result<()> {
        let text = load_text_file(path, encoding, &self.supported_extensions)?;

        if is_markup_file(path) {
            self.add_ssml_text(&text, position)
        } else {
            self.add_text(&text, position)
        }
    }

    fn split_escaped(&self, text: &str) -> Result<Vec<Paragraph>> {
        let mut paragraphs = TextChunker::new(self.budget).split(text)?;
        for paragraph in &mut paragraphs {
            paragraph.update(escape(paragraph.text()));
        }
        Ok(paragraphs)
    }

    fn splice(&mut self, position: Position, paragraphs: Vec<Paragraph>) {
        let index = match position {
            Position::End => self.paragraphs.len(),
            Position::At(index) => index.min(self.paragraphs.len()),
        };
        self.paragraphs.splice(index..index, paragraphs);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.paragraphs.is_empty() {
            return writeln!(f, "Text is empty.");
        }
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            writeln!(f, "{:^3}: {}", i, paragraph.text())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn document(limit: usize, elastic: usize) -> Document {
        Document::with_budget(ChunkBudget::new(limit, elastic).unwrap())
    }

    #[test]
    fn test_add_text_escapes_and_appends() {
        let mut doc = document(1500, 200);
        doc.add_text("Tom & Jerry", Position::End).unwrap();
        doc.add_text("<end>", Position::End).unwrap();
        assert_eq!(doc.texts(), vec!["Tom &amp; Jerry", "&lt;end&gt;"]);
    }

    #[test]
    fn test_add_text_splits_long_text() {
        let mut doc = document(10, 0);
        doc.add_text("今天天氣很好，我們去公園散步吧。", Position::End).unwrap();
        assert_eq!(doc.texts(), vec!["今天天氣很好", "，我們去公園散步吧。"]);
        assert_eq!(doc.paragraphs()[0].len(), 6);
    }

    #[test]
    fn test_insert_at_position() {
        let mut doc = document(1500, 200);
        doc.add_text("one", Position::End).unwrap();
        doc.add_text("three", Position::End).unwrap();
        doc.add_text("two", Position::At(1)).unwrap();
        doc.add_text("zero", Position::At(0)).unwrap();
        doc.add_text("four", Position::At(99)).unwrap();
        assert_eq!(doc.texts(), vec!["zero", "one", "two", "three", "four"]);
    }

    #[test]
    fn test_append_to_empty_document() {
        let mut doc = document(1500, 200);
        doc.add_text("first", Position::End).unwrap();
        assert_eq!(doc.texts(), vec!["first"]);
    }

    #[test]
    fn test_failed_insert_leaves_document_unchanged() {
        let mut doc = document(10, 0);
        doc.add_text("keep", Position::End).unwrap();

        let result = doc.add_text("abcdefghijklmn&", Position::End);
        assert!(matches!(result, Err(TextError::ExcessiveFinalOverhead { .. })));
        assert_eq!(doc.texts(), vec!["keep"]);
    }

    #[test]
    fn test_delete_paragraph() {
        let mut doc = document(1500, 200);
        doc.add_text("a", Position::End).unwrap();
        doc.add_text("b", Position::End).unwrap();
        doc.delete_paragraph(0).unwrap();
        assert_eq!(doc.texts(), vec!["b"]);
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut doc = document(1500, 200);
        doc.add_text("a", Position::End).unwrap();
        let result = doc.delete_paragraph(5);
        assert!(matches!(
            result,
            Err(TextError::PositionOutOfRange { position: 5, len: 1 })
        ));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_delete_from_empty_document() {
        let mut doc = document(1500, 200);
        assert!(doc.delete_paragraph(3).is_ok());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut doc = document(1500, 200)
            .with_paragraphs(vec![Paragraph::new("a"), Paragraph::new("b")]);
        assert_eq!(doc.len(), 2);
        doc.clear();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_insert_break_and_phoneme() {
        let mut doc = document(1500, 200);
        doc.insert_break(9999, Position::End);
        doc.insert_phoneme("行", "ㄏㄤˊ", Position::End).unwrap();
        assert_eq!(
            doc.texts(),
            vec![
                r#"<break time="5000ms"/>"#,
                r#"<phoneme alphabet="bopomo" lang="TW" ph="ㄏㄤˊ">行</phoneme>"#,
            ]
        );
    }

    #[test]
    fn test_insert_prosody_variants() {
        let mut doc = document(1500, 200);
        let prosody = Prosody::default().with_pitch(-1);
        doc.insert_prosody("慢慢說", &prosody, Position::End).unwrap();
        doc.insert_prosody_and_phoneme("行", "ㄏㄤˊ", &Prosody::default(), Position::End)
            .unwrap();
        assert_eq!(
            doc.texts(),
            vec![
                r#"<prosody pitch="-1st">慢慢說</prosody>"#,
                r#"<prosody rate="1.0"><phoneme alphabet="bopomo" lang="TW" ph="ㄏㄤˊ">行</phoneme></prosody>"#,
            ]
        );
    }

    #[test]
    fn test_add_shorthand_text() {
        let mut doc = document(1500, 200);
        doc.add_shorthand_text("你[:ni3]好", &Prosody::default(), Position::End)
            .unwrap();
        doc.add_shorthand_text("等我[:3秒]一下", &Prosody::default(), Position::End)
            .unwrap();
        let texts = doc.texts();
        assert!(texts[0].contains(
            r#"<phoneme alphabet="bopomo" lang="TW" ph="ni3">你</phoneme>好"#
        ));
        assert!(texts[0].starts_with(r#"<prosody rate="1.0">"#));
        assert_eq!(
            texts[1],
            r#"<prosody rate="1.0">等我<break time="3000ms"/>一下</prosody>"#
        );
    }

    #[test]
    fn test_shorthand_override_of_reserved_character_is_well_formed() {
        let mut doc = document(1500, 200);
        doc.add_shorthand_text("A&[:ㄢˋ]B", &Prosody::default(), Position::End)
            .unwrap();
        let texts = doc.texts();
        assert!(texts[0].contains(r#"ph="ㄢˋ">&amp;</phoneme>B"#));

        let segments = crate::markup::parse_and_flatten(&texts[0]).unwrap();
        assert_eq!(segments[1].kind, TagKind::Phoneme);
        assert_eq!(segments[1].text, "&");
    }

    #[test]
    fn test_add_ssml_notifies_voice_listener() {
        let voices = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&voices);
        let mut doc = document(1500, 200)
            .with_listener(move |name: &str| sink.borrow_mut().push(name.to_string()));

        doc.add_ssml_text(
            r#"<speak><voice name="Aurora">早安</voice><voice name="Ben">晚安</voice></speak>"#,
            Position::End,
        )
        .unwrap();

        assert_eq!(doc.texts(), vec!["早安晚安"]);
        assert_eq!(*voices.borrow(), vec!["Aurora", "Ben"]);
    }

    #[test]
    fn test_add_ssml_malformed() {
        let mut doc = document(1500, 200);
        let result = doc.add_ssml_text("<speak><prosody></speak>", Position::End);
        assert!(matches!(result, Err(TextError::MalformedMarkup(_))));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_open_text_file_dispatches_on_extension() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("note.txt");
        let markup = dir.path().join("note.ssml");
        fs::write(&plain, "<b>").unwrap();
        fs::write(&markup, r#"<speak><break time="200ms"/></speak>"#).unwrap();

        let mut doc = document(1500, 200);
        doc.open_text_file(&plain, "utf-8", Position::End).unwrap();
        doc.open_text_file(&markup, "utf-8", Position::End).unwrap();
        assert_eq!(doc.texts(), vec!["&lt;b&gt;", r#"<break time="200ms"/>"#]);
    }

    #[test]
    fn test_open_unsupported_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "x").unwrap();

        let mut doc = document(1500, 200);
        let result = doc.open_text_file(&path, "utf-8", Position::End);
        assert!(matches!(result, Err(TextError::UnsupportedFileExtension(_))));
    }

    #[test]
    fn test_display_listing() {
        let doc = document(1500, 200)
            .with_paragraphs(vec![Paragraph::new("a"), Paragraph::new("b")]);
        assert_eq!(doc.to_string(), " 0 : a\n 1 : b\n");
        assert_eq!(document(10, 0).to_string(), "Text is empty.\n");
    }
}
