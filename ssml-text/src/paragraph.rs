//! A single playback unit of text.

/// Text cell with a cached character count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    text: String,
    length: usize,
}

impl Paragraph {
    /// Create a paragraph from any string-like value.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self { text, length }
    }

    /// Replace the text, keeping the cached length in sync.
    pub fn update(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.length = self.text.chars().count();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
