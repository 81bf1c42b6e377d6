//! SSML handling: flatten a parsed tree into tagged segments, render them,
//! and re-chunk the result so every chunk is well-formed on its own.

mod flatten;
mod render;
mod rechunk;

use std::collections::BTreeMap;

pub use flatten::{flatten, parse_and_flatten};
pub use rechunk::MarkupRechunker;
pub use render::{Prosody, render, render_break, render_phoneme, render_prosody};

/// The element kinds the renderer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Voice,
    Phoneme,
    Break,
    Prosody,
    /// Text following a child element's closing tag, inside its parent
    TrailingText,
    /// Any other element (e.g. `speak`); renders to nothing
    Other(String),
}

impl TagKind {
    /// Map an element's local name to its kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "voice" => Self::Voice,
            "phoneme" => Self::Phoneme,
            "break" => Self::Break,
            "prosody" => Self::Prosody,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Voice => "voice",
            Self::Phoneme => "phoneme",
            Self::Break => "break",
            Self::Prosody => "prosody",
            Self::TrailingText => "tail",
            Self::Other(name) => name,
        }
    }
}

/// One element (or trailing text run) of a flattened SSML tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupSegment {
    /// Nesting depth, the root element is 1
    pub depth: usize,
    pub kind: TagKind,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

impl MarkupSegment {
    pub fn new(depth: usize, kind: TagKind, text: impl Into<String>) -> Self {
        Self {
            depth,
            kind,
            attributes: BTreeMap::new(),
            text: text.into(),
        }
    }

    /// Add an attribute, builder style.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Same tag metadata, different text.
    pub(crate) fn with_text(&self, text: String) -> Self {
        Self {
            depth: self.depth,
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            text,
        }
    }
}

/// Receives the voice name of every `<voice>` element in a document.
pub trait VoiceListener {
    fn voice_changed(&mut self, name: &str);
}

/// Listener that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl VoiceListener for NoopListener {
    fn voice_changed(&mut self, _name: &str) {}
}

impl<F: FnMut(&str)> VoiceListener for F {
    fn voice_changed(&mut self, name: &str) {
        self(name)
    }
}
