//! Inline shorthand for pauses and pronunciations.
//!
//! * `[:3秒]` becomes a three second `<break>`
//! * `字[:ㄗˋ]` wraps the preceding character in a `<phoneme>`
//!
//! Each converted paragraph is then wrapped in a single `<prosody>` tag.

use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

use crate::config::ChunkBudget;
use crate::escape::trailing_entity_len;
use crate::markup::{Prosody, render_break, render_phoneme, render_prosody};
use crate::paragraph::Paragraph;

/// Unit glyph marking a pause annotation, in seconds.
const PAUSE_MARKER: char = '秒';

/// Longest `<break>` tag a pause can expand to.
const PAUSE_TAG_RESERVE: usize = 22;

/// Longest `<phoneme>` tag a single-character override can expand to.
const PHONEME_TAG_RESERVE: usize = 58;

static ANNOTATION: OnceLock<Regex> = OnceLock::new();

fn annotation_pattern() -> &'static Regex {
    ANNOTATION.get_or_init(|| Regex::new(r"\[:(.*?)\]").expect("annotation pattern should compile"))
}

/// A recognised annotation, as byte offsets into the unmodified text.
#[derive(Debug, Clone, PartialEq)]
enum Annotation<'a> {
    Pause {
        start: usize,
        end: usize,
        ms: i64,
    },
    Phoneme {
        start: usize,
        end: usize,
        word: &'a str,
        ph: &'a str,
    },
}

impl Annotation<'_> {
    fn start(&self) -> usize {
        match self {
            Self::Pause { start, .. } | Self::Phoneme { start, .. } => *start,
        }
    }

    fn end(&self) -> usize {
        match self {
            Self::Pause { end, .. } | Self::Phoneme { end, .. } => *end,
        }
    }

    fn reserve(&self) -> usize {
        match self {
            Self::Pause { .. } => PAUSE_TAG_RESERVE,
            Self::Phoneme { .. } => PHONEME_TAG_RESERVE,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Pause { ms, .. } => render_break(*ms),
            Self::Phoneme { word, ph, .. } => render_phoneme(word, ph),
        }
    }
}

/// Expands shorthand annotations inside already escaped, length-checked paragraphs.
#[derive(Debug, Clone, Copy)]
pub struct ShorthandConverter {
    budget: ChunkBudget,
}

impl ShorthandConverter {
    pub fn new(budget: ChunkBudget) -> Self {
        Self { budget }
    }

    /// Convert every paragraph and wrap it in a prosody tag.
    ///
    /// When the expanded tags could push a paragraph past the limit, the
    /// paragraph is split in front of the first annotation that would
    /// overflow, and the rest is converted as a new paragraph right after it.
    pub fn convert(&self, mut paragraphs: Vec<Paragraph>, prosody: &Prosody) -> Vec<Paragraph> {
        let mut i = 0;

        while i < paragraphs.len() {
            let text = paragraphs[i].text().to_string();
            let mut annotations = scan(&text);
            let mut head = text.as_str();

            if let Some(split_at) = self.overflow_split(&text, &annotations) {
                debug!("Deferring shorthand from byte {} to a new paragraph", split_at);
                let (kept, deferred) = text.split_at(split_at);
                paragraphs.insert(i + 1, Paragraph::new(deferred));
                annotations.retain(|a| a.end() <= split_at);
                head = kept;
            }

            let converted = substitute(head, &annotations);
            paragraphs[i].update(render_prosody(&converted, prosody));
            i += 1;
        }

        paragraphs
    }

    /// Byte offset to split at, if the worst-case expansion overflows the limit.
    fn overflow_split(&self, text: &str, annotations: &[Annotation<'_>]) -> Option<usize> {
        let mut projected = text.chars().count();

        for annotation in annotations {
            projected += annotation.reserve();
            if projected > self.budget.limit && annotation.start() > 0 {
                return Some(annotation.start());
            }
        }

        None
    }
}

/// Find annotations against the unmodified text.
fn scan(text: &str) -> Vec<Annotation<'_>> {
    let mut annotations = Vec::new();

    for captures in annotation_pattern().captures_iter(text) {
        let (Some(whole), Some(payload)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let payload = payload.as_str();

        if let Some(seconds) = payload.strip_suffix(PAUSE_MARKER) {
            match seconds.trim().parse::<f64>() {
                Ok(seconds) if seconds.is_finite() => annotations.push(Annotation::Pause {
                    start: whole.start(),
                    end: whole.end(),
                    ms: (seconds * 1000.0) as i64,
                }),
                _ => warn!("Leaving pause '{}' as text: invalid duration", whole.as_str()),
            }
            continue;
        }

        // The preceding character is the word being overridden. The text is
        // already escaped, so an entity there counts as one character; a ']'
        // is the end of an earlier annotation.
        let before = &text[..whole.start()];
        let word_len = trailing_entity_len(before).or_else(|| {
            before
                .chars()
                .next_back()
                .filter(|c| *c != ']')
                .map(char::len_utf8)
        });
        match word_len {
            Some(len) => {
                let start = whole.start() - len;
                annotations.push(Annotation::Phoneme {
                    start,
                    end: whole.end(),
                    word: &text[start..whole.start()],
                    ph: payload,
                });
            }
            None => warn!("Leaving '{}' as text: no character to annotate", whole.as_str()),
        }
    }

    annotations
}

/// Build the converted text in one forward pass.
fn substitute(text: &str, annotations: &[Annotation<'_>]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;

    for annotation in annotations {
        result.push_str(&text[cursor..annotation.start()]);
        result.push_str(&annotation.render());
        cursor = annotation.end();
    }
    result.push_str(&text[cursor..]);

    result
}
