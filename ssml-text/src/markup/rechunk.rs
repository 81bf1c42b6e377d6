//! Reassembly of rendered segments into budget-bounded SSML chunks.
//!
//! A `<prosody>` span that crosses a chunk cut is closed at the end of the
//! chunk and reopened with the same opening tag at the start of the next one.
//! Only one span is tracked at a time.

use log::debug;

use super::render::render;
use super::{MarkupSegment, TagKind};
use crate::chunker::TextChunker;
use crate::config::ChunkBudget;
use crate::error::Result;
use crate::escape::escape;

const PROSODY_CLOSE: &str = "</prosody>";

/// An open prosody span carried across segments.
#[derive(Debug, Clone)]
struct ProsodySpan {
    depth: usize,
    opening: String,
}

#[derive(Debug, Default)]
struct Assembly {
    chunks: Vec<String>,
    current: String,
    length: usize,
}

impl Assembly {
    fn push_str(&mut self, text: &str) {
        self.current.push_str(text);
        self.length += char_len(text);
    }

    /// Emit the current chunk and reopen the span in the next one.
    ///
    /// A span whose opening tag is still the last thing in the chunk has no
    /// content yet, so the tag moves to the next chunk instead of leaving an
    /// empty pair behind.
    fn cut(&mut self, span: Option<&ProsodySpan>) {
        let pending = span.filter(|s| {
            !s.opening.is_empty() && self.current.ends_with(s.opening.as_str())
        });
        if let Some(span) = pending {
            let body = self.current.len() - span.opening.len();
            self.current.truncate(body);
        }

        if !self.current.is_empty() {
            if span.is_some() && pending.is_none() {
                self.current.push_str(PROSODY_CLOSE);
            }
            self.chunks.push(std::mem::take(&mut self.current));
        }
        self.length = 0;

        if let Some(span) = span {
            debug!("Reopening prosody span in chunk {}", self.chunks.len());
            self.push_str(&span.opening);
        }
    }
}

/// Turns flattened SSML segments into chunks that fit the budget.
#[derive(Debug, Clone, Copy)]
pub struct MarkupRechunker {
    chunker: TextChunker,
}

impl MarkupRechunker {
    pub fn new(budget: ChunkBudget) -> Self {
        Self {
            chunker: TextChunker::new(budget),
        }
    }

    /// Split, escape, render and pack segments into SSML chunks.
    ///
    /// Each segment's text is first split by the [`TextChunker`] so an overlong
    /// segment becomes several segments sharing its tag. The last chunk may
    /// exceed the limit when its final segment does not fit anywhere else.
    pub fn rechunk(&self, segments: &[MarkupSegment]) -> Result<Vec<String>> {
        let mut prepared = Vec::with_capacity(segments.len());
        for segment in segments {
            for paragraph in self.chunker.split(&segment.text)? {
                prepared.push(segment.with_text(escape(paragraph.text())));
            }
        }

        let rendered = prepared
            .iter()
            .map(render)
            .collect::<Result<Vec<String>>>()?;

        let Some((last, body)) = rendered.split_last() else {
            return Ok(Vec::new());
        };

        let limit = self.chunker.budget().limit;
        let mut assembly = Assembly::default();
        let mut span: Option<ProsodySpan> = None;

        for (i, text) in body.iter().enumerate() {
            let segment = &prepared[i];
            let next = &prepared[i + 1];

            if segment.kind == TagKind::Prosody {
                let inner = text.strip_suffix(PROSODY_CLOSE).unwrap_or(text.as_str());
                let opening = inner
                    .find('>')
                    .map(|end| inner[..=end].to_string())
                    .unwrap_or_default();
                span = Some(ProsodySpan {
                    depth: segment.depth,
                    opening,
                });
                assembly.push_str(inner);
            } else {
                assembly.push_str(text);
            }

            if let Some(active) = &span {
                let continues = next.depth > active.depth
                    || (next.depth == active.depth && next.kind == TagKind::TrailingText);
                if !continues {
                    assembly.push_str(PROSODY_CLOSE);
                    span = None;
                }
            }

            if assembly.length + char_len(&rendered[i + 1]) > limit {
                debug!("Cutting SSML chunk at segment {} ({} chars)", i + 1, assembly.length);
                assembly.cut(span.as_ref());
            }
        }

        if assembly.length + char_len(last) > limit {
            assembly.cut(span.as_ref());
        }
        assembly.push_str(last);
        if span.is_some() {
            assembly.push_str(PROSODY_CLOSE);
        }

        let Assembly {
            mut chunks, current, ..
        } = assembly;
        if !current.is_empty() || chunks.is_empty() {
            chunks.push(current);
        }

        Ok(chunks)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
