//! Text preparation for budget-limited speech synthesis requests.
//!
//! Provides:
//! - Budget-aware splitting of plain text at punctuation boundaries
//! - Escaping of SSML reserved characters
//! - SSML flattening and re-chunking with `<prosody>` spans reopened across chunks
//! - `[:N秒]` / `字[:ph]` shorthand expansion
//! - A [`Document`] of paragraphs that all of the above insert into

pub mod chunker;
pub mod config;
pub mod document;
pub mod error;
pub mod escape;
pub mod loader;
pub mod markup;
pub mod paragraph;
pub mod shorthand;

pub use chunker::TextChunker;
pub use config::{ChunkBudget, EditorConfig};
pub use document::{Document, Position};
pub use error::{Result, TextError};
pub use markup::{MarkupRechunker, MarkupSegment, NoopListener, Prosody, TagKind, VoiceListener};
pub use paragraph::Paragraph;
pub use shorthand::ShorthandConverter;
