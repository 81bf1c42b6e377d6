//! Loading and decoding of input files.

use encoding_rs::Encoding;
use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::error::{Result, TextError};

/// Extensions routed to the SSML path.
const MARKUP_EXTENSIONS: &[&str] = &[".ssml", ".xml"];

/// Lowercased extension with its leading dot, or an empty string.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Whether the file should be parsed as SSML rather than plain text.
pub fn is_markup_file(path: &Path) -> bool {
    MARKUP_EXTENSIONS.contains(&file_extension(path).as_str())
}

/// Read a file and decode it with the given WHATWG encoding label.
///
/// A byte order mark overrides the label. Malformed sequences are replaced
/// with U+FFFD.
///
/// # Errors
/// * [`TextError::UnsupportedFileExtension`] if the extension is not in `supported`
/// * [`TextError::UnknownEncoding`] if the label is not recognised
/// * [`TextError::Io`] if the file cannot be read
pub fn load_text_file(path: &Path, encoding: &str, supported: &[String]) -> Result<String> {
    let extension = file_extension(path);
    if !supported.iter().any(|s| s.eq_ignore_ascii_case(&extension)) {
        return Err(TextError::UnsupportedFileExtension(extension));
    }

    let encoding = Encoding::for_label(encoding.trim().as_bytes())
        .ok_or_else(|| TextError::UnknownEncoding(encoding.to_string()))?;

    let bytes = fs::read(path)?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            "{} contains invalid {} sequences; they were replaced",
            path.display(),
            used.name()
        );
    }
    debug!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), used.name());

    Ok(text.into_owned())
}
