//! Source document and chunk types with source tracking for disclosure

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported source file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document (text extracted with pdf-extract)
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Text that did not come from a file (demo corpus, API callers)
    Inline,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// Raw extracted text of one policy document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    /// Stable source identifier, usually the originating file path
    pub source: String,
    /// File type the text was extracted from
    pub file_type: FileType,
    /// Extracted text
    pub text: String,
}

impl SourceDocument {
    /// Create a document from already extracted text
    pub fn new(source: impl Into<String>, file_type: FileType, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            file_type,
            text: text.into(),
        }
    }

    /// Create an inline document (no backing file)
    pub fn inline(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(source, FileType::Inline, text)
    }

    /// True when extraction yielded no usable text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A window of text from a source document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Text content
    pub text: String,
    /// Source identifier of the originating document
    pub source: String,
    /// Position of this chunk in the corpus (insertion order)
    pub position: u32,
    /// Character offsets in the source document
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        text: String,
        source: String,
        position: u32,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        Self {
            text,
            source,
            position,
            char_start,
            char_end,
        }
    }

    /// Filename component of the source identifier
    pub fn filename(&self) -> String {
        source_filename(&self.source)
    }
}

/// Filename component of a source identifier, or the identifier itself
fn source_filename(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string())
}
