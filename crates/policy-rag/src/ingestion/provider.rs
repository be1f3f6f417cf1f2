//! Source document providers
//!
//! A provider hands the index builder raw extracted text plus a stable
//! source identifier per document. Documents whose text cannot be extracted
//! are logged and skipped; they never fail the whole load.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{FileType, SourceDocument};

#[cfg(feature = "pdf")]
const PDF_EXTRACT_TIMEOUT_SECS: u64 = 60;

/// Supplies the corpus to the index builder
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Load every document's extracted text
    async fn load_documents(&self) -> Result<Vec<SourceDocument>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Documents held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    documents: Vec<SourceDocument>,
}

impl StaticProvider {
    /// Create a provider over the given documents
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self { documents }
    }

    /// The built-in demo corpus of policy facts
    pub fn demo() -> Self {
        let facts = [
            ("demo/extras_cover.txt", "Extras cover includes dental, optical, and physio."),
            (
                "demo/gold_hospital_cover.txt",
                "Gold hospital cover includes private room and ambulance cover.",
            ),
            ("demo/claims.txt", "Claims can be submitted online or through the mobile app."),
            ("demo/bank_details.txt", "Update your bank details in Account Settings."),
            (
                "demo/direct_debit.txt",
                "Direct debit setup is available under billing preferences.",
            ),
            (
                "demo/lapsed_policies.txt",
                "Lapsed policies can be reactivated within 60 days online.",
            ),
        ];

        Self::new(
            facts
                .iter()
                .map(|(source, text)| SourceDocument::new(*source, FileType::Txt, *text))
                .collect(),
        )
    }
}

#[async_trait]
impl DocumentProvider for StaticProvider {
    async fn load_documents(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.documents.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Walks a directory of policy documents (txt, md, and pdf with the `pdf` feature)
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// Create a provider rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Extract text from one file, `None` for unsupported types
    fn extract(path: &Path) -> Result<Option<SourceDocument>> {
        let Some(file_type) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileType::from_extension)
        else {
            return Ok(None);
        };

        let text = match file_type {
            FileType::Pdf => Self::extract_pdf(path)?,
            _ => std::fs::read_to_string(path)?,
        };

        Ok(Some(SourceDocument::new(
            path.to_string_lossy().to_string(),
            file_type,
            text,
        )))
    }

    /// Extract PDF text on its own thread so a hung or panicking extractor
    /// only costs this one document
    #[cfg(feature = "pdf")]
    fn extract_pdf(path: &Path) -> Result<String> {
        use std::sync::mpsc;
        use std::time::Duration;

        let data = std::fs::read(path)?;
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text_from_mem(&data));
        });

        let failed = |reason: String| {
            Error::Internal(format!("PDF extraction failed for {}: {}", path.display(), reason))
        };

        match rx.recv_timeout(Duration::from_secs(PDF_EXTRACT_TIMEOUT_SECS)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(failed(e.to_string())),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(failed(format!(
                "timed out after {}s",
                PDF_EXTRACT_TIMEOUT_SECS
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(failed("extractor crashed".to_string()))
            }
        }
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(path: &Path) -> Result<String> {
        Err(Error::Config(format!(
            "{} is a PDF but the pdf feature is not enabled",
            path.display()
        )))
    }

    fn scan(root: &Path) -> Result<Vec<SourceDocument>> {
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Documents directory {} does not exist",
                root.display()
            )));
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        // Stable order keeps chunk positions reproducible
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            match Self::extract(&path) {
                Ok(Some(doc)) if doc.is_blank() => {
                    tracing::warn!(path = %path.display(), "Extraction yielded no text, skipping");
                }
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {
                    tracing::debug!(path = %path.display(), "Unsupported file type, skipping");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed document");
                }
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentProvider for DirectoryProvider {
    async fn load_documents(&self) -> Result<Vec<SourceDocument>> {
        let root = self.root.clone();
        let documents = tokio::task::spawn_blocking(move || Self::scan(&root))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        tracing::info!(
            "Loaded {} documents from {}",
            documents.len(),
            self.root.display()
        );
        Ok(documents)
    }

    fn name(&self) -> &str {
        "directory"
    }
}
