//! Document batching
//!
//! Splits an ordered list of in-memory documents into contiguous batches that respect a
//! byte ceiling and a file-count ceiling. Batches borrow the caller's documents and carry a
//! unique id that follows them through the dispatcher.

use crate::error::ScanError;

/// A single file's path and textual content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: String,
    content: String,
}

impl Document {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Size in bytes of the UTF-8 encoded content
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Size and count ceilings applied while batching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    max_bytes: u64,
    max_files: usize,
}

impl BatchLimits {
    /// Both limits must be strictly positive.
    pub fn new(max_bytes: u64, max_files: usize) -> Result<Self, ScanError> {
        if max_bytes == 0 {
            return Err(ScanError::Configuration(
                "batch byte limit must be greater than zero".to_string(),
            ));
        }
        if max_files == 0 {
            return Err(ScanError::Configuration(
                "batch file-count limit must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_bytes,
            max_files,
        })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }
}

/// A non-empty group of documents sent together in one scan request
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    id: String,
    documents: Vec<&'a Document>,
}

impl<'a> Batch<'a> {
    fn new(documents: Vec<&'a Document>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            documents,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn documents(&self) -> &[&'a Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.documents.iter().map(|doc| doc.size()).sum()
    }
}

/// Greedy single-pass split preserving input order.
///
/// A document that alone exceeds `max_bytes` is never split; it closes the running batch and
/// starts its own.
pub fn split_documents_into_batches(documents: &[Document], limits: BatchLimits) -> Vec<Batch<'_>> {
    let mut batches = Vec::new();

    let mut current_size: u64 = 0;
    let mut current_batch: Vec<&Document> = Vec::new();
    for document in documents {
        let document_size = document.size();

        if current_size + document_size > limits.max_bytes
            || current_batch.len() >= limits.max_files
        {
            if !current_batch.is_empty() {
                batches.push(Batch::new(std::mem::take(&mut current_batch)));
            }

            current_batch.push(document);
            current_size = document_size;
        } else {
            current_batch.push(document);
            current_size += document_size;
        }
    }

    if !current_batch.is_empty() {
        batches.push(Batch::new(current_batch));
    }

    batches
}
