use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::Batch;
use crate::error::ScanError;

/// Zip archive built entirely in memory for upload
#[derive(Debug, Clone)]
pub struct InMemoryZip {
    bytes: Vec<u8>,
    files: usize,
}

impl InMemoryZip {
    pub const UPLOAD_FILE_NAME: &'static str = "multiple_files_scan.zip";

    /// Pack every document of `batch` under its path, without leading slashes
    pub fn from_batch(batch: &Batch<'_>) -> Result<Self, ScanError> {
        Self::from_entries(
            batch
                .documents()
                .iter()
                .map(|doc| (doc.path(), doc.content().as_bytes())),
        )
    }

    pub fn from_entries<'a, I>(entries: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let mut files = 0;
        for (path, content) in entries {
            zip.start_file(path.trim_start_matches('/'), options)?;
            zip.write_all(content)?;
            files += 1;
        }

        let bytes = zip.finish()?.into_inner();
        Ok(Self { bytes, files })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn file_count(&self) -> usize {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchLimits, Document, split_documents_into_batches};
    use std::io::Read;

    #[test]
    fn test_batch_round_trips_through_zip() {
        let documents = vec![
            Document::new("/repo/src/main.rs", "fn main() {}"),
            Document::new("repo/.env", "TOKEN=abc"),
        ];
        let batches = split_documents_into_batches(&documents, BatchLimits::new(1024, 10).unwrap());
        let zip = InMemoryZip::from_batch(&batches[0]).unwrap();
        assert_eq!(zip.file_count(), 2);

        let mut archive = zip::ZipArchive::new(Cursor::new(zip.to_vec())).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("repo/src/main.rs")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "fn main() {}");
        assert!(archive.by_name("repo/.env").is_ok());
    }
}
