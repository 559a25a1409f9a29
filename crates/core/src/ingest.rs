use crate::chunking::{build_chunks, ChunkingConfig};
use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::{DocumentFingerprint, IngestError, IngestionOptions, TextChunk};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub struct LoadedDocument {
    pub fingerprint: DocumentFingerprint,
    pub chunks: Vec<TextChunk>,
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn load_document_chunks(
    path: &Path,
    options: &IngestionOptions,
) -> Result<LoadedDocument, IngestError> {
    load_document_chunks_with(&LopdfExtractor, path, options)
}

/// Extracts every page of `path` and splits each page into chunks.
/// Chunk indices run across pages so ids stay unique within the document.
pub fn load_document_chunks_with<X>(
    extractor: &X,
    path: &Path,
    options: &IngestionOptions,
) -> Result<LoadedDocument, IngestError>
where
    X: PdfExtractor + ?Sized,
{
    ChunkingConfig::from(options).validate()?;

    if !path.is_file() {
        return Err(IngestError::MissingDocument(path.to_path_buf()));
    }

    let checksum = digest_file(path)?;
    let document_id = generate_document_id(path);
    let source_path = path.to_string_lossy().to_string();
    let pages = extractor.extract_pages(path)?;

    let mut chunks = Vec::new();
    let mut cursor = 0u64;
    for page in &pages {
        let (page_chunks, next_cursor) = build_chunks(
            &document_id,
            &source_path,
            page.number,
            &page.text,
            options,
            cursor,
        )?;
        cursor = next_cursor;
        chunks.extend(page_chunks);
    }

    if chunks.is_empty() {
        return Err(IngestError::EmptyDocument(path.to_path_buf()));
    }

    let fingerprint = DocumentFingerprint {
        document_id,
        source_path,
        checksum,
        page_count: pages.len(),
        ingested_at: Utc::now(),
    };

    info!(
        path = %fingerprint.source_path,
        pages = fingerprint.page_count,
        chunks = chunks.len(),
        "document chunked"
    );

    Ok(LoadedDocument {
        fingerprint,
        chunks,
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{digest_file, load_document_chunks, load_document_chunks_with};
    use crate::extractor::{PageText, PdfExtractor};
    use crate::{IngestError, IngestionOptions};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct FakeExtractor {
        pages: Vec<PageText>,
    }

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<PageText>, IngestError> {
            Ok(self.pages.clone())
        }
    }

    #[test]
    fn checksum_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file_path = dir.path().join("a.pdf");
        fs::write(&file_path, b"abc")?;

        let first = digest_file(&file_path)?;
        let second = digest_file(&file_path)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn missing_pdf_is_a_startup_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("simple-sab.pdf");
        match load_document_chunks(&path, &IngestionOptions::default()) {
            Err(IngestError::MissingDocument(reported)) => assert_eq!(reported, path),
            other => panic!("expected MissingDocument, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn pages_are_chunked_with_running_indices() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("manual.pdf");
        fs::write(&path, b"%PDF-1.4\n%stub")?;

        let extractor = FakeExtractor {
            pages: vec![
                PageText {
                    number: 1,
                    text: "Slash tires. Clog drains".to_string(),
                },
                PageText {
                    number: 2,
                    text: "Misfile orders".to_string(),
                },
            ],
        };
        let options = IngestionOptions {
            chunk_size: 14,
            chunk_overlap: 0,
            ..IngestionOptions::default()
        };

        let loaded = load_document_chunks_with(&extractor, &path, &options)?;

        assert_eq!(loaded.fingerprint.page_count, 2);
        let summary = loaded
            .chunks
            .iter()
            .map(|chunk| (chunk.page, chunk.chunk_index, chunk.text.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![(1, 0, "Slash tires"), (1, 1, "Clog drains"), (2, 2, "Misfile orders")]
        );
        Ok(())
    }

    #[test]
    fn invalid_chunking_is_rejected_before_reading() {
        let options = IngestionOptions {
            chunk_size: 10,
            chunk_overlap: 20,
            ..IngestionOptions::default()
        };
        let result = load_document_chunks(Path::new("does-not-matter.pdf"), &options);
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }
}
