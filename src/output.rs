//! Result types returned by ingestion.

use crate::chunk::Chunker;
use crate::config::OutputFormat;
use crate::error::{FileError, IngestError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A converted document: exported content plus a little metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedDocument {
    /// The document exported in [`IngestedDocument::format`].
    pub content: String,
    /// Original file name (not the full path).
    pub filename: String,
    pub page_count: usize,
    /// Wall-clock conversion time in seconds.
    pub processing_time: f64,
    pub format: OutputFormat,
    /// Source size in bytes, when known.
    pub file_size: Option<u64>,
}

impl IngestedDocument {
    /// Write `content` to `path` as UTF-8.
    ///
    /// Parent directories are created. The file is written to a sibling
    /// temp path and renamed into place, so readers never see a partial file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IngestError> {
        let path = path.as_ref();
        let write_err = |source| IngestError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, self.content.as_bytes()).map_err(write_err)?;
        std::fs::rename(&tmp_path, path).map_err(write_err)
    }

    /// Flat JSON object of every field, with `format` as its string value.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "content": self.content,
            "filename": self.filename,
            "page_count": self.page_count,
            "processing_time": self.processing_time,
            "format": self.format.as_str(),
            "file_size": self.file_size,
        })
    }

    /// Split `content` into overlapping retrieval chunks.
    ///
    /// Fails if `overlap >= chunk_size` or `chunk_size == 0`.
    pub fn get_chunks(&self, chunk_size: usize, overlap: usize) -> Result<Vec<String>, IngestError> {
        Ok(self.chunks(&Chunker::new(chunk_size, overlap)?))
    }

    /// Split `content` with an already-validated chunker.
    pub fn chunks(&self, chunker: &Chunker) -> Vec<String> {
        chunker.chunks(&self.content)
    }
}

/// Outcome of ingesting a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryOutput {
    /// Successfully ingested documents, in path order.
    pub documents: Vec<IngestedDocument>,
    /// Files that failed; never aborts the batch.
    pub failures: Vec<FileError>,
    pub stats: BatchStats,
}

/// Aggregate numbers for a directory batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Supported files matched by the pattern.
    pub total_files: usize,
    pub ingested_files: usize,
    pub failed_files: usize,
    /// Pages across all ingested documents.
    pub total_pages: usize,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> IngestedDocument {
        IngestedDocument {
            content: content.to_string(),
            filename: "report.pdf".into(),
            page_count: 3,
            processing_time: 1.5,
            format: OutputFormat::Markdown,
            file_size: Some(2048),
        }
    }

    #[test]
    fn to_dict_is_flat_with_string_format() {
        let d = doc("# Title").to_dict();
        assert_eq!(d["content"], "# Title");
        assert_eq!(d["filename"], "report.pdf");
        assert_eq!(d["page_count"], 3);
        assert_eq!(d["processing_time"], 1.5);
        assert_eq!(d["format"], "markdown");
        assert_eq!(d["file_size"], 2048);
        assert_eq!(d.as_object().unwrap().len(), 6);
    }

    #[test]
    fn to_dict_null_file_size() {
        let mut d = doc("x");
        d.file_size = None;
        assert!(d.to_dict()["file_size"].is_null());
    }

    #[test]
    fn save_writes_utf8_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.md");
        doc("Grüße — ünïcödé").save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Grüße — ünïcödé");
        assert!(!dir.path().join("nested/out/report.md.tmp").exists());
    }

    #[test]
    fn get_chunks_delegates_and_validates() {
        let d = doc(&"word ".repeat(400));
        let chunks = d.get_chunks(500, 50).unwrap();
        assert!(chunks.len() >= 4);
        assert!(d.get_chunks(50, 50).is_err());
        assert_eq!(doc("short").get_chunks(1000, 100).unwrap(), vec!["short"]);
    }
}
