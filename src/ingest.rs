//! Eager ingestion entry points.
//!
//! [`Ingestor`] owns an [`IngestConfig`] and a [`Converter`]. Single inputs
//! are resolved (paths validated, URLs downloaded), converted on the blocking
//! pool, and exported in the configured [`crate::OutputFormat`]. Directory
//! batches fan out over `config.concurrency` files at a time and isolate
//! per-file failures. Use [`crate::stream`] to receive batch results as they
//! complete instead of waiting for the whole directory.

use crate::backend::{self, extension_label, ConvertOptions, Converter, DefaultConverter};
use crate::config::IngestConfig;
use crate::error::{FileError, IngestError};
use crate::output::{BatchStats, DirectoryOutput, IngestedDocument};
use crate::pipeline::{export, input};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Glob applied when a directory is ingested without a pattern.
pub const DEFAULT_PATTERN: &str = "*";

/// Converts documents into [`IngestedDocument`]s.
///
/// Cheap to clone: the config and converter are shared.
///
/// # Example
/// ```rust,no_run
/// use edgequake_ingest::{IngestConfig, Ingestor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ingestor = Ingestor::new(IngestConfig::default());
/// let doc = ingestor.ingest("report.pdf").await?;
/// for chunk in doc.get_chunks(1000, 100)? {
///     println!("{chunk}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Ingestor {
    config: IngestConfig,
    converter: Arc<dyn Converter>,
}

impl fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingestor")
            .field("config", &self.config)
            .field("converter", &self.converter.name())
            .finish()
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}

impl Ingestor {
    /// An ingestor using the built-in backends.
    pub fn new(config: IngestConfig) -> Self {
        Self::with_converter(config, Arc::new(DefaultConverter::new()))
    }

    /// An ingestor delegating conversion to `converter`.
    pub fn with_converter(config: IngestConfig, converter: Arc<dyn Converter>) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest a local file path or HTTP(S) URL.
    ///
    /// # Errors
    /// `FileNotFound`, `PermissionDenied` or `InvalidInput` for bad paths,
    /// `DownloadFailed`/`DownloadTimeout` for URLs, `UnsupportedFormat` for
    /// unknown extensions, and whatever the converter returns.
    pub async fn ingest(&self, input_str: impl AsRef<str>) -> Result<IngestedDocument, IngestError> {
        let input_str = input_str.as_ref();
        info!("Starting ingestion: {}", input_str);

        let resolved = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        self.convert_file(resolved.path()).await
    }

    /// Ingest a local file.
    pub async fn ingest_path(&self, path: impl AsRef<Path>) -> Result<IngestedDocument, IngestError> {
        let path = input::resolve_local(path.as_ref())?;
        self.convert_file(&path).await
    }

    /// Ingest an in-memory document.
    ///
    /// `bytes` are written to a temp file carrying `filename`'s extension, so
    /// format detection works as for files on disk. The temp file is removed
    /// on return, including on error. The result reports `filename` and
    /// `bytes.len()` rather than the temp file's.
    pub async fn ingest_from_bytes(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<IngestedDocument, IngestError> {
        let name_path = Path::new(filename);
        if !backend::is_supported(name_path) {
            return Err(IngestError::UnsupportedFormat {
                path: name_path.to_path_buf(),
                extension: extension_label(name_path),
            });
        }
        let suffix = extension_label(name_path);

        let mut tmp = tempfile::Builder::new()
            .prefix("ingest-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| IngestError::Internal(format!("tempfile: {e}")))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| IngestError::Internal(format!("tempfile write: {e}")))?;

        let mut doc = self.convert_file(tmp.path()).await?;
        doc.filename = filename.to_string();
        doc.file_size = Some(bytes.len() as u64);
        Ok(doc)
    }

    /// Ingest every supported file in `dir` matching `pattern` (default
    /// [`DEFAULT_PATTERN`]). Subdirectories are not descended into.
    ///
    /// Per-file failures are logged, reported to the progress callback, and
    /// collected in [`DirectoryOutput::failures`]; the batch always runs to
    /// completion. Documents are returned in path order.
    ///
    /// # Errors
    /// `DirectoryNotFound` if `dir` is not a directory, `InvalidPattern` if
    /// the glob does not parse.
    pub async fn ingest_directory(
        &self,
        dir: impl AsRef<Path>,
        pattern: Option<&str>,
    ) -> Result<DirectoryOutput, IngestError> {
        let start = Instant::now();
        let files = list_directory(dir.as_ref(), pattern)?;
        let total_files = files.len();
        info!("Ingesting {} files from {}", total_files, dir.as_ref().display());

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total_files);
        }

        let results: Vec<(PathBuf, Result<IngestedDocument, FileError>)> =
            stream::iter(files.into_iter().map(|path| {
                let this = self.clone();
                async move {
                    let result = this.ingest_batch_file(&path).await;
                    (path, result)
                }
            }))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(doc) => succeeded.push((path, doc)),
                Err(e) => failures.push(e),
            }
        }
        succeeded.sort_by(|a, b| a.0.cmp(&b.0));
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        let documents: Vec<IngestedDocument> = succeeded.into_iter().map(|(_, doc)| doc).collect();

        let stats = BatchStats {
            total_files,
            ingested_files: documents.len(),
            failed_files: failures.len(),
            total_pages: documents.iter().map(|d| d.page_count).sum(),
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Directory ingestion complete: {}/{} files, {}ms total",
            stats.ingested_files, total_files, stats.total_duration_ms
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total_files, stats.ingested_files);
        }

        Ok(DirectoryOutput {
            documents,
            failures,
            stats,
        })
    }

    /// Blocking wrapper around [`Ingestor::ingest`].
    ///
    /// Creates a temporary tokio runtime; do not call from async code.
    pub fn ingest_sync(&self, input_str: impl AsRef<str>) -> Result<IngestedDocument, IngestError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| IngestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.ingest(input_str))
    }

    /// One file of a batch, with progress events and failure isolation.
    pub(crate) async fn ingest_batch_file(&self, path: &Path) -> Result<IngestedDocument, FileError> {
        let name = backend::file_name(path);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_file_start(&name);
        }

        match self.convert_file(path).await {
            Ok(doc) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_file_complete(&name, doc.page_count, doc.content.len());
                }
                Ok(doc)
            }
            Err(e) => {
                warn!("Failed to ingest {}: {}", path.display(), e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_file_error(&name, &e.to_string());
                }
                Err(FileError::new(path.to_path_buf(), &e))
            }
        }
    }

    /// Convert and export an existing local file.
    async fn convert_file(&self, path: &Path) -> Result<IngestedDocument, IngestError> {
        if !backend::is_supported(path) {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension_label(path),
            });
        }

        let start = Instant::now();
        let converter = Arc::clone(&self.converter);
        let options = ConvertOptions {
            extract_images: self.config.extract_images,
            extract_tables: self.config.extract_tables,
            page_separator: self.config.page_separator.clone(),
        };
        let format = self.config.output_format;
        let owned = path.to_path_buf();

        debug!("Converting {} with {} backend", path.display(), converter.name());
        let (page_count, content) = tokio::task::spawn_blocking(move || {
            let doc = converter.convert(&owned, &options)?;
            let content = export::extract_content(doc.as_ref(), format)?;
            Ok::<_, IngestError>((doc.page_count(), content))
        })
        .await
        .map_err(|e| IngestError::Internal(format!("conversion task failed: {e}")))??;

        let processing_time = start.elapsed().as_secs_f64();
        let file_size = tokio::fs::metadata(path).await.ok().map(|m| m.len());
        let filename = backend::file_name(path);

        info!(
            "Ingested {}: {} pages, {} chars in {:.2}s",
            filename,
            page_count,
            content.len(),
            processing_time
        );

        Ok(IngestedDocument {
            content,
            filename,
            page_count,
            processing_time,
            format,
            file_size,
        })
    }
}

/// Ingest one file or URL with the default configuration and return its
/// content.
pub async fn quick_ingest(input_str: impl AsRef<str>) -> Result<String, IngestError> {
    Ingestor::default().ingest(input_str).await.map(|doc| doc.content)
}

/// Supported regular files directly under `dir` matching `pattern`, sorted.
pub(crate) fn list_directory(dir: &Path, pattern: Option<&str>) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let pattern = pattern.unwrap_or(DEFAULT_PATTERN);
    let full = PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy())).join(pattern);
    let entries = glob::glob(&full.to_string_lossy()).map_err(|e| IngestError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file() && backend::is_supported(path))
        .collect();
    files.sort();

    debug!("Matched {} supported files in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.md"), "# B\n").unwrap();
        fs::write(dir.path().join("a.csv"), "x,y\n1,2\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.md")).unwrap();
        dir
    }

    #[test]
    fn lists_supported_files_sorted() {
        let dir = fixture_dir();
        let names: Vec<String> = list_directory(dir.path(), None)
            .unwrap()
            .iter()
            .map(|p| backend::file_name(p))
            .collect();
        assert_eq!(names, vec!["a.csv", "b.md"]);
    }

    #[test]
    fn pattern_filters_files() {
        let dir = fixture_dir();
        let files = list_directory(dir.path(), Some("*.md")).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("b.md"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let dir = fixture_dir();
        let err = list_directory(dir.path(), Some("[")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidPattern { .. }));
    }

    #[test]
    fn missing_directory() {
        let err = list_directory(Path::new("/no/such/dir"), None).unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
    }

    #[test]
    fn ingest_sync_reads_markdown() {
        let dir = fixture_dir();
        let path = dir.path().join("b.md");
        let doc = Ingestor::default().ingest_sync(path.to_str().unwrap()).unwrap();
        assert_eq!(doc.content, "# B\n");
        assert_eq!(doc.filename, "b.md");
        assert_eq!(doc.file_size, Some(4));
    }

    #[test]
    fn debug_shows_converter_name() {
        let s = format!("{:?}", Ingestor::default());
        assert!(s.contains("\"default\""), "got: {s}");
    }
}
