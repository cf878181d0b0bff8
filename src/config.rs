//! Configuration types for document ingestion.
//!
//! All ingestion behaviour is controlled through [`IngestConfig`], built via
//! its [`IngestConfigBuilder`]. One struct holds every knob so a config can be
//! shared across concurrent file tasks and logged in full.

use crate::chunk::{Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::IngestError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for document ingestion.
///
/// Built via [`IngestConfig::builder()`] or using [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_ingest::{IngestConfig, OutputFormat};
///
/// let config = IngestConfig::builder()
///     .output_format(OutputFormat::Html)
///     .concurrency(8)
///     .chunking(800, 100)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// Which export of the converted document becomes `content`. Default: Markdown.
    pub output_format: OutputFormat,

    /// Ask the backend to mark embedded images. Default: false.
    pub extract_images: bool,

    /// Ask the backend to render tabular sources as tables. Default: true.
    pub extract_tables: bool,

    /// Separator between pages in Markdown and text exports. Default: None.
    pub page_separator: PageSeparator,

    /// Files converted at once during directory ingestion. Default: 4.
    ///
    /// Conversion runs on the blocking thread pool; raising this past the
    /// core count mostly adds memory pressure for large PDFs.
    pub concurrency: usize,

    /// Window length for [`crate::IngestedDocument::chunks`] users. Default: 1000.
    pub chunk_size: usize,

    /// Window overlap for chunking. Default: 100.
    pub chunk_overlap: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-file progress callback for directory ingestion.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            extract_images: false,
            extract_tables: true,
            page_separator: PageSeparator::default(),
            concurrency: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("output_format", &self.output_format)
            .field("extract_images", &self.extract_images)
            .field("extract_tables", &self.extract_tables)
            .field("page_separator", &self.page_separator)
            .field("concurrency", &self.concurrency)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }

    /// The chunker described by `chunk_size` / `chunk_overlap`.
    pub fn chunker(&self) -> Result<Chunker, IngestError> {
        Chunker::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn extract_tables(mut self, v: bool) -> Self {
        self.config.extract_tables = v;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(IngestError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        c.chunker()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Export format of [`crate::IngestedDocument::content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
    Json,
    Text,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }

    /// Conventional file extension for saved output, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(IngestError::InvalidConfig(format!(
                "Unknown output format '{other}'. Use: markdown, html, json, text"
            ))),
        }
    }
}

/// How to separate pages in the Markdown and text exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string placed before the given page (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let c = IngestConfig::builder().build().unwrap();
        assert_eq!(c.output_format, OutputFormat::Markdown);
        assert!(c.extract_tables);
        assert!(!c.extract_images);
        assert_eq!(c.chunker().unwrap(), Chunker::default());
    }

    #[test]
    fn builder_rejects_bad_chunking() {
        let err = IngestConfig::builder().chunking(100, 100).build().unwrap_err();
        assert!(matches!(err, IngestError::InvalidChunkParams { .. }));
    }

    #[test]
    fn concurrency_is_clamped() {
        let c = IngestConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn output_format_round_trips_through_str() {
        for f in [
            OutputFormat::Markdown,
            OutputFormat::Html,
            OutputFormat::Json,
            OutputFormat::Text,
        ] {
            assert_eq!(f.to_string().parse::<OutputFormat>().unwrap(), f);
        }
        assert!("docx".parse::<OutputFormat>().is_err());
        assert_eq!(
            serde_json::to_string(&OutputFormat::Html).unwrap(),
            "\"html\""
        );
    }

    #[test]
    fn separator_render() {
        assert_eq!(PageSeparator::None.render(2), "\n\n");
        assert_eq!(PageSeparator::Comment.render(3), "\n\n<!-- page 3 -->\n\n");
        assert_eq!(
            PageSeparator::Custom("***".into()).render(1),
            "\n\n***\n\n"
        );
    }
}
