//! Conversion backends: the seam between this crate and document engines.
//!
//! Ingestion never parses documents itself. It hands a path to a
//! [`Converter`] and gets back a [`Document`] that can export itself as
//! Markdown, HTML, JSON or text. Any engine can be plugged in by implementing
//! [`Converter`]; [`DefaultConverter`] wires up the built-in backends:
//!
//! | Format | Backend |
//! |--------|---------|
//! | PDF | [`pdf::PdfBackend`] (pdfium text layer) |
//! | Markdown, CSV, HTML | [`text::TextBackend`] |
//! | DOCX, PPTX, XLSX | none built in → [`IngestError::NoBackend`] |

pub mod pdf;
pub mod text;

use crate::config::PageSeparator;
use crate::error::IngestError;
use crate::pipeline::markup::markdown_to_html;
use pulldown_cmark::escape::escape_html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File extensions accepted for ingestion (lowercase, with dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".pptx", ".xlsx", ".html", ".md", ".csv"];

/// Document formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Html,
    Markdown,
    Csv,
}

impl InputFormat {
    /// Detect the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "html" => Some(Self::Html),
            "md" => Some(Self::Markdown),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Pptx => "PPTX",
            Self::Xlsx => "XLSX",
            Self::Html => "HTML",
            Self::Markdown => "Markdown",
            Self::Csv => "CSV",
        };
        f.write_str(name)
    }
}

/// True if the path has one of [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    InputFormat::from_path(path).is_some()
}

/// Hints passed from [`crate::IngestConfig`] to the converter.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub extract_images: bool,
    pub extract_tables: bool,
    pub page_separator: PageSeparator,
}

/// A converted document, as produced by a [`Converter`].
pub trait Document: Send {
    fn page_count(&self) -> usize;

    fn export_to_markdown(&self) -> Result<String, IngestError>;

    fn export_to_html(&self) -> Result<String, IngestError>;

    fn export_to_json(&self) -> Result<String, IngestError>;

    /// Plain-text export, if the engine has one. Callers fall back to
    /// Markdown on `None`.
    fn export_to_text(&self) -> Option<Result<String, IngestError>> {
        None
    }
}

/// Turns a file on disk into a [`Document`].
///
/// Implementations are called from the blocking thread pool and may do
/// CPU-heavy or blocking work.
pub trait Converter: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Box<dyn Document>, IngestError>;
}

// ── Built-in document model ──────────────────────────────────────────────

/// One page of a [`StructuredDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-indexed page number.
    pub number: usize,
    /// Page rendered as Markdown.
    pub markdown: String,
    /// Page as plain text.
    pub text: String,
}

/// The document produced by the built-in backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    /// Source file name.
    pub name: String,
    pub source_format: InputFormat,
    pub title: Option<String>,
    pub pages: Vec<PageContent>,
    #[serde(skip)]
    pub separator: PageSeparator,
}

impl StructuredDocument {
    fn join_pages(&self, pick: impl Fn(&PageContent) -> &str) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.separator.render(page.number));
            }
            out.push_str(pick(page).trim_end());
        }
        out.push('\n');
        out
    }
}

impl Document for StructuredDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn export_to_markdown(&self) -> Result<String, IngestError> {
        Ok(self.join_pages(|p| &p.markdown))
    }

    fn export_to_html(&self) -> Result<String, IngestError> {
        let title = self.title.as_deref().unwrap_or(&self.name);
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>");
        escape_html(&mut html, title).map_err(|e| IngestError::ExportFailed {
            format: "html".into(),
            detail: e.to_string(),
        })?;
        html.push_str("</title>\n</head>\n<body>\n");

        for page in &self.pages {
            html.push_str(&format!("<section class=\"page\" data-page=\"{}\">\n", page.number));
            html.push_str(&markdown_to_html(&page.markdown));
            html.push_str("</section>\n");
        }

        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    fn export_to_json(&self) -> Result<String, IngestError> {
        serde_json::to_string_pretty(self).map_err(|e| IngestError::ExportFailed {
            format: "json".into(),
            detail: e.to_string(),
        })
    }

    fn export_to_text(&self) -> Option<Result<String, IngestError>> {
        Some(Ok(self.join_pages(|p| &p.text)))
    }
}

// ── Default dispatch ─────────────────────────────────────────────────────

/// Routes each file to the built-in backend for its format.
#[derive(Debug, Default)]
pub struct DefaultConverter {
    pdf: pdf::PdfBackend,
    text: text::TextBackend,
}

impl DefaultConverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Converter for DefaultConverter {
    fn name(&self) -> &'static str {
        "default"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Box<dyn Document>, IngestError> {
        match InputFormat::from_path(path) {
            Some(InputFormat::Pdf) => self.pdf.convert(path, options),
            Some(InputFormat::Markdown | InputFormat::Csv | InputFormat::Html) => {
                self.text.convert(path, options)
            }
            Some(format) => Err(IngestError::NoBackend {
                format: format.to_string(),
            }),
            None => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension_label(path),
            }),
        }
    }
}

/// Final path component as a `String`, empty when there is none.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extension with leading dot, or `(none)`.
pub(crate) fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| "(none)".to_string())
}
