//! PDF backend: per-page text extraction through pdfium.
//!
//! pdfium is bound once per process through `pdfium-auto`, which downloads
//! and caches the platform library on first use (or honours
//! `PDFIUM_LIB_PATH`). Every conversion shares that binding: dropping a
//! `Pdfium` tears the library down, so concurrent conversions must never own
//! one each. FFI calls are serialised by pdfium-render's `thread_safe`
//! feature. The text layer is read page by page; scanned PDFs
//! without a text layer come out as empty pages, since OCR is the job of a
//! full conversion engine plugged in through [`super::Converter`].

use super::{file_name, ConvertOptions, Converter, Document, InputFormat, PageContent, StructuredDocument};
use crate::error::IngestError;
use crate::pipeline::normalize::clean_text;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Marker inserted into a page's Markdown for each embedded image.
pub const IMAGE_PLACEHOLDER: &str = "<!-- image -->";

static PDFIUM: OnceCell<Pdfium> = OnceCell::new();

/// The process-wide pdfium binding, created on first call.
///
/// A failed bind is not cached; the next conversion tries again.
pub fn pdfium() -> Result<&'static Pdfium, IngestError> {
    PDFIUM.get_or_try_init(|| {
        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| IngestError::PdfiumBindingFailed(e.to_string()))?;
        debug!("pdfium bound");
        Ok(pdfium)
    })
}

/// Extracts the text layer of PDF documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfBackend;

impl Converter for PdfBackend {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Box<dyn Document>, IngestError> {
        let document = pdfium()?
            .load_pdf_from_file(path, None)
            .map_err(|e| IngestError::ConversionFailed {
                path: path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let title = document
            .metadata()
            .get(PdfDocumentMetadataTagType::Title)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty());

        let mut pages = Vec::with_capacity(document.pages().len() as usize);
        for (idx, page) in document.pages().iter().enumerate() {
            let raw = page
                .text()
                .map_err(|e| IngestError::ConversionFailed {
                    path: path.to_path_buf(),
                    detail: format!("text layer of page {}: {:?}", idx + 1, e),
                })?
                .all();
            let text = clean_text(&raw);

            let mut markdown = text.clone();
            if options.extract_images {
                let images = page
                    .objects()
                    .iter()
                    .filter(|object| object.as_image_object().is_some())
                    .count();
                append_image_placeholders(&mut markdown, images);
            }

            debug!("Page {}: {} chars of text", idx + 1, text.len());
            pages.push(PageContent {
                number: idx + 1,
                markdown,
                text,
            });
        }

        info!("Extracted {} pages from {}", pages.len(), path.display());

        Ok(Box::new(StructuredDocument {
            name: file_name(path),
            source_format: InputFormat::Pdf,
            title,
            pages,
            separator: options.page_separator.clone(),
        }))
    }
}

fn append_image_placeholders(markdown: &mut String, count: usize) {
    for _ in 0..count {
        if !markdown.ends_with("\n\n") {
            markdown.push('\n');
        }
        markdown.push_str(IMAGE_PLACEHOLDER);
        markdown.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_appended_on_their_own_lines() {
        let mut md = String::from("Figure follows.\n");
        append_image_placeholders(&mut md, 2);
        assert_eq!(md, "Figure follows.\n\n<!-- image -->\n\n<!-- image -->\n");
    }

    #[test]
    fn no_images_leaves_markdown_alone() {
        let mut md = String::from("Body\n");
        append_image_placeholders(&mut md, 0);
        assert_eq!(md, "Body\n");
    }

    /// Needs a pdfium library; set INGEST_PDFIUM_TESTS=1 to run.
    #[test]
    fn missing_pdf_is_a_conversion_error() {
        if std::env::var("INGEST_PDFIUM_TESTS").is_err() {
            println!("SKIP: set INGEST_PDFIUM_TESTS=1 to run pdfium tests");
            return;
        }
        let err = PdfBackend
            .convert(Path::new("/definitely/not/here.pdf"), &ConvertOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::ConversionFailed { .. }));
    }

    #[test]
    fn binding_is_shared_across_threads() {
        if std::env::var("INGEST_PDFIUM_TESTS").is_err() {
            println!("SKIP: set INGEST_PDFIUM_TESTS=1 to run pdfium tests");
            return;
        }
        let first = pdfium().unwrap() as *const Pdfium as usize;
        let others: Vec<usize> = (0..4)
            .map(|_| std::thread::spawn(|| pdfium().unwrap() as *const Pdfium as usize))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        assert!(others.iter().all(|&p| p == first));
    }
}
