//! Text-based sources: Markdown, CSV and HTML.
//!
//! Each file becomes a single-page [`StructuredDocument`]. Bytes are decoded
//! as UTF-8 lossily so one bad byte does not fail a whole batch.

use super::{file_name, ConvertOptions, Converter, Document, InputFormat, PageContent, StructuredDocument};
use crate::error::IngestError;
use crate::pipeline::markup::{html_title, html_to_markdown, markdown_to_text};
use crate::pipeline::normalize::clean_text;
use std::path::Path;
use tracing::debug;

/// Converts Markdown, CSV and HTML files.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextBackend;

impl Converter for TextBackend {
    fn name(&self) -> &'static str {
        "text"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Box<dyn Document>, IngestError> {
        let format = match InputFormat::from_path(path) {
            Some(f @ (InputFormat::Markdown | InputFormat::Csv | InputFormat::Html)) => f,
            Some(other) => {
                return Err(IngestError::NoBackend {
                    format: other.to_string(),
                })
            }
            None => {
                return Err(IngestError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension: super::extension_label(path),
                })
            }
        };

        let bytes = std::fs::read(path).map_err(|e| IngestError::ConversionFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let raw = String::from_utf8_lossy(&bytes);

        let (title, markdown, text) = match format {
            InputFormat::Markdown => {
                let markdown = clean_text(&raw);
                let text = markdown_to_text(&markdown);
                (markdown_title(&markdown), markdown, text)
            }
            InputFormat::Csv => {
                let text = clean_text(&raw);
                let markdown = if options.extract_tables {
                    csv_to_markdown_table(&raw).map_err(|e| IngestError::ConversionFailed {
                        path: path.to_path_buf(),
                        detail: e.to_string(),
                    })?
                } else {
                    text.clone()
                };
                (None, markdown, text)
            }
            _ => {
                let markdown = html_to_markdown(&raw);
                let text = markdown_to_text(&markdown);
                (html_title(&raw), markdown, text)
            }
        };

        debug!("{} {}: {} chars", format, path.display(), markdown.len());

        Ok(Box::new(StructuredDocument {
            name: file_name(path),
            source_format: format,
            title,
            pages: vec![PageContent {
                number: 1,
                markdown,
                text,
            }],
            separator: options.page_separator.clone(),
        }))
    }
}

/// First ATX level-1 heading, if any.
fn markdown_title(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Render CSV as a GitHub-flavoured Markdown table. Short rows are padded to
/// the header width.
fn csv_to_markdown_table(raw: &str) -> Result<String, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(table_cell).collect();
    if headers.is_empty() {
        return Ok(String::from("\n"));
    }
    let width = headers.len();

    let mut out = String::new();
    push_row(&mut out, &headers);
    push_row(&mut out, &vec!["---".to_string(); width]);

    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().take(width).map(table_cell).collect();
        row.resize(width, String::new());
        push_row(&mut out, &row);
    }
    Ok(out)
}

fn table_cell(field: &str) -> String {
    field.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push_str("| ");
    out.push_str(&cells.join(" | "));
    out.push_str(" |\n");
}
