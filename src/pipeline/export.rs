//! Selecting the configured output format from a converted document.

use crate::backend::Document;
use crate::config::OutputFormat;
use crate::error::IngestError;
use tracing::debug;

/// Export `doc` in `format`. Documents without a plain-text export fall back
/// to Markdown for [`OutputFormat::Text`].
pub fn extract_content(doc: &dyn Document, format: OutputFormat) -> Result<String, IngestError> {
    match format {
        OutputFormat::Markdown => doc.export_to_markdown(),
        OutputFormat::Html => doc.export_to_html(),
        OutputFormat::Json => doc.export_to_json(),
        OutputFormat::Text => match doc.export_to_text() {
            Some(text) => text,
            None => {
                debug!("Document has no text export, using markdown");
                doc.export_to_markdown()
            }
        },
    }
}
