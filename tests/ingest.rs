//! Integration tests for the ingestion API.
//!
//! A fake [`Converter`] stands in for a document engine so these run without
//! pdfium. Markdown, CSV and HTML fixtures go through the real built-in
//! backends.

use edgequake_ingest::{
    quick_ingest, ConvertOptions, Converter, Document, IngestConfig, IngestError, IngestProgressCallback,
    Ingestor, OutputFormat, PageSeparator,
};
use futures::StreamExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Produces `pages` pages of "Page N of <file>" text; fails for any file
/// whose name contains "broken".
struct FakeConverter {
    pages: usize,
    calls: AtomicUsize,
}

impl FakeConverter {
    fn new(pages: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }
}

struct FakeDocument {
    pages: Vec<String>,
    separator: PageSeparator,
}

impl Document for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn export_to_markdown(&self) -> Result<String, IngestError> {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.separator.render(i + 1));
            }
            out.push_str(page);
        }
        Ok(out)
    }

    fn export_to_html(&self) -> Result<String, IngestError> {
        Ok(format!("<p>{}</p>", self.pages.join("</p><p>")))
    }

    fn export_to_json(&self) -> Result<String, IngestError> {
        Ok(serde_json::json!({ "pages": self.pages }).to_string())
    }
}

impl Converter for FakeConverter {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Box<dyn Document>, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.contains("broken") {
            return Err(IngestError::ConversionFailed {
                path: path.to_path_buf(),
                detail: "corrupt document".into(),
            });
        }
        Ok(Box::new(FakeDocument {
            pages: (1..=self.pages).map(|n| format!("Page {n} of {name}")).collect(),
            separator: options.page_separator.clone(),
        }))
    }
}

fn fixture(dir: &TempDir, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn config(format: OutputFormat) -> IngestConfig {
    IngestConfig::builder().output_format(format).build().unwrap()
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl IngestProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("start:{total_files}"));
    }
    fn on_file_complete(&self, filename: &str, _page_count: usize, _content_len: usize) {
        self.events.lock().unwrap().push(format!("ok:{filename}"));
    }
    fn on_file_error(&self, filename: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("err:{filename}"));
    }
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done:{success_count}/{total_files}"));
    }
}

// ── Single documents ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ingests_markdown_with_builtin_backend() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "guide.md", b"# Guide\n\nInstall it.\n");

    let doc = Ingestor::new(config(OutputFormat::Markdown))
        .ingest(path.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(doc.content, "# Guide\n\nInstall it.\n");
    assert_eq!(doc.filename, "guide.md");
    assert_eq!(doc.page_count, 1);
    assert_eq!(doc.format, OutputFormat::Markdown);
    assert_eq!(doc.file_size, Some(21));
    assert!(doc.processing_time >= 0.0);
}

#[tokio::test]
async fn ingests_csv_as_html_table() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "parts.csv", b"part,qty\nbolt,3\n");

    let doc = Ingestor::new(config(OutputFormat::Html))
        .ingest(path.to_str().unwrap())
        .await
        .unwrap();

    assert!(doc.content.starts_with("<!DOCTYPE html>"));
    assert!(doc.content.contains("<title>parts.csv</title>"));
    assert!(doc.content.contains("<td>bolt</td>"), "got: {}", doc.content);
}

#[tokio::test]
async fn ingests_html_as_text() {
    let dir = TempDir::new().unwrap();
    let path = fixture(
        &dir,
        "page.html",
        b"<html><body><h1>Title</h1><p>Some <em>body</em> text.</p></body></html>",
    );

    let doc = Ingestor::new(config(OutputFormat::Text))
        .ingest_path(&path)
        .await
        .unwrap();

    assert_eq!(doc.content, "Title\n\nSome body text.\n");
    assert_eq!(doc.format, OutputFormat::Text);
}

#[tokio::test]
async fn text_format_falls_back_to_markdown() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "report.pdf", b"%PDF-1.7");
    let ingestor = Ingestor::with_converter(
        IngestConfig::builder()
            .output_format(OutputFormat::Text)
            .page_separator(PageSeparator::HorizontalRule)
            .build()
            .unwrap(),
        FakeConverter::new(2),
    );

    let doc = ingestor.ingest(path.to_str().unwrap()).await.unwrap();

    assert_eq!(doc.content, "Page 1 of report.pdf\n\n---\n\nPage 2 of report.pdf");
    assert_eq!(doc.page_count, 2);
    assert_eq!(doc.format, OutputFormat::Text);
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_conversion() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "notes.txt", b"plain");
    let converter = FakeConverter::new(1);
    let ingestor = Ingestor::with_converter(IngestConfig::default(), converter.clone());

    let err = ingestor.ingest(path.to_str().unwrap()).await.unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFormat { ref extension, .. } if extension == ".txt"));
    assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_is_reported() {
    let err = Ingestor::default()
        .ingest("/definitely/not/here.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[tokio::test]
async fn office_formats_need_a_converter() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "memo.docx", b"PK");

    let err = Ingestor::default().ingest_path(&path).await.unwrap_err();
    assert!(matches!(err, IngestError::NoBackend { .. }));

    let doc = Ingestor::with_converter(IngestConfig::default(), FakeConverter::new(1))
        .ingest_path(&path)
        .await
        .unwrap();
    assert_eq!(doc.content, "Page 1 of memo.docx");
}

#[tokio::test]
async fn ingest_from_bytes_reports_original_name() {
    let body = b"# From memory\n\nHello.\n";
    let doc = Ingestor::default()
        .ingest_from_bytes(body, "upload.md")
        .await
        .unwrap();

    assert_eq!(doc.filename, "upload.md");
    assert_eq!(doc.file_size, Some(body.len() as u64));
    assert_eq!(doc.content, "# From memory\n\nHello.\n");
}

#[tokio::test]
async fn ingest_from_bytes_rejects_unknown_suffix() {
    let err = Ingestor::default()
        .ingest_from_bytes(b"data", "blob.bin")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
}

#[test]
fn quick_ingest_returns_content() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "q.md", b"Quick.\n");
    let content = tokio_test::block_on(quick_ingest(path.to_str().unwrap())).unwrap();
    assert_eq!(content, "Quick.\n");
}

// ── Results ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn saved_document_round_trips_content() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "a.md", "# Café\n".as_bytes());
    let doc = Ingestor::default().ingest_path(&path).await.unwrap();

    let out = dir.path().join("out/nested/a.out.md");
    doc.save(&out).unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), "# Café\n");
    assert_eq!(doc.to_dict()["format"], "markdown");
    assert_eq!(doc.to_dict()["filename"], "a.md");
}

#[tokio::test]
async fn ingested_document_chunks_long_content() {
    let dir = TempDir::new().unwrap();
    let body = "word ".repeat(500);
    let path = fixture(&dir, "long.md", body.as_bytes());

    let doc = Ingestor::default().ingest_path(&path).await.unwrap();
    let chunks = doc.get_chunks(200, 20).unwrap();

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() > 50 && c.chars().count() <= 200));
    assert!(matches!(
        doc.get_chunks(100, 100),
        Err(IngestError::InvalidChunkParams { .. })
    ));
}

// ── Directories ──────────────────────────────────────────────────────────────

fn batch_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in ["c.pdf", "a.pdf", "broken.pdf", "b.docx", "skip.txt"] {
        fixture(&dir, name, b"x");
    }
    fs::create_dir(dir.path().join("sub")).unwrap();
    fixture(&dir, "sub/deep.pdf", b"x");
    dir
}

#[tokio::test]
async fn directory_batch_isolates_failures() {
    let dir = batch_dir();
    let callback = Arc::new(RecordingCallback::default());
    let config = IngestConfig::builder()
        .concurrency(2)
        .progress_callback(callback.clone())
        .build()
        .unwrap();
    let ingestor = Ingestor::with_converter(config, FakeConverter::new(3));

    let output = ingestor.ingest_directory(dir.path(), None).await.unwrap();

    let names: Vec<&str> = output.documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.docx", "c.pdf"]);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].filename, "broken.pdf");
    assert!(output.failures[0].detail.contains("corrupt document"));

    assert_eq!(output.stats.total_files, 4);
    assert_eq!(output.stats.ingested_files, 3);
    assert_eq!(output.stats.failed_files, 1);
    assert_eq!(output.stats.total_pages, 9);

    let events = callback.events.lock().unwrap();
    assert_eq!(events.first().map(String::as_str), Some("start:4"));
    assert_eq!(events.last().map(String::as_str), Some("done:3/4"));
    assert!(events.contains(&"err:broken.pdf".to_string()));
}

#[tokio::test]
async fn directory_pattern_limits_files() {
    let dir = batch_dir();
    let ingestor = Ingestor::with_converter(IngestConfig::default(), FakeConverter::new(1));

    let output = ingestor.ingest_directory(dir.path(), Some("*.docx")).await.unwrap();

    assert_eq!(output.documents.len(), 1);
    assert_eq!(output.documents[0].filename, "b.docx");
    assert!(output.failures.is_empty());
}

#[tokio::test]
async fn empty_directory_yields_empty_output() {
    let dir = TempDir::new().unwrap();
    let output = Ingestor::default().ingest_directory(dir.path(), None).await.unwrap();
    assert!(output.documents.is_empty());
    assert_eq!(output.stats.total_files, 0);
}

#[tokio::test]
async fn missing_directory_is_fatal() {
    let err = Ingestor::default()
        .ingest_directory("/no/such/dir", None)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}

#[tokio::test]
async fn directory_stream_yields_every_file() {
    let dir = batch_dir();
    let ingestor = Ingestor::with_converter(IngestConfig::default(), FakeConverter::new(1));

    let results: Vec<_> = ingestor
        .ingest_directory_stream(dir.path(), None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 4);
    let mut ok: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|d| d.filename.clone()))
        .collect();
    ok.sort();
    assert_eq!(ok, vec!["a.pdf", "b.docx", "c.pdf"]);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
}

// ── pdfium (INGEST_PDFIUM_TESTS=1) ───────────────────────────────────────────

fn pdfium_enabled() -> bool {
    if std::env::var("INGEST_PDFIUM_TESTS").is_err() {
        println!("SKIP: set INGEST_PDFIUM_TESTS=1 to run pdfium tests");
        return false;
    }
    true
}

/// One-page PDF with `line` drawn in Helvetica, xref offsets computed.
fn single_page_pdf(line: &str) -> Vec<u8> {
    let stream = format!("BT /F1 18 Tf 72 700 Td ({line}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }
    let xref = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

#[tokio::test]
async fn concurrent_pdf_conversions_share_one_binding() {
    if !pdfium_enabled() {
        return;
    }
    let dir = TempDir::new().unwrap();
    for n in 1..=4 {
        fixture(&dir, &format!("report{n}.pdf"), &single_page_pdf(&format!("Quarterly report {n}")));
    }
    let config = IngestConfig::builder()
        .output_format(OutputFormat::Text)
        .concurrency(2)
        .build()
        .unwrap();

    let output = Ingestor::new(config).ingest_directory(dir.path(), None).await.unwrap();

    assert!(output.failures.is_empty(), "{:?}", output.failures);
    assert_eq!(output.documents.len(), 4);
    for (n, doc) in (1..=4).zip(&output.documents) {
        assert_eq!(doc.page_count, 1);
        assert!(doc.content.contains(&format!("Quarterly report {n}")), "{}", doc.content);
    }
}
