//! Pipeline stages shared by the ingestor and the built-in backends.
//!
//! ```text
//! input ──▶ converter ──▶ export
//! (URL/path)  (backend)   (markdown/html/json/text)
//! ```
//!
//! 1. [`input`] canonicalises the user-supplied path or URL to a local file
//! 2. the configured [`crate::backend::Converter`] turns it into a document;
//!    built-in backends clean extracted text with [`normalize`] and move
//!    between Markdown, HTML and text with [`markup`]
//! 3. [`export`] pulls the configured output format out of the document

pub mod export;
pub mod input;
pub mod markup;
pub mod normalize;
