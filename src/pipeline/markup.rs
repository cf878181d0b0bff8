//! Conversions between Markdown, HTML and plain text.
//!
//! Markdown is the pivot format of the built-in backends: every page carries
//! a Markdown rendering and HTML export renders it with `pulldown-cmark`.
//! HTML sources are parsed with `scraper` and walked element by element,
//! keeping headings, paragraphs, list items, table rows and line breaks.

use crate::pipeline::normalize::clean_text;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser, Tag};
use scraper::{ElementRef, Html, Node, Selector};

fn cmark_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Render Markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, cmark_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Strip Markdown syntax, keeping the readable text and block structure.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    for event in Parser::new_ext(markdown, cmark_options()) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::CodeBlock(_) | Tag::BlockQuote) => {
                out.push_str("\n\n")
            }
            Event::End(Tag::Item | Tag::TableHead | Tag::TableRow) => out.push('\n'),
            Event::End(Tag::TableCell) => out.push('\t'),
            Event::End(Tag::List(_) | Tag::Table(_)) => out.push('\n'),
            _ => {}
        }
    }
    clean_text(&out)
}

// ── HTML reduction ───────────────────────────────────────────────────────────

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Elements whose content is never visible text.
const SKIPPED: &[&str] = &["head", "script", "style", "noscript", "template", "iframe", "svg"];

/// Elements rendered as a paragraph-level block.
const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "main", "nav", "aside", "ul", "ol",
    "table", "blockquote", "pre", "figure", "hr", "dl",
];

/// Text of the document's `<title>`, whitespace-collapsed.
pub fn html_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = document.select(&TITLE).next()?;
    let title = title.text().collect::<Vec<_>>().join(" ");
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// Reduce an HTML document to Markdown-flavoured text.
///
/// Headings become `#` lines, list items `- ` lines, `<br>` a line break and
/// block elements paragraph breaks. Character references are decoded by the
/// HTML parser.
pub fn html_to_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut out = String::with_capacity(html.len() / 2);
    write_element(root, &mut out);

    let lines: Vec<String> = out
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    clean_text(&lines.join("\n"))
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }

    match name {
        "br" => out.push('\n'),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = usize::from(name.as_bytes()[1] - b'0');
            out.push_str("\n\n");
            out.push_str(&"#".repeat(level));
            out.push(' ');
            write_children(element, out);
            out.push_str("\n\n");
        }
        "li" => {
            out.push_str("\n- ");
            write_children(element, out);
        }
        "tr" => {
            out.push('\n');
            write_children(element, out);
        }
        "td" | "th" => {
            write_children(element, out);
            out.push(' ');
        }
        _ if BLOCKS.contains(&name) => {
            out.push_str("\n\n");
            write_children(element, out);
            out.push_str("\n\n");
        }
        _ => write_children(element, out),
    }
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(text, out),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            _ => {}
        }
    }
}

// Inline whitespace collapses to one space, as a browser renders it.
fn push_text(text: &str, out: &mut String) {
    let at_break = out.is_empty() || out.ends_with(char::is_whitespace);
    if text.starts_with(char::is_whitespace) && !at_break {
        out.push(' ');
    }
    let mut words = text.split_whitespace().peekable();
    let has_words = words.peek().is_some();
    for (i, word) in words.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    if has_words && text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}
