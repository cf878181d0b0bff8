//! Normalisation of text extracted by conversion backends.
//!
//! PDF text layers and hand-written sources disagree on line endings,
//! spacing and invisible characters. [`clean_text`] gives every backend the
//! same shape of output before export and chunking:
//!
//! - LF line endings; form feeds and Unicode line/paragraph separators
//!   become line breaks
//! - zero-width characters, BOM and soft hyphens are dropped
//! - no-break spaces become plain spaces, so chunk boundaries can land on them
//! - no trailing whitespace, no leading blank lines, never two blank lines
//!   in a row
//! - words hyphenated across a line break are re-joined
//! - exactly one final newline

use once_cell::sync::Lazy;
use regex::Regex;

// Lowercase on both sides, so "Jean-\nPaul" and list dashes are left alone.
static RE_HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{Ll})-\n(\p{Ll})").unwrap());

/// Normalise raw extracted text. Empty input yields `"\n"`.
pub fn clean_text(input: &str) -> String {
    let unified = unify_chars(input);

    let mut out = String::with_capacity(unified.len() + 1);
    let mut blank_pending = false;
    for line in unified.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            blank_pending = !out.is_empty();
            continue;
        }
        if blank_pending {
            out.push('\n');
            blank_pending = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    if out.is_empty() {
        return String::from("\n");
    }
    RE_HYPHEN_BREAK.replace_all(&out, "$1$2").into_owned()
}

/// Single pass over the characters: line breaks to LF, no-break spaces to
/// spaces, invisible characters dropped.
fn unify_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\u{000B}' | '\u{000C}' | '\u{2028}' | '\u{2029}' => out.push('\n'),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => out.push(' '),
            '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => {}
            c => out.push(c),
        }
    }
    out
}
