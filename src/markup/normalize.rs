// src/markup/normalize.rs
//! Best-effort cleanup of DART report markup ahead of tokenization.
//!
//! The report dialect is SGML-like: two legacy spellings of the table cell
//! tag (`TU`, `TE`), stray ampersands, doubled angle brackets in running
//! text, unclosed `<meta>`/`<br>` elements and tags pasted in from other
//! documents. None of the passes here can fail; anything they miss is left
//! for the tokenizer to report.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Tag names that may appear in a report. Anything else is stripped.
const KNOWN_TAGS: &[&str] = &[
    "?xml", "A", "BODY", "COL", "COLGROUP", "COMPANY-NAME", "CORRECTION", "COVER",
    "COVER-TITLE", "DOCUMENT", "DOCUMENT-NAME", "EXTRACTION", "FORMULA-VERSION",
    "IMAGE", "IMG", "IMG-CAPTION", "LIBRARY", "P", "PART", "PGBRK", "SECTION-1",
    "SECTION-2", "SECTION-3", "SPAN", "SUMMARY", "TABLE", "TABLE-GROUP", "TBODY",
    "TD", "TE", "TH", "THEAD", "TITLE", "TR", "TU",
];

static CELL_SYNONYM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(/?)T[UE]\b").expect("Failed to compile CELL_SYNONYM_RE")
});

// An ampersand that does not start a named or numeric character reference.
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("Failed to compile ENTITY_RE")
});

static VOID_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(meta|br)\b([^>]*)>").expect("Failed to compile VOID_ELEMENT_RE")
});

// A `<` that cannot begin a tag, comment or declaration.
static STRAY_BRACKET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([^A-Za-z/!?]|$)").expect("Failed to compile STRAY_BRACKET_RE")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[^<>]+>").expect("Failed to compile TAG_RE")
});

/// Output of [`normalize`]: the cleaned markup plus the distinct tag names
/// that were removed, kept for debug dumps.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub text: String,
    pub stripped_tags: Vec<String>,
}

/// Runs every cleanup pass in order: cell synonym folding, ampersand
/// escaping, bracket guarding, void element closing, unknown tag stripping.
pub fn normalize(raw: &str) -> Normalized {
    let folded = fold_cell_synonyms(raw);
    let escaped = escape_ampersands(&folded);
    let guarded = guard_brackets(&escaped);
    let closed = close_void_elements(&guarded);
    let (text, stripped_tags) = strip_unknown_tags(&closed);

    if !stripped_tags.is_empty() {
        tracing::debug!("Stripped unknown tags: {}", stripped_tags.join(", "));
    }

    Normalized { text, stripped_tags }
}

/// Rewrites `<TU`, `</TU>`, `<TE`, `</TE>` (any case) to the `TD` cell tag.
pub fn fold_cell_synonyms(raw: &str) -> Cow<'_, str> {
    CELL_SYNONYM_RE.replace_all(raw, "<${1}TD")
}

/// Escapes every `&` once a bare one is seen. Already valid references are
/// escaped too; the document class rarely mixes both.
pub fn escape_ampersands(text: &str) -> Cow<'_, str> {
    if has_bare_ampersand(text) {
        Cow::Owned(text.replace('&', "&amp;"))
    } else {
        Cow::Borrowed(text)
    }
}

fn has_bare_ampersand(text: &str) -> bool {
    text.match_indices('&')
        .any(|(idx, _)| ENTITY_RE.find_at(text, idx).map_or(true, |m| m.start() != idx))
}

/// Turns doubled brackets and other comparison operators in running text
/// into something the tokenizer will not read as markup.
pub fn guard_brackets(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    if out.contains("<<") {
        out = Cow::Owned(out.replace("<<", "&lt;<"));
    }
    if out.contains(">>") {
        out = Cow::Owned(out.replace(">>", ">&gt;"));
    }
    if STRAY_BRACKET_RE.is_match(&out) {
        out = Cow::Owned(STRAY_BRACKET_RE.replace_all(&out, "&lt;$1").into_owned());
    }
    out
}

/// Self-closes `<meta ...>` and `<br ...>` unless already self-closed.
pub fn close_void_elements(text: &str) -> Cow<'_, str> {
    VOID_ELEMENT_RE.replace_all(text, |caps: &Captures| {
        let attrs = &caps[2];
        if attrs.trim_end().ends_with('/') {
            caps[0].to_string()
        } else {
            format!("<{}{}/>", &caps[1], attrs)
        }
    })
}

/// Removes every open or close tag whose name is not in the report
/// vocabulary. Returns the cleaned text and the distinct names removed.
pub fn strip_unknown_tags(text: &str) -> (String, Vec<String>) {
    let mut stripped: Vec<String> = Vec::new();
    let cleaned = TAG_RE.replace_all(text, |caps: &Captures| {
        let tag = &caps[0];
        let name = tag_name(tag);
        if is_known_tag(name) {
            tag.to_string()
        } else {
            if !stripped.iter().any(|s| s == name) {
                stripped.push(name.to_string());
            }
            String::new()
        }
    });
    (cleaned.into_owned(), stripped)
}

/// Case-insensitive membership test against the report vocabulary.
pub fn is_known_tag(name: &str) -> bool {
    KNOWN_TAGS.iter().any(|known| known.eq_ignore_ascii_case(name))
}

fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    inner[..end].trim_end_matches('>').trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_synonyms_fold_to_td() {
        let raw = r#"<TR><TU ALIGN="LEFT">Profit</TU><TE>500</TE><td>x</td></TR>"#;
        assert_eq!(
            fold_cell_synonyms(raw),
            r#"<TR><TD ALIGN="LEFT">Profit</TD><TD>500</TD><td>x</td></TR>"#
        );
    }

    #[test]
    fn test_ampersands_escaped_only_when_bare_one_present() {
        assert_eq!(escape_ampersands("R&D spend"), "R&amp;D spend");
        // A bare ampersand escapes everything, valid references included
        assert_eq!(escape_ampersands("R&D &amp; more"), "R&amp;D &amp;amp; more");
        assert_eq!(escape_ampersands("only &amp; and &#160;"), "only &amp; and &#160;");
        assert_eq!(escape_ampersands("no ampersand"), "no ampersand");
    }

    #[test]
    fn test_brackets_guarded() {
        assert_eq!(guard_brackets("<<TD>x</TD>>"), "&lt;<TD>x</TD>&gt;");
        assert_eq!(guard_brackets("a << b >> c"), "a &lt;&lt; b >&gt; c");
        assert_eq!(guard_brackets("ratio < 1"), "ratio &lt; 1");
        assert_eq!(guard_brackets("<P>plain</P>"), "<P>plain</P>");
    }

    #[test]
    fn test_void_elements_self_closed() {
        assert_eq!(
            close_void_elements(r#"<meta charset="utf-8"><BR><br class="x"/>"#),
            r#"<meta charset="utf-8"/><BR/><br class="x"/>"#
        );
    }

    #[test]
    fn test_unknown_tags_stripped_in_both_forms() {
        let (text, stripped) =
            strip_unknown_tags(r#"<P><FONT size="2">Revenue</FONT> grew</P><TD/>"#);
        assert_eq!(text, "<P>Revenue grew</P><TD/>");
        assert_eq!(stripped, vec!["FONT".to_string()]);
    }

    #[test]
    fn test_known_tags_are_case_insensitive() {
        assert!(is_known_tag("span"));
        assert!(is_known_tag("Company-Name"));
        assert!(is_known_tag("?xml"));
        assert!(!is_known_tag("FONT"));
        assert!(!is_known_tag("br"));
    }

    #[test]
    fn test_normalize_runs_all_passes() {
        let raw = "<?xml version=\"1.0\"?><DOCUMENT><P>A&B << C</P><TU>1</TU><X-TAG>y</X-TAG></DOCUMENT>";
        let normalized = normalize(raw);
        assert_eq!(
            normalized.text,
            "<?xml version=\"1.0\"?><DOCUMENT><P>A&amp;B &lt;&lt; C</P><TD>1</TD>y</DOCUMENT>"
        );
        assert_eq!(normalized.stripped_tags, vec!["X-TAG".to_string()]);
    }
}
