//! Message bodies carry a tiny markup: `<br>` breaks lines, `<b>…</b>` marks
//! emphasis, and everything else is escaped text.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?b>").expect("markup tag pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text { text: String, bold: bool },
    LineBreak,
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

pub fn summary_body(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|paragraph| escape(paragraph))
        .collect::<Vec<_>>()
        .join("<br><br>")
}

pub fn jargon_body(jargon: &BTreeMap<String, String>) -> String {
    jargon
        .iter()
        .map(|(term, meaning)| format!("<b>{}</b>: {}", escape(term), escape(meaning)))
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn parse(body: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut bold = false;
    let mut cursor = 0;

    for tag in TAG.find_iter(body) {
        if tag.start() > cursor {
            spans.push(Span::Text {
                text: unescape(&body[cursor..tag.start()]),
                bold,
            });
        }
        match tag.as_str().to_ascii_lowercase().as_str() {
            "<b>" => bold = true,
            "</b>" => bold = false,
            _ => spans.push(Span::LineBreak),
        }
        cursor = tag.end();
    }

    if cursor < body.len() {
        spans.push(Span::Text {
            text: unescape(&body[cursor..]),
            bold,
        });
    }
    spans
}

pub fn to_plain_text(body: &str) -> String {
    let mut plain = String::new();
    for span in parse(body) {
        match span {
            Span::Text { text, .. } => plain.push_str(&text),
            Span::LineBreak => plain.push('\n'),
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_paragraphs_are_joined_with_double_breaks() {
        let body = summary_body(&["a".to_string(), "b".to_string()]);
        assert_eq!(body, "a<br><br>b");
    }

    #[test]
    fn server_text_cannot_inject_tags() {
        let body = summary_body(&["<b>loud</b> & clear".to_string()]);
        assert_eq!(body, "&lt;b&gt;loud&lt;/b&gt; &amp; clear");
        assert_eq!(to_plain_text(&body), "<b>loud</b> & clear");
    }

    #[test]
    fn jargon_terms_are_emphasized_in_sorted_order() {
        let jargon = BTreeMap::from([
            ("whereas".to_string(), "while".to_string()),
            ("hereby".to_string(), "by this".to_string()),
        ]);
        assert_eq!(
            jargon_body(&jargon),
            "<b>hereby</b>: by this<br><b>whereas</b>: while"
        );
    }

    #[test]
    fn parse_tracks_bold_runs_and_breaks() {
        let spans = parse("<b>x</b>: y<br>z");
        assert_eq!(
            spans,
            vec![
                Span::Text {
                    text: "x".to_string(),
                    bold: true
                },
                Span::Text {
                    text: ": y".to_string(),
                    bold: false
                },
                Span::LineBreak,
                Span::Text {
                    text: "z".to_string(),
                    bold: false
                },
            ]
        );
    }

    #[test]
    fn plain_text_turns_breaks_into_newlines() {
        assert_eq!(to_plain_text("a<br><br>b"), "a\n\nb");
        assert_eq!(to_plain_text("a<BR/>b"), "a\nb");
    }
}
