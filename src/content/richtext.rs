//! Prismic structured text
//!
//! A rich-text field is an ordered list of block nodes (paragraphs, headings,
//! list items, images, embeds). Text-bearing nodes carry inline spans whose
//! offsets count UTF-16 code units, as produced by the Prismic editor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::helpers::{attributes, html_escape, text_to_html};

/// Inline formatting applied to part of a node's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One block of a rich-text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Node attributes this crate doesn't model (image dimensions, oembed, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RichTextNode {
    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// An ordered rich-text field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextNode>);

#[derive(Clone, Copy, PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl RichText {
    /// Plain text of every text-bearing node, joined by a single space
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|node| node.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render to HTML. Text is escaped; embed markup is inserted verbatim.
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<ListKind> = None;

        for node in &self.0 {
            let list = match node.kind.as_str() {
                "list-item" => Some(ListKind::Unordered),
                "o-list-item" => Some(ListKind::Ordered),
                _ => None,
            };

            if open_list != list {
                if let Some(kind) = open_list {
                    html.push_str(close_list(kind));
                }
                if let Some(kind) = list {
                    html.push_str(match kind {
                        ListKind::Unordered => "<ul>",
                        ListKind::Ordered => "<ol>",
                    });
                }
                open_list = list;
            }

            html.push_str(&render_node(node));
        }

        if let Some(kind) = open_list {
            html.push_str(close_list(kind));
        }

        html
    }
}

fn close_list(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Unordered => "</ul>",
        ListKind::Ordered => "</ol>",
    }
}

fn render_node(node: &RichTextNode) -> String {
    let inner = || render_spans(node.text.as_deref().unwrap_or(""), &node.spans);

    match node.kind.as_str() {
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &node.kind["heading".len()..];
            format!("<h{level}>{}</h{level}>", inner())
        }
        "paragraph" => format!("<p>{}</p>", inner()),
        "preformatted" => format!("<pre>{}</pre>", inner()),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner()),
        "image" => render_image(node),
        "embed" => render_embed(node),
        other => {
            tracing::debug!("Unknown rich-text node type {:?}, rendering as paragraph", other);
            match node.text {
                Some(_) => format!("<p>{}</p>", inner()),
                None => String::new(),
            }
        }
    }
}

fn render_image(node: &RichTextNode) -> String {
    let src = node.extra_str("url").unwrap_or("");
    let alt = node.extra_str("alt").unwrap_or("");
    let img = format!("<img{} />", attributes([("src", Some(src)), ("alt", Some(alt))]));

    let link = node
        .extra
        .get("linkTo")
        .and_then(|l| l.get("url"))
        .and_then(|u| u.as_str());
    match link {
        Some(href) => format!(
            r#"<p class="block-img"><a href="{}">{}</a></p>"#,
            html_escape(href),
            img
        ),
        None => format!(r#"<p class="block-img">{}</p>"#, img),
    }
}

fn render_embed(node: &RichTextNode) -> String {
    let Some(oembed) = node.extra.get("oembed") else {
        return String::new();
    };
    let field = |key: &str| oembed.get(key).and_then(|v| v.as_str());

    // The store's oembed markup is trusted and not sanitized.
    format!(
        "<div{}>{}</div>",
        attributes([
            ("data-oembed", field("embed_url")),
            ("data-oembed-type", field("type")),
            ("data-oembed-provider", field("provider_name")),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_some())),
        field("html").unwrap_or("")
    )
}

fn span_open(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let data = span.data.as_ref();
            let url = data
                .and_then(|d| d.get("url"))
                .and_then(|u| u.as_str())
                .unwrap_or("");
            let blank = data
                .and_then(|d| d.get("target"))
                .and_then(|t| t.as_str())
                .map(|t| t == "_blank")
                .unwrap_or(false);
            if blank {
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
                    html_escape(url)
                )
            } else {
                format!(r#"<a href="{}">"#, html_escape(url))
            }
        }
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|l| l.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        _ => "<span>".to_string(),
    }
}

fn span_close(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

/// Render text with its inline spans, keeping tags properly nested
fn render_spans(text: &str, spans: &[Span]) -> String {
    // byte offset for every UTF-16 offset that starts a char, plus the end
    let mut offsets: Vec<(usize, usize)> = Vec::with_capacity(text.len() + 1);
    let mut utf16 = 0;
    for (byte, ch) in text.char_indices() {
        offsets.push((utf16, byte));
        utf16 += ch.len_utf16();
    }
    offsets.push((utf16, text.len()));
    let text_len = utf16;

    let byte_at = |pos: usize| -> usize {
        match offsets.binary_search_by_key(&pos, |&(u, _)| u) {
            Ok(i) => offsets[i].1,
            // inside a surrogate pair: snap to the char start
            Err(i) => offsets[i.saturating_sub(1)].1,
        }
    };

    // outer spans first: earlier start, then longer
    let mut ordered: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < text_len)
        .collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut bounds: BTreeSet<usize> = BTreeSet::new();
    bounds.insert(0);
    bounds.insert(text_len);
    for span in &ordered {
        bounds.insert(span.start);
        bounds.insert(span.end.min(text_len));
    }
    let bounds: Vec<usize> = bounds.into_iter().collect();

    let mut html = String::new();
    let mut stack: Vec<&Span> = Vec::new();

    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        let active: Vec<&Span> = ordered
            .iter()
            .copied()
            .filter(|s| s.start <= from && s.end >= to)
            .collect();

        let common = stack
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| std::ptr::eq(**a, **b))
            .count();
        while stack.len() > common {
            if let Some(span) = stack.pop() {
                html.push_str(span_close(span));
            }
        }
        for span in &active[common..] {
            html.push_str(&span_open(span));
            stack.push(*span);
        }

        html.push_str(&text_to_html(&text[byte_at(from)..byte_at(to)]));
    }

    while let Some(span) = stack.pop() {
        html.push_str(span_close(span));
    }

    html
}
