//! Notion rich-text arrays to spans, and spans to inline markup.

use crate::ir::{Annotations, RichTextSpan};
use serde_json::Value;

/// Parse a Notion `rich_text` array. Missing or malformed input yields no
/// spans.
pub fn parse_rich_text(value: &Value) -> Vec<RichTextSpan> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items.iter().filter_map(parse_span).collect()
}

fn parse_span(item: &Value) -> Option<RichTextSpan> {
    let text = item
        .get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| item.pointer("/text/content").and_then(Value::as_str))
        .or_else(|| item.pointer("/equation/expression").and_then(Value::as_str))?
        .to_string();

    let flag = |name: &str| {
        item.pointer(&format!("/annotations/{name}"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };
    let annotations = Annotations {
        bold: flag("bold"),
        italic: flag("italic"),
        strikethrough: flag("strikethrough"),
        underline: flag("underline"),
        code: flag("code"),
    };

    let href = item
        .get("href")
        .and_then(Value::as_str)
        .or_else(|| item.pointer("/text/link/url").and_then(Value::as_str))
        .filter(|h| !h.is_empty())
        .map(str::to_string);

    Some(RichTextSpan {
        text,
        annotations,
        href,
    })
}

/// Concatenated text of the spans without any markup.
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Render spans as inline markdown.
///
/// Markers nest with code innermost and the link outermost. Leading and
/// trailing whitespace of a span stays outside its markers so `** bold**`
/// style output never occurs.
pub fn render_inline(spans: &[RichTextSpan]) -> String {
    spans.iter().map(render_span).collect()
}

fn render_span(span: &RichTextSpan) -> String {
    let text = span.text.as_str();
    let core = text.trim();
    if core.is_empty() || (span.annotations.is_plain() && span.href.is_none()) {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let end = start + core.len();
    let (leading, trailing) = (&text[..start], &text[end..]);

    let a = &span.annotations;
    let mut out = if a.code {
        if core.contains('`') {
            format!("`` {core} ``")
        } else {
            format!("`{core}`")
        }
    } else {
        core.to_string()
    };
    if a.bold {
        out = format!("**{out}**");
    }
    if a.italic {
        out = format!("*{out}*");
    }
    if a.strikethrough {
        out = format!("~~{out}~~");
    }
    if a.underline {
        out = format!("<u>{out}</u>");
    }
    if let Some(ref href) = span.href {
        out = format!("[{out}]({href})");
    }

    format!("{leading}{out}{trailing}")
}
