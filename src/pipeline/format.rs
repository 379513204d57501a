//! IR → note.com post body.
//!
//! note.com accepts a restricted markdown with inline HTML for figures.
//! Images are not rendered with their source URL: each one gets a synthetic
//! reference (`__IMAGE_PLACEHOLDER_n__`) that image relocation later swaps
//! for the uploaded URL.
//!
//! Page text that happens to spell a placeholder is defused with a
//! zero-width non-joiner between its leading underscores, so the only
//! references in the output are the ones the formatter emitted.
//!
//! The placeholder counter is an explicit argument. Formatting the same IR
//! twice from the same starting index gives byte-identical output, and
//! nothing carries over from one document to the next.

use super::postprocess::clean_body;
use super::rich_text::render_inline;
use crate::ir::{IrNode, NodeKind, RichTextSpan};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__IMAGE_PLACEHOLDER_\d+__").expect("valid regex"));

const PLACEHOLDER_PREFIX: &str = "__IMAGE_PLACEHOLDER_";
const DEFUSED_PREFIX: &str = "_\u{200C}_IMAGE_PLACEHOLDER_";

/// The synthetic reference for image number `index`.
pub fn image_placeholder(index: usize) -> String {
    format!("__IMAGE_PLACEHOLDER_{index}__")
}

/// One image emitted by the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub index: usize,
    /// Placeholder text as it appears in the markdown.
    pub reference: String,
    /// Original (source platform) URL; `None` when the block had no file.
    pub source_url: Option<String>,
    pub caption: Option<String>,
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutput {
    pub markdown: String,
    /// Images in document order, one per `Image` node.
    pub images: Vec<ImageSlot>,
    /// First index free for a following call.
    pub next_image_index: usize,
}

/// Render `nodes` as a note.com body, numbering images from
/// `first_image_index`.
pub fn format_to_markdown(nodes: &[IrNode], first_image_index: usize) -> FormatOutput {
    let mut formatter = Formatter {
        next_index: first_image_index,
        images: Vec::new(),
    };
    let body = formatter.render_blocks(nodes).join("\n\n");
    FormatOutput {
        markdown: clean_body(&body),
        images: formatter.images,
        next_image_index: formatter.next_index,
    }
}

/// Every placeholder occurrence in `markdown`, in order, duplicates kept.
pub fn extract_image_references(markdown: &str) -> Vec<String> {
    RE_PLACEHOLDER
        .find_iter(markdown)
        .map(|m| m.as_str().to_string())
        .collect()
}

struct Formatter {
    next_index: usize,
    images: Vec<ImageSlot>,
}

impl Formatter {
    fn render_blocks(&mut self, nodes: &[IrNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| self.render_node(n))
            .filter(|block| !block.trim().is_empty())
            .collect()
    }

    /// Render one node plus its children, blocks joined by blank lines.
    fn render_node(&mut self, node: &IrNode) -> String {
        let own = match node.kind {
            NodeKind::Heading => {
                let level = usize::from(node.attributes.level.unwrap_or(1).clamp(1, 6));
                format!("{} {}", "#".repeat(level), inline(&node.rich_text))
            }
            NodeKind::Paragraph => inline(&node.rich_text),
            NodeKind::BulletList | NodeKind::NumberedList | NodeKind::TodoList => {
                return self.render_list(node, 0).join("\n");
            }
            NodeKind::Code => {
                let language = node
                    .attributes
                    .language
                    .as_deref()
                    .filter(|l| !l.is_empty() && *l != "plain text")
                    .unwrap_or_default();
                let content = defuse(&node.content.clone().unwrap_or_else(|| node.plain_text()));
                let fence = code_fence(&content);
                format!("{fence}{language}\n{}\n{fence}", content.trim_end_matches('\n'))
            }
            NodeKind::Quote | NodeKind::Callout => return self.render_quote(node),
            NodeKind::Divider => "---".to_string(),
            NodeKind::Image => self.render_image(node),
            NodeKind::Table => return self.render_table(&node.children),
            NodeKind::TableRow => return self.render_table(std::slice::from_ref(node)),
            NodeKind::TableCell => cell_text(node),
            NodeKind::Embed => defuse(node.attributes.url.as_deref().unwrap_or_default()),
            NodeKind::Bookmark => match node.attributes.url.as_deref() {
                Some(url) => {
                    let label = node.attributes.caption.as_deref().unwrap_or(url);
                    defuse(&format!("[{label}]({url})"))
                }
                None => String::new(),
            },
            NodeKind::Unsupported => format!(
                "*[Unsupported block: {}]*",
                defuse(node.content.as_deref().unwrap_or("unknown"))
            ),
        };

        let mut blocks = vec![own];
        blocks.extend(self.render_blocks(&node.children));
        blocks.retain(|b| !b.trim().is_empty());
        blocks.join("\n\n")
    }

    fn render_image(&mut self, node: &IrNode) -> String {
        let index = self.next_index;
        self.next_index += 1;
        let reference = image_placeholder(index);
        let caption = node.attributes.caption.clone();

        let markup = match caption.as_deref() {
            Some(c) => format!(
                "<figure><img src=\"{reference}\"><figcaption>{}</figcaption></figure>",
                defuse(&escape_html(c))
            ),
            None => format!("<figure><img src=\"{reference}\"></figure>"),
        };
        self.images.push(ImageSlot {
            index,
            reference,
            source_url: node.attributes.url.clone(),
            caption,
            block_id: node.attributes.block_id.clone(),
        });
        markup
    }

    /// One line per item; nested lists indented two spaces per level.
    fn render_list(&mut self, list: &IrNode, indent: usize) -> Vec<String> {
        let pad = " ".repeat(indent);
        let mut lines = Vec::new();

        for (n, item) in list.children.iter().enumerate() {
            let marker = match list.kind {
                NodeKind::NumberedList => format!("{}. ", n + 1),
                NodeKind::TodoList if item.attributes.checked == Some(true) => "- [x] ".into(),
                NodeKind::TodoList => "- [ ] ".into(),
                _ => "- ".into(),
            };
            lines.push(format!("{pad}{marker}{}", inline(&item.rich_text)));

            for child in &item.children {
                if child.kind.is_list() {
                    lines.extend(self.render_list(child, indent + 2));
                } else {
                    let block = self.render_node(child);
                    lines.extend(
                        block
                            .lines()
                            .map(|l| if l.is_empty() { String::new() } else { format!("{pad}  {l}") }),
                    );
                }
            }
        }
        lines
    }

    /// Quotes and callouts: every line prefixed with `> `.
    fn render_quote(&mut self, node: &IrNode) -> String {
        let mut text = inline(&node.rich_text);
        if node.kind == NodeKind::Callout {
            if let Some(icon) = node.attributes.icon.as_deref().filter(|i| !i.is_empty()) {
                text = format!("{icon} {text}");
            }
        }
        let mut blocks = vec![text];
        blocks.extend(self.render_blocks(&node.children));
        blocks
            .join("\n\n")
            .lines()
            .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {l}") })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Pipe grid with the separator under the first row.
    fn render_table(&mut self, rows: &[IrNode]) -> String {
        let grid: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.children.iter().map(cell_text).collect())
            .collect();
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return String::new();
        }

        let line = |cells: &[String]| {
            let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
            padded.resize(width, "");
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = Vec::with_capacity(grid.len() + 1);
        for (n, cells) in grid.iter().enumerate() {
            lines.push(line(cells));
            if n == 0 {
                lines.push(format!("|{}", " --- |".repeat(width)));
            }
        }
        lines.join("\n")
    }
}

fn cell_text(cell: &IrNode) -> String {
    inline(&cell.rich_text)
        .trim()
        .replace('|', "\\|")
        .replace('\n', "<br>")
}

fn inline(spans: &[RichTextSpan]) -> String {
    defuse(&render_inline(spans))
}

/// Break up anything in page text that reads as a placeholder.
fn defuse(text: &str) -> String {
    text.replace(PLACEHOLDER_PREFIX, DEFUSED_PREFIX)
}

/// A backtick fence longer than any backtick run inside `content`.
fn code_fence(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
