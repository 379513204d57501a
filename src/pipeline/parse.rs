//! Notion block tree → IR.
//!
//! ## Dispatch
//!
//! Each block is converted by the rule for its `type`. Consecutive list
//! items of the same kind are merged into one list node with one child per
//! item. Layout containers (`column_list`, `column`, `synced_block`) add no
//! node of their own; their children are spliced in place.
//!
//! ## Depth cap
//!
//! Top-level blocks are at depth 0. A block at depth `max_depth` or deeper
//! is replaced by a single [`NodeKind::Unsupported`] leaf, so the IR never
//! nests deeper than the cap regardless of what the source returned.
//!
//! Parsing is pure: no I/O, no retries, no errors. Unknown block types
//! become unsupported nodes and are counted as skipped.

use super::rich_text::{parse_rich_text, plain_text};
use crate::ir::{IrNode, NodeAttributes, NodeKind, RichTextSpan};
use crate::source::SourceBlock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Block counts for one parse.
///
/// `skipped == total - converted` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    /// Every block in the input tree, descendants included.
    pub total: usize,
    /// Blocks handled by a conversion rule.
    pub converted: usize,
    /// Unknown block types, blocks beyond the depth cap and their subtrees.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub nodes: Vec<IrNode>,
    pub stats: BlockStats,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockParser {
    max_depth: usize,
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new(10)
    }
}

impl BlockParser {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn parse(&self, blocks: &[SourceBlock]) -> ParseOutput {
        let total = SourceBlock::count_tree(blocks);
        let mut converted = 0;
        let nodes = self.parse_siblings(blocks, 0, &mut converted);
        let stats = BlockStats {
            total,
            converted,
            skipped: total - converted,
        };
        debug!(
            "Parsed {} blocks into {} nodes ({} skipped)",
            stats.total,
            nodes.len(),
            stats.skipped
        );
        ParseOutput { nodes, stats }
    }

    fn parse_siblings(
        &self,
        blocks: &[SourceBlock],
        depth: usize,
        converted: &mut usize,
    ) -> Vec<IrNode> {
        let mut nodes = Vec::new();
        let mut i = 0;

        while i < blocks.len() {
            let block = &blocks[i];

            if depth >= self.max_depth {
                nodes.push(
                    IrNode::unsupported(format!(
                        "nesting deeper than {} levels omitted",
                        self.max_depth
                    ))
                    .with_attributes(block_attrs(block)),
                );
                i += 1;
                continue;
            }

            if let Some(kind) = list_kind(&block.block_type) {
                let mut items = Vec::new();
                while i < blocks.len() && list_kind(&blocks[i].block_type) == Some(kind) {
                    items.push(self.parse_list_item(&blocks[i], kind, depth, converted));
                    i += 1;
                }
                nodes.push(IrNode::new(kind).with_children(items));
                continue;
            }

            if is_transparent(&block.block_type) {
                *converted += 1;
                nodes.extend(self.parse_siblings(&block.children, depth + 1, converted));
            } else {
                nodes.push(self.parse_block(block, depth, converted));
            }
            i += 1;
        }

        nodes
    }

    fn parse_list_item(
        &self,
        block: &SourceBlock,
        kind: NodeKind,
        depth: usize,
        converted: &mut usize,
    ) -> IrNode {
        *converted += 1;
        let mut attributes = block_attrs(block);
        if kind == NodeKind::TodoList {
            attributes.checked = Some(
                block
                    .payload
                    .get("checked")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            );
        }
        IrNode::paragraph(spans(&block.payload))
            .with_attributes(attributes)
            .with_children(self.parse_siblings(&block.children, depth + 1, converted))
    }

    fn parse_block(&self, block: &SourceBlock, depth: usize, converted: &mut usize) -> IrNode {
        let p = &block.payload;
        let attrs = block_attrs(block);

        let node = match block.block_type.as_str() {
            "paragraph" | "toggle" => IrNode::paragraph(spans(p)),
            "heading_1" | "heading_2" | "heading_3" => {
                let level = block.block_type.as_bytes()[8] - b'0';
                IrNode::heading(level, spans(p))
            }
            "code" => IrNode::new(NodeKind::Code)
                .with_content(plain_text(&spans(p)))
                .with_attributes(NodeAttributes {
                    language: p
                        .get("language")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    ..attrs.clone()
                }),
            "equation" => IrNode::new(NodeKind::Code)
                .with_content(
                    p.get("expression")
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                )
                .with_attributes(NodeAttributes {
                    language: Some("tex".into()),
                    ..attrs.clone()
                }),
            "quote" => IrNode::new(NodeKind::Quote).with_rich_text(spans(p)),
            "callout" => IrNode::new(NodeKind::Callout)
                .with_rich_text(spans(p))
                .with_attributes(NodeAttributes {
                    icon: p
                        .pointer("/icon/emoji")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    ..attrs.clone()
                }),
            "divider" => IrNode::new(NodeKind::Divider),
            "image" => IrNode::new(NodeKind::Image).with_attributes(NodeAttributes {
                url: file_url(p),
                caption: caption(p),
                ..attrs.clone()
            }),
            "table" => {
                *converted += 1;
                return self.parse_table(block, depth, converted);
            }
            "embed" | "video" | "file" | "pdf" => {
                IrNode::new(NodeKind::Embed).with_attributes(NodeAttributes {
                    url: p
                        .get("url")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .or_else(|| file_url(p)),
                    caption: caption(p),
                    ..attrs.clone()
                })
            }
            "bookmark" | "link_preview" => {
                IrNode::new(NodeKind::Bookmark).with_attributes(NodeAttributes {
                    url: p.get("url").and_then(Value::as_str).map(str::to_string),
                    caption: caption(p),
                    ..attrs.clone()
                })
            }
            _ => {
                debug!("No rule for block type '{}' ({})", block.block_type, block.id);
                return IrNode::unsupported(describe_unsupported(block)).with_attributes(attrs);
            }
        };

        *converted += 1;
        let node = if node.attributes == NodeAttributes::default() {
            node.with_attributes(attrs)
        } else {
            node
        };
        let children = self.parse_siblings(&block.children, depth + 1, converted);
        if children.is_empty() {
            node
        } else {
            node.with_children(children)
        }
    }

    /// `table` → `TableRow` → `TableCell`. Header flags go on the table and
    /// its first row.
    fn parse_table(&self, block: &SourceBlock, depth: usize, converted: &mut usize) -> IrNode {
        let flag = |name: &str| {
            block
                .payload
                .get(name)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        let (col_header, row_header) = (flag("has_column_header"), flag("has_row_header"));

        let mut rows = Vec::new();
        for (n, row) in block.children.iter().enumerate() {
            if depth + 1 >= self.max_depth || row.block_type != "table_row" {
                rows.extend(self.parse_siblings(std::slice::from_ref(row), depth + 1, converted));
                continue;
            }
            *converted += 1;
            let cells = row
                .payload
                .get("cells")
                .and_then(Value::as_array)
                .map(|cells| {
                    cells
                        .iter()
                        .map(|c| IrNode::new(NodeKind::TableCell).with_rich_text(parse_rich_text(c)))
                        .collect()
                })
                .unwrap_or_default();
            let mut attributes = block_attrs(row);
            if n == 0 {
                attributes.has_column_header = col_header;
                attributes.has_row_header = row_header;
            }
            rows.push(
                IrNode::new(NodeKind::TableRow)
                    .with_children(cells)
                    .with_attributes(attributes),
            );
        }

        IrNode::new(NodeKind::Table)
            .with_children(rows)
            .with_attributes(NodeAttributes {
                has_column_header: col_header,
                has_row_header: row_header,
                ..block_attrs(block)
            })
    }
}

fn list_kind(block_type: &str) -> Option<NodeKind> {
    match block_type {
        "bulleted_list_item" => Some(NodeKind::BulletList),
        "numbered_list_item" => Some(NodeKind::NumberedList),
        "to_do" => Some(NodeKind::TodoList),
        _ => None,
    }
}

fn is_transparent(block_type: &str) -> bool {
    matches!(block_type, "column_list" | "column" | "synced_block")
}

fn block_attrs(block: &SourceBlock) -> NodeAttributes {
    NodeAttributes {
        block_id: Some(block.id.clone()),
        ..Default::default()
    }
}

fn spans(payload: &Value) -> Vec<RichTextSpan> {
    payload
        .get("rich_text")
        .map(parse_rich_text)
        .unwrap_or_default()
}

/// URL of a Notion-hosted (`file`) or external file object.
fn file_url(payload: &Value) -> Option<String> {
    payload
        .pointer("/file/url")
        .or_else(|| payload.pointer("/external/url"))
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

fn caption(payload: &Value) -> Option<String> {
    let text = plain_text(&parse_rich_text(payload.get("caption")?));
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn describe_unsupported(block: &SourceBlock) -> String {
    let title = block
        .payload
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());
    match title {
        Some(title) => format!("{} \"{}\"", block.block_type, title),
        None => block.block_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_block(id: &str, block_type: &str, text: &str) -> SourceBlock {
        SourceBlock::new(
            id,
            block_type,
            json!({"rich_text": [{"type": "text", "plain_text": text}]}),
        )
    }

    fn parse(blocks: &[SourceBlock]) -> ParseOutput {
        BlockParser::default().parse(blocks)
    }

    #[test]
    fn consecutive_list_items_merge() {
        let blocks = vec![
            text_block("1", "bulleted_list_item", "a"),
            text_block("2", "bulleted_list_item", "b"),
            text_block("3", "bulleted_list_item", "c"),
            text_block("4", "paragraph", "break"),
            text_block("5", "bulleted_list_item", "d"),
        ];
        let out = parse(&blocks);
        assert_eq!(out.nodes.len(), 3);
        assert_eq!(out.nodes[0].kind, NodeKind::BulletList);
        assert_eq!(out.nodes[0].children.len(), 3);
        assert_eq!(out.nodes[0].children[1].plain_text(), "b");
        assert_eq!(out.nodes[2].children.len(), 1);
    }

    #[test]
    fn different_list_kinds_do_not_merge() {
        let blocks = vec![
            text_block("1", "bulleted_list_item", "a"),
            text_block("2", "numbered_list_item", "b"),
            SourceBlock::new(
                "3",
                "to_do",
                json!({"rich_text": [{"plain_text": "c"}], "checked": true}),
            ),
        ];
        let out = parse(&blocks);
        let kinds: Vec<NodeKind> = out.nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [NodeKind::BulletList, NodeKind::NumberedList, NodeKind::TodoList]
        );
        assert_eq!(out.nodes[2].children[0].attributes.checked, Some(true));
    }

    #[test]
    fn headings_carry_level() {
        let out = parse(&[text_block("h", "heading_3", "Deep")]);
        assert_eq!(out.nodes[0].kind, NodeKind::Heading);
        assert_eq!(out.nodes[0].attributes.level, Some(3));
    }

    #[test]
    fn unknown_type_becomes_unsupported_and_skipped() {
        let blocks = vec![
            text_block("p", "paragraph", "ok"),
            SourceBlock::new("x", "ai_block", json!({})),
        ];
        let out = parse(&blocks);
        assert_eq!(out.nodes[1].kind, NodeKind::Unsupported);
        assert_eq!(out.nodes[1].content.as_deref(), Some("ai_block"));
        assert_eq!(out.stats.total, 2);
        assert_eq!(out.stats.converted, 1);
        assert_eq!(out.stats.skipped, 1);
    }

    #[test]
    fn child_page_is_described_by_title() {
        let out = parse(&[SourceBlock::new("c", "child_page", json!({"title": "Sub"}))]);
        assert_eq!(out.nodes[0].content.as_deref(), Some("child_page \"Sub\""));
    }

    fn nested_toggles(depth: usize) -> SourceBlock {
        let mut block = text_block("leaf", "toggle", "leaf");
        for level in (0..depth - 1).rev() {
            block = text_block(&format!("t{level}"), "toggle", "t").with_children(vec![block]);
        }
        block
    }

    #[test]
    fn depth_cap_ends_in_unsupported_leaf() {
        let cap = 4;
        let tree = vec![nested_toggles(cap + 5)];
        let out = BlockParser::new(cap).parse(&tree);

        let mut node = &out.nodes[0];
        let mut depth = 0;
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, cap);
        assert_eq!(node.kind, NodeKind::Unsupported);
        assert!(node.content.as_deref().unwrap().contains("4 levels"));
        assert_eq!(out.stats.total, cap + 5);
        assert_eq!(out.stats.converted, cap);
        assert_eq!(out.stats.skipped, out.stats.total - out.stats.converted);
    }

    #[test]
    fn supported_tree_never_grows_and_stats_balance() {
        let blocks = vec![
            text_block("1", "heading_1", "T"),
            text_block("2", "bulleted_list_item", "a")
                .with_children(vec![text_block("3", "bulleted_list_item", "a.1")]),
            text_block("4", "bulleted_list_item", "b"),
            SourceBlock::new("5", "divider", json!({})),
        ];
        let out = parse(&blocks);
        assert!(out.nodes.len() <= blocks.len());
        assert_eq!(out.stats.total, 5);
        assert_eq!(out.stats.converted, 5);
        assert_eq!(out.stats.skipped, 0);

        let nested = &out.nodes[1].children[0].children[0];
        assert_eq!(nested.kind, NodeKind::BulletList);
        assert_eq!(nested.children[0].plain_text(), "a.1");
    }

    #[test]
    fn table_rows_and_header_flags() {
        let row = |id: &str, a: &str, b: &str| {
            SourceBlock::new(
                id,
                "table_row",
                json!({"cells": [[{"plain_text": a}], [{"plain_text": b}]]}),
            )
        };
        let table = SourceBlock::new(
            "t",
            "table",
            json!({"table_width": 2, "has_column_header": true, "has_row_header": false}),
        )
        .with_children(vec![row("r1", "Name", "Qty"), row("r2", "Apple", "3")]);

        let out = parse(&[table]);
        let t = &out.nodes[0];
        assert_eq!(t.kind, NodeKind::Table);
        assert!(t.attributes.has_column_header);
        assert_eq!(t.children.len(), 2);
        assert!(t.children[0].attributes.has_column_header);
        assert!(!t.children[1].attributes.has_column_header);
        assert_eq!(t.children[1].children[0].plain_text(), "Apple");
        assert_eq!(out.stats.converted, 3);
    }

    #[test]
    fn image_keeps_url_caption_and_block_id() {
        let image = SourceBlock::new(
            "img-1",
            "image",
            json!({
                "type": "file",
                "file": {"url": "https://s3.example/a.png?sig=1", "expiry_time": "2030-01-01"},
                "caption": [{"plain_text": "A chart"}]
            }),
        );
        let node = &parse(&[image]).nodes[0];
        assert_eq!(node.kind, NodeKind::Image);
        assert_eq!(node.attributes.url.as_deref(), Some("https://s3.example/a.png?sig=1"));
        assert_eq!(node.attributes.caption.as_deref(), Some("A chart"));
        assert_eq!(node.attributes.block_id.as_deref(), Some("img-1"));
    }

    #[test]
    fn columns_are_spliced_in_place() {
        let columns = SourceBlock::new("cl", "column_list", json!({})).with_children(vec![
            SourceBlock::new("c1", "column", json!({}))
                .with_children(vec![text_block("p1", "paragraph", "left")]),
            SourceBlock::new("c2", "column", json!({}))
                .with_children(vec![text_block("p2", "paragraph", "right")]),
        ]);
        let out = parse(&[columns]);
        assert_eq!(out.nodes.len(), 2);
        assert_eq!(out.nodes[1].plain_text(), "right");
        assert_eq!(out.stats.skipped, 0);
    }

    #[test]
    fn equation_becomes_tex_code() {
        let eq = SourceBlock::new("e", "equation", json!({"expression": "e=mc^2"}));
        let node = &parse(&[eq]).nodes[0];
        assert_eq!(node.kind, NodeKind::Code);
        assert_eq!(node.attributes.language.as_deref(), Some("tex"));
        assert_eq!(node.content.as_deref(), Some("e=mc^2"));
    }
}
