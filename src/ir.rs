//! Platform-neutral intermediate representation of a document.
//!
//! The parser produces a `Vec<IrNode>` in document order; the formatter
//! consumes it. Nothing in here knows about Notion or note.com.

use serde::{Deserialize, Serialize};

/// Closed set of node kinds the formatter knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Heading,
    Paragraph,
    BulletList,
    NumberedList,
    TodoList,
    Code,
    Quote,
    Callout,
    Divider,
    Image,
    Table,
    TableRow,
    TableCell,
    Embed,
    Bookmark,
    Unsupported,
}

impl NodeKind {
    pub fn is_list(self) -> bool {
        matches!(self, Self::BulletList | Self::NumberedList | Self::TodoList)
    }
}

/// Inline formatting flags. Each one is independent of the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

impl Annotations {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A run of text sharing one set of annotations and at most one link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextSpan {
    pub text: String,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl RichTextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Kind-specific attributes. Only the fields meaningful for a node's kind
/// are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_column_header: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_row_header: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Id of the source block this node came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrNode {
    pub kind: NodeKind,
    /// Plain content for kinds without rich text (code, unsupported notes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IrNode>,
    #[serde(default)]
    pub attributes: NodeAttributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rich_text: Vec<RichTextSpan>,
}

impl IrNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            content: None,
            children: Vec::new(),
            attributes: NodeAttributes::default(),
            rich_text: Vec::new(),
        }
    }

    pub fn with_rich_text(mut self, spans: Vec<RichTextSpan>) -> Self {
        self.rich_text = spans;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_children(mut self, children: Vec<IrNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_attributes(mut self, attributes: NodeAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn heading(level: u8, spans: Vec<RichTextSpan>) -> Self {
        Self::new(NodeKind::Heading)
            .with_rich_text(spans)
            .with_attributes(NodeAttributes {
                level: Some(level.clamp(1, 6)),
                ..Default::default()
            })
    }

    pub fn paragraph(spans: Vec<RichTextSpan>) -> Self {
        Self::new(NodeKind::Paragraph).with_rich_text(spans)
    }

    /// Visible stand-in for content that could not be converted.
    pub fn unsupported(description: impl Into<String>) -> Self {
        Self::new(NodeKind::Unsupported).with_content(description)
    }

    /// Rich text joined without markup, falling back to `content`.
    pub fn plain_text(&self) -> String {
        if self.rich_text.is_empty() {
            return self.content.clone().unwrap_or_default();
        }
        self.rich_text.iter().map(|s| s.text.as_str()).collect()
    }

    /// Number of nodes of `kind` in `nodes` and all their descendants.
    pub fn count_kind(nodes: &[IrNode], kind: NodeKind) -> usize {
        nodes
            .iter()
            .map(|n| usize::from(n.kind == kind) + Self::count_kind(&n.children, kind))
            .sum()
    }
}
