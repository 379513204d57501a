//! Notion objects as seen by the converter.

use crate::error::SourceError;
use crate::extract::{first_match, string_at, Extractor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of a Notion block tree.
///
/// `payload` is the type-specific object Notion stores under the key named
/// by `type` (e.g. `block["paragraph"]`), kept as raw JSON so unknown block
/// types survive untouched until the parser decides what to do with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBlock {
    pub id: String,
    pub block_type: String,
    pub has_children: bool,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SourceBlock>,
}

impl SourceBlock {
    pub fn new(id: impl Into<String>, block_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            has_children: false,
            payload,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SourceBlock>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// Build from a block object returned by `GET /blocks/{id}/children`.
    pub fn from_json(raw: &Value) -> Result<Self, SourceError> {
        let id = string_at(raw, "/id")
            .ok_or_else(|| SourceError::InvalidResponse("block without id".into()))?;
        let block_type = string_at(raw, "/type").ok_or_else(|| {
            SourceError::InvalidResponse(format!("block {id} without type"))
        })?;
        let payload = raw.get(&block_type).cloned().unwrap_or(Value::Null);
        Ok(Self {
            has_children: raw
                .get("has_children")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            id,
            block_type,
            payload,
            children: Vec::new(),
        })
    }

    /// Number of blocks in `blocks`, counting every descendant.
    pub fn count_tree(blocks: &[SourceBlock]) -> usize {
        blocks
            .iter()
            .map(|b| 1 + Self::count_tree(&b.children))
            .sum()
    }

    /// Whether fetching children would walk into another page's content.
    pub fn is_page_boundary(&self) -> bool {
        matches!(self.block_type.as_str(), "child_page" | "child_database")
    }

    /// Block whose children must be read from, for synced-block copies.
    pub fn children_source_id(&self) -> &str {
        if self.block_type == "synced_block" {
            if let Some(original) = self
                .payload
                .pointer("/synced_from/block_id")
                .and_then(Value::as_str)
            {
                return original;
            }
        }
        &self.id
    }
}

/// Page-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
}

impl DocumentInfo {
    /// Build from a page object (`GET /pages/{id}` or a database query row).
    pub fn from_page_json(raw: &Value) -> Result<Self, SourceError> {
        let id = string_at(raw, "/id")
            .ok_or_else(|| SourceError::InvalidResponse("page without id".into()))?;
        Ok(Self {
            title: first_match(raw, TITLE_EXTRACTORS).unwrap_or_else(|| "Untitled".to_string()),
            url: string_at(raw, "/url").unwrap_or_default(),
            created_time: string_at(raw, "/created_time"),
            last_edited_time: string_at(raw, "/last_edited_time"),
            id,
        })
    }
}

const TITLE_EXTRACTORS: &[Extractor<String>] = &[
    title_property_named_title,
    title_property_named_name,
    any_title_property,
];

fn title_property_named_title(page: &Value) -> Option<String> {
    plain_text_of(page.pointer("/properties/title/title")?)
}

fn title_property_named_name(page: &Value) -> Option<String> {
    plain_text_of(page.pointer("/properties/Name/title")?)
}

fn any_title_property(page: &Value) -> Option<String> {
    page.get("properties")?
        .as_object()?
        .values()
        .filter(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        .find_map(|prop| plain_text_of(prop.get("title")?))
}

/// Concatenated `plain_text` of a rich-text array; `None` when empty.
pub(crate) fn plain_text_of(rich_text: &Value) -> Option<String> {
    let text: String = rich_text
        .as_array()?
        .iter()
        .filter_map(|span| span.get("plain_text").and_then(Value::as_str))
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Raw bytes of a downloaded image.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}
