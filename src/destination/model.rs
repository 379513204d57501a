//! note.com request and response shapes.

use crate::extract::{first_match, scalar_at, string_at, Extractor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field order S3 expects ahead of any extra policy fields.
pub const STORAGE_FIELD_ORDER: &[&str] = &[
    "key",
    "acl",
    "Expires",
    "policy",
    "x-amz-credential",
    "x-amz-algorithm",
    "x-amz-date",
    "x-amz-signature",
];

/// Result of the presign call: where to POST the file, and where it will be
/// served from afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPost {
    /// Storage endpoint (`action` of the HTML form S3 expects).
    pub upload_url: String,
    /// Public URL of the object once uploaded.
    pub final_url: String,
    /// Policy fields in upload order.
    pub fields: Vec<(String, String)>,
}

impl PresignedPost {
    pub fn from_json(raw: &Value) -> Option<Self> {
        let upload_url = first_match(raw, UPLOAD_URL_EXTRACTORS)?;
        let final_url = first_match(raw, FINAL_URL_EXTRACTORS)?;
        let fields = raw
            .pointer("/data/post")
            .or_else(|| raw.get("post"))
            .and_then(Value::as_object)
            .map(ordered_fields)
            .unwrap_or_default();
        Some(Self {
            upload_url,
            final_url,
            fields,
        })
    }
}

const UPLOAD_URL_EXTRACTORS: &[Extractor<String>] = &[data_action, top_action];

const FINAL_URL_EXTRACTORS: &[Extractor<String>] = &[data_url, top_url];

fn data_action(v: &Value) -> Option<String> {
    string_at(v, "/data/action")
}

fn top_action(v: &Value) -> Option<String> {
    string_at(v, "/action")
}

fn data_url(v: &Value) -> Option<String> {
    string_at(v, "/data/url")
}

fn top_url(v: &Value) -> Option<String> {
    string_at(v, "/url")
}

/// Known fields in storage order, then the rest as the response listed them.
pub fn ordered_fields(fields: &Map<String, Value>) -> Vec<(String, String)> {
    let render = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let mut ordered: Vec<(String, String)> = STORAGE_FIELD_ORDER
        .iter()
        .filter_map(|wanted| {
            fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
                .map(|(k, v)| (k.clone(), render(v)))
        })
        .collect();

    for (k, v) in fields {
        let known = STORAGE_FIELD_ORDER
            .iter()
            .any(|wanted| k.eq_ignore_ascii_case(wanted));
        if !known && k != "file" {
            ordered.push((k.clone(), render(v)));
        }
    }
    ordered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

/// Body of `POST /api/v1/text_notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
}

/// Identifiers of a created post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub id: Option<String>,
    pub key: Option<String>,
    pub url: Option<String>,
}

impl CreatedPost {
    pub fn from_json(raw: &Value, base_url: &str) -> Self {
        let key = first_match(raw, KEY_EXTRACTORS);
        let url = first_match(raw, URL_EXTRACTORS)
            .or_else(|| key.as_ref().map(|k| format!("{base_url}/n/{k}")));
        Self {
            id: first_match(raw, ID_EXTRACTORS),
            key,
            url,
        }
    }
}

const ID_EXTRACTORS: &[Extractor<String>] = &[data_id, top_id];

const KEY_EXTRACTORS: &[Extractor<String>] = &[data_key, top_key];

const URL_EXTRACTORS: &[Extractor<String>] = &[data_note_url, data_url, top_note_url, top_url];

fn data_id(v: &Value) -> Option<String> {
    scalar_at(v, "/data/id")
}

fn top_id(v: &Value) -> Option<String> {
    scalar_at(v, "/id")
}

fn data_key(v: &Value) -> Option<String> {
    string_at(v, "/data/key")
}

fn top_key(v: &Value) -> Option<String> {
    string_at(v, "/key")
}

fn data_note_url(v: &Value) -> Option<String> {
    string_at(v, "/data/note_url")
}

fn top_note_url(v: &Value) -> Option<String> {
    string_at(v, "/note_url")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presign_parsed_from_data_envelope() {
        let raw = json!({"data": {
            "url": "https://assets.example/img/final.png",
            "action": "https://bucket.s3.example/",
            "post": {"key": "img/final.png", "policy": "p", "acl": "public-read"}
        }});
        let p = PresignedPost::from_json(&raw).unwrap();
        assert_eq!(p.upload_url, "https://bucket.s3.example/");
        assert_eq!(p.final_url, "https://assets.example/img/final.png");
        let names: Vec<&str> = p.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["key", "acl", "policy"]);
    }

    #[test]
    fn presign_parsed_from_top_level() {
        let raw = json!({"url": "https://a/final", "action": "https://s3/", "post": {}});
        let p = PresignedPost::from_json(&raw).unwrap();
        assert_eq!(p.final_url, "https://a/final");
        assert!(p.fields.is_empty());
    }

    #[test]
    fn presign_without_action_is_rejected() {
        assert!(PresignedPost::from_json(&json!({"data": {"url": "https://a"}})).is_none());
    }

    #[test]
    fn extras_follow_known_fields_in_response_order() {
        let raw = json!({
            "x-amz-signature": "sig",
            "success_action_status": 201,
            "Content-Type": "image/png",
            "key": "k",
            "x-amz-date": "20240101T000000Z",
            "file": "ignored"
        });
        let fields = ordered_fields(raw.as_object().unwrap());
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            ["key", "x-amz-date", "x-amz-signature", "success_action_status", "Content-Type"]
        );
        assert_eq!(fields[3].1, "201");
    }

    #[test]
    fn every_policy_field_in_storage_order() {
        let raw = json!({
            "x-amz-signature": "sig",
            "policy": "cG9saWN5",
            "x-amz-date": "20240101T000000Z",
            "Expires": "2024-01-01T01:00:00Z",
            "x-amz-algorithm": "AWS4-HMAC-SHA256",
            "acl": "public-read",
            "x-amz-credential": "cred",
            "key": "uploads/a.png"
        });
        let fields = ordered_fields(raw.as_object().unwrap());
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, STORAGE_FIELD_ORDER);
        assert_eq!(fields[2].1, "2024-01-01T01:00:00Z");
    }

    #[test]
    fn created_post_url_built_from_key() {
        let raw = json!({"data": {"id": 12345, "key": "n1a2b3c"}});
        let post = CreatedPost::from_json(&raw, "https://note.com");
        assert_eq!(post.id.as_deref(), Some("12345"));
        assert_eq!(post.url.as_deref(), Some("https://note.com/n/n1a2b3c"));
    }

    #[test]
    fn status_serializes_lowercase() {
        let draft = PostDraft {
            title: "t".into(),
            body: "b".into(),
            status: PostStatus::Draft,
            tags: vec!["rust".into()],
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["status"], json!("draft"));
        assert_eq!(v["tags"], json!(["rust"]));
    }
}
