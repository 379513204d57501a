//! `multipart/form-data` encoding with caller-controlled field order.
//!
//! S3 presigned POST policies are evaluated against the form fields in the
//! order they arrive and require `file` to be the last part, so the body is
//! built by hand instead of through a client library that may reorder it.
//! The same builder encodes the presign request sent to note.com.

/// Ordered multipart body under construction.
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    boundary: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl Part {
    fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } | Part::File { name, .. } => name,
        }
    }
}

/// Encoded body ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    /// Full `Content-Type` header value, boundary included.
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Part names in encoding order.
    pub field_names: Vec<String>,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    /// Builder with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!(
            "----notion2note{:016x}{:016x}",
            rand::random::<u64>(),
            rand::random::<u64>()
        ))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    pub fn build(self) -> MultipartBody {
        let mut bytes = Vec::new();
        let field_names = self.parts.iter().map(|p| p.name().to_string()).collect();

        for part in &self.parts {
            bytes.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Text { name, value } => {
                    bytes.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            quote(name)
                        )
                        .as_bytes(),
                    );
                    bytes.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    content_type,
                    bytes: data,
                } => {
                    bytes.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: {}\r\n\r\n",
                            quote(name),
                            quote(file_name),
                            content_type
                        )
                        .as_bytes(),
                    );
                    bytes.extend_from_slice(data);
                }
            }
            bytes.extend_from_slice(b"\r\n");
        }
        bytes.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        MultipartBody {
            content_type: format!("multipart/form-data; boundary={}", self.boundary),
            bytes,
            field_names,
        }
    }
}

fn quote(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}
