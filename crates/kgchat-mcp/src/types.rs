//! Tool call results, normalized from the rmcp model.

use rmcp::model::{self as rmcp_model, RawContent};
use serde::{Deserialize, Serialize};

/// Result of one remote tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool flagged the result as an error.
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result with a single text block.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: false,
        }
    }

    /// An error result with a single text block.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// All text blocks joined by newlines.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                ToolContent::Resource { data, .. } => data.as_deref(),
                ToolContent::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<rmcp_model::CallToolResult> for ToolResult {
    fn from(result: rmcp_model::CallToolResult) -> Self {
        let mut content: Vec<ToolContent> =
            result.content.iter().map(ToolContent::from_rmcp).collect();

        // Servers that only return structured output still produce text.
        if content.is_empty()
            && let Some(structured) = result.structured_content
        {
            content.push(ToolContent::Text {
                text: structured.to_string(),
            });
        }

        Self {
            content,
            is_error: result.is_error.unwrap_or(false),
        }
    }
}

/// Content block returned by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Image content.
    Image {
        /// Base64-encoded image data.
        data: String,
        /// MIME type.
        mime_type: String,
    },
    /// Embedded or linked resource.
    Resource {
        /// Resource URI.
        uri: String,
        /// Inline text or base64 blob, if embedded.
        data: Option<String>,
        /// MIME type.
        mime_type: Option<String>,
    },
}

impl ToolContent {
    fn from_rmcp(content: &rmcp_model::Content) -> Self {
        match &**content {
            RawContent::Text(text) => Self::Text {
                text: text.text.clone(),
            },
            RawContent::Image(image) => Self::Image {
                data: image.data.clone(),
                mime_type: image.mime_type.clone(),
            },
            RawContent::Resource(embedded) => match &embedded.resource {
                rmcp_model::ResourceContents::TextResourceContents {
                    uri,
                    mime_type,
                    text,
                    ..
                } => Self::Resource {
                    uri: uri.clone(),
                    data: Some(text.clone()),
                    mime_type: mime_type.clone(),
                },
                rmcp_model::ResourceContents::BlobResourceContents {
                    uri,
                    mime_type,
                    blob,
                    ..
                } => Self::Resource {
                    uri: uri.clone(),
                    data: Some(blob.clone()),
                    mime_type: mime_type.clone(),
                },
            },
            RawContent::Audio(_) => Self::Text {
                text: "[audio content]".to_string(),
            },
            RawContent::ResourceLink(resource) => Self::Resource {
                uri: resource.uri.clone(),
                data: None,
                mime_type: resource.mime_type.clone(),
            },
        }
    }
}
