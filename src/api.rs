use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: String,
}

/// One newline-delimited event from the chat response stream, discriminated
/// by the wire `type` field.
///
/// Unknown tags deserialize as [`StreamEvent::Unrecognized`] so a newer
/// backend does not break the client; a frame missing the fields its tag
/// requires fails to parse and is dropped by the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token {
        content: String,
    },
    /// The backend has emitted both `tool_start` and the older `tool` tag.
    #[serde(alias = "tool")]
    ToolStart {
        name: String,
    },
    ToolEnd {
        name: String,
    },
    #[serde(other)]
    Unrecognized,
}
