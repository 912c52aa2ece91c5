//! One request-and-stream-consumption attempt against the chat endpoint.

use std::error::Error as StdError;
use std::fmt;

use futures_util::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatRequest;
use crate::core::events;
use crate::core::frames::FrameBuffer;
use crate::core::turn::ChatTurn;
use crate::render::RenderSink;

/// Path of the chat endpoint relative to the configured base URL.
pub const CHAT_ENDPOINT: &str = "api/ai/chat";

/// Failures that abort one attempt and escalate to the retry boundary.
///
/// A single malformed line is not represented here: it is dropped inside
/// the consumption loop and the stream continues.
#[derive(Debug)]
pub enum StreamError {
    /// The request failed, the status was not a success, or a mid-stream
    /// read failed.
    Network { message: String },
    /// The response is not the chat stream: an HTML error page, or a frame
    /// carrying a backend failure marker.
    Protocol { message: String },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Network { message } => write!(f, "network failure: {message}"),
            StreamError::Protocol { message } => write!(f, "protocol failure: {message}"),
        }
    }
}

impl StdError for StreamError {}

/// Run one attempt: issue the request, validate the response, and feed the
/// body through the frame/event pipeline into `turn`.
pub async fn run_attempt(
    client: &reqwest::Client,
    endpoint: &str,
    turn: &mut ChatTurn,
    sink: &mut dyn RenderSink,
    cancel: &CancellationToken,
) -> Result<(), StreamError> {
    let request = ChatRequest {
        message: turn.user_text().to_string(),
        thread_id: turn.thread_id().to_string(),
    };

    let response = client
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .map_err(|err| StreamError::Network {
            message: err.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::Network {
            message: format!("HTTP {status}"),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if content_type.contains("text/html") {
        return Err(StreamError::Protocol {
            message: "server answered with an HTML error page".to_string(),
        });
    }
    if !content_type.contains("application/json") && !content_type.contains("text/plain") {
        warn!(content_type = %content_type, "unexpected content type on chat response");
    }

    consume_stream(response.bytes_stream(), turn, sink, cancel).await
}

/// Drive the frame/event loop over a chunked byte source. Generic over the
/// source so tests can feed synthetic chunk sequences.
pub(crate) async fn consume_stream<S, B, E>(
    mut stream: S,
    turn: &mut ChatTurn,
    sink: &mut dyn RenderSink,
    cancel: &CancellationToken,
) -> Result<(), StreamError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut frames = FrameBuffer::new();
    while let Some(chunk) = stream.next().await {
        if cancel.is_cancelled() {
            debug!("attempt cancelled mid-stream");
            return Ok(());
        }
        let chunk = chunk.map_err(|err| StreamError::Network {
            message: format!("stream read failed: {err}"),
        })?;
        frames.extend(chunk.as_ref());
        while let Some(frame) = frames.next_frame() {
            if frame.is_empty() {
                continue;
            }
            if events::contains_failure_marker(&frame) {
                return Err(StreamError::Protocol {
                    message: "backend reported an internal failure".to_string(),
                });
            }
            if let Some(event) = events::parse_event(&frame) {
                turn.apply(event, sink);
            }
        }
    }
    if frames.trailing_len() > 0 {
        debug!(
            bytes = frames.trailing_len(),
            "discarding unterminated trailing frame"
        );
    }
    Ok(())
}
