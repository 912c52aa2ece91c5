//! Bounded retry around the send-and-consume cycle.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::chat_stream::{run_attempt, StreamError, CHAT_ENDPOINT};
use crate::core::turn::ChatTurn;
use crate::render::RenderSink;
use crate::utils::url::construct_api_url;

/// Total attempts for one logical send, the first included.
pub const MAX_ATTEMPTS: u32 = 5;

const BASE_DELAY_MS: u64 = 1_000;
const DELAY_CAP_MS: u64 = 5_000;

/// Backoff after failed attempt `attempt` (0-based): 1000, 2000, 4000,
/// 5000, 5000 ms across the attempt budget.
pub fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis((BASE_DELAY_MS << attempt.min(16)).min(DELAY_CAP_MS))
}

/// Terminal failure after the whole attempt budget. Keeps the user's
/// message intact for a manual resend.
#[derive(Debug)]
pub struct ExhaustedRetries {
    pub attempts: u32,
    pub original_text: String,
    pub last_error: StreamError,
}

impl fmt::Display for ExhaustedRetries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "giving up after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

impl StdError for ExhaustedRetries {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.last_error)
    }
}

/// Owns the request-plus-stream cycle for one logical send: attempts run
/// strictly one after another, backing off between failures and replaying
/// the identical original text each time.
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    max_attempts: u32,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: construct_api_url(base_url, CHAT_ENDPOINT),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One logical send. On success returns the completed turn; on
    /// exhaustion the sink has been told to offer a manual resend of
    /// `text`, unchanged.
    pub async fn send_message(
        &self,
        thread_id: &str,
        text: &str,
        sink: &mut dyn RenderSink,
    ) -> Result<ChatTurn, ExhaustedRetries> {
        self.send_message_with_cancel(thread_id, text, sink, &CancellationToken::new())
            .await
    }

    /// Like [`send_message`](Self::send_message), but tied to a caller-held
    /// cancellation token. Cancelling it stops the in-flight attempt at the
    /// next chunk boundary and prevents further retries; the partial turn
    /// streamed so far is returned as the result.
    pub async fn send_message_with_cancel(
        &self,
        thread_id: &str,
        text: &str,
        sink: &mut dyn RenderSink,
        cancel: &CancellationToken,
    ) -> Result<ChatTurn, ExhaustedRetries> {
        let mut last_error: Option<StreamError> = None;

        for attempt in 0..self.max_attempts {
            // Every attempt starts from fresh turn state; only the sink's
            // placeholder carries over between attempts.
            let mut turn = ChatTurn::new(thread_id, text);
            let attempt_cancel = cancel.child_token();

            match run_attempt(
                &self.client,
                &self.endpoint,
                &mut turn,
                sink,
                &attempt_cancel,
            )
            .await
            {
                Ok(()) => return Ok(turn),
                Err(err) => {
                    warn!(attempt, error = %err, "chat attempt failed");
                    last_error = Some(err);
                    if cancel.is_cancelled() {
                        return Ok(turn);
                    }
                    if attempt + 1 < self.max_attempts {
                        sink.show_retry_status(attempt + 1, self.max_attempts);
                        tokio::time::sleep(retry_delay(attempt)).await;
                    } else {
                        turn.mark_errored();
                        debug!(state = ?turn.state(), "attempt budget exhausted");
                    }
                }
            }
        }

        let failure = ExhaustedRetries {
            attempts: self.max_attempts,
            original_text: text.to_string(),
            last_error: last_error.unwrap_or_else(|| StreamError::Network {
                message: "no attempt was made".to_string(),
            }),
        };
        sink.show_terminal_error(&failure.to_string(), &failure.original_text);
        Err(failure)
    }
}
