//! Frame classification for the chat response stream.

use tracing::warn;

use crate::api::StreamEvent;

/// Substrings the backend emits when its own pipeline fails. A frame
/// containing one of these is a fault for the whole attempt, even when the
/// frame happens to be structurally valid JSON.
pub const FAILURE_MARKERS: [&str; 3] = ["AI Service", "error", "Error"];

pub fn contains_failure_marker(frame: &str) -> bool {
    FAILURE_MARKERS.iter().any(|marker| frame.contains(marker))
}

/// Parse one frame as a stream event.
///
/// A frame that does not parse is dropped with a diagnostic and `None` is
/// returned; a single malformed line never aborts the rest of the stream.
pub fn parse_event(frame: &str) -> Option<StreamEvent> {
    match serde_json::from_str::<StreamEvent>(frame) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, frame = %frame, "dropping malformed frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_scan_matches_backend_failure_lines() {
        assert!(contains_failure_marker("AI Service unavailable"));
        assert!(contains_failure_marker(
            r#"{"detail":"Internal Server Error"}"#
        ));
        assert!(contains_failure_marker("unexpected error in upstream"));
    }

    #[test]
    fn marker_scan_leaves_ordinary_frames_alone() {
        assert!(!contains_failure_marker(
            r#"{"type":"token","content":"你好"}"#
        ));
        assert!(!contains_failure_marker(
            r#"{"type":"tool_start","name":"查找学生"}"#
        ));
    }

    #[test]
    fn valid_frames_classify() {
        let event = parse_event(r#"{"type":"token","content":"a"}"#).expect("parses");
        assert_eq!(
            event,
            StreamEvent::Token {
                content: "a".to_string()
            }
        );
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert_eq!(parse_event("not json at all"), None);
        assert_eq!(parse_event(r#"{"type":"token"}"#), None);
        assert_eq!(parse_event(""), None);
    }

    #[test]
    fn unknown_types_still_classify() {
        assert_eq!(
            parse_event(r#"{"type":"usage","tokens":12}"#),
            Some(StreamEvent::Unrecognized)
        );
    }
}
