//! Per-turn streaming state and the event reducer.

use tracing::debug;

use crate::api::StreamEvent;
use crate::core::leak_filter;
use crate::core::tools::ToolTracker;
use crate::render::RenderSink;
use crate::utils::sanitize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    Placeholder,
    Streaming,
    ToolActive,
    Locked,
    Errored,
}

/// State for one user message and the assistant turn streaming in reply.
///
/// Exactly one turn is streamed at a time per thread and the reducer owns
/// all of this state, so nothing here needs locking. The raw narrative
/// only ever grows by appending token content in arrival order; what the
/// user sees is a filtered view recomputed from it on every render pass.
#[derive(Debug)]
pub struct ChatTurn {
    thread_id: String,
    user_text: String,
    narrative: String,
    tools: ToolTracker,
    state: PresentationState,
    placeholder_cleared: bool,
}

impl ChatTurn {
    pub fn new(thread_id: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            user_text: user_text.into(),
            narrative: String::new(),
            tools: ToolTracker::default(),
            state: PresentationState::Placeholder,
            placeholder_cleared: false,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn tools(&self) -> &ToolTracker {
        &self.tools
    }

    /// The ordered concatenation of every token's content, unfiltered.
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// What the user should currently see: the sanitize pass plus the
    /// leaked-record filter over the full narrative. The record filter
    /// stays off until the turn has tool history.
    pub fn visible_narrative(&self) -> String {
        let sanitized = sanitize::scrub(&self.narrative);
        leak_filter::strip_leaked_records(&sanitized, !self.tools.history().is_empty())
    }

    pub fn mark_errored(&mut self) {
        self.state = PresentationState::Errored;
    }

    /// Apply one classified event and drive the sink.
    pub fn apply(&mut self, event: StreamEvent, sink: &mut dyn RenderSink) {
        if !self.placeholder_cleared {
            self.placeholder_cleared = true;
            sink.clear_placeholder();
        }

        match event {
            StreamEvent::Token { content } => {
                self.narrative.push_str(&content);
                if self.tools.open_count() > 0 {
                    // Rendering is suppressed while tools run; the token
                    // still accumulates.
                    return;
                }
                self.state = PresentationState::Streaming;
                sink.replace_narrative(&self.visible_narrative());
            }
            StreamEvent::ToolStart { name } => {
                self.tools.start(&name);
                self.state = PresentationState::ToolActive;
                debug!(tool = %name, open = self.tools.open_count(), "tool started");
                if let Some((display, icon)) = self.tools.displayed() {
                    sink.show_tool_banner(display, icon);
                }
            }
            StreamEvent::ToolEnd { name } => {
                let removed = self.tools.end(&name);
                debug!(tool = %name, removed, open = self.tools.open_count(), "tool ended");
                if let Some((display, icon)) = self.tools.displayed() {
                    sink.show_tool_banner(display, icon);
                } else if removed {
                    // The open count went 1 -> 0: freeze the summary.
                    self.state = PresentationState::Locked;
                    sink.lock_tool_summary(self.tools.history());
                }
            }
            StreamEvent::Unrecognized => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{Instruction, RecordingSink};

    fn token(content: &str) -> StreamEvent {
        StreamEvent::Token {
            content: content.to_string(),
        }
    }

    fn tool_start(name: &str) -> StreamEvent {
        StreamEvent::ToolStart {
            name: name.to_string(),
        }
    }

    fn tool_end(name: &str) -> StreamEvent {
        StreamEvent::ToolEnd {
            name: name.to_string(),
        }
    }

    #[test]
    fn tokens_interleaved_with_one_tool_call() {
        let mut turn = ChatTurn::new("t1", "查一下");
        let mut sink = RecordingSink::default();

        turn.apply(token("Hello "), &mut sink);
        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_end("查找学生"), &mut sink);
        turn.apply(token("World"), &mut sink);

        assert_eq!(turn.visible_narrative(), "Hello World");
        assert_eq!(turn.tools().history().len(), 1);
        assert_eq!(turn.tools().history()[0].name, "查找学生");
        assert_eq!(turn.state(), PresentationState::Streaming);

        let locked = sink
            .instructions
            .iter()
            .find_map(|i| match i {
                Instruction::Locked(history) => Some(history.clone()),
                _ => None,
            })
            .expect("summary locked");
        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].ordinal, 1);
    }

    #[test]
    fn suppressed_tokens_accumulate_without_rendering() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(token("before "), &mut sink);
        turn.apply(tool_start("统计人数"), &mut sink);
        let renders_before = sink.narratives().len();
        turn.apply(token("hidden "), &mut sink);
        assert_eq!(sink.narratives().len(), renders_before);

        turn.apply(tool_end("统计人数"), &mut sink);
        turn.apply(token("after"), &mut sink);

        // The raw narrative is the full token concatenation, in order.
        assert_eq!(turn.narrative(), "before hidden after");
    }

    #[test]
    fn narrative_rendering_is_suppressed_while_any_tool_is_open() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_end("查找学生"), &mut sink);
        turn.apply(token("still hidden"), &mut sink);
        assert!(sink.narratives().is_empty());
        assert_eq!(turn.state(), PresentationState::ToolActive);

        turn.apply(tool_end("查找学生"), &mut sink);
        assert_eq!(turn.state(), PresentationState::Locked);
    }

    #[test]
    fn lock_happens_only_when_open_count_reaches_zero() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_start("更新课程"), &mut sink);
        turn.apply(tool_end("更新课程"), &mut sink);
        assert!(!sink
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::Locked(_))));

        // Unmatched end never locks either.
        turn.apply(tool_end("移除学生"), &mut sink);
        assert!(!sink
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::Locked(_))));

        turn.apply(tool_end("查找学生"), &mut sink);
        assert!(sink
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::Locked(_))));
    }

    #[test]
    fn banner_updates_to_earliest_remaining_tool() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_start("更新课程"), &mut sink);
        turn.apply(tool_end("查找学生"), &mut sink);

        let banners: Vec<&str> = sink
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Banner { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(banners, vec!["查找学生", "查找学生", "更新课程"]);
    }

    #[test]
    fn any_first_event_clears_the_placeholder_once() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(StreamEvent::Unrecognized, &mut sink);
        turn.apply(token("hi"), &mut sink);

        let clears = sink
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::ClearPlaceholder))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn tool_start_after_lock_reactivates_the_banner() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_end("查找学生"), &mut sink);
        assert_eq!(turn.state(), PresentationState::Locked);

        turn.apply(tool_start("更新课程"), &mut sink);
        assert_eq!(turn.state(), PresentationState::ToolActive);
        assert_eq!(turn.tools().history().len(), 2);
    }

    #[test]
    fn leaked_record_is_filtered_once_tools_have_run() {
        let mut turn = ChatTurn::new("t1", "m");
        let mut sink = RecordingSink::default();

        turn.apply(tool_start("查找学生"), &mut sink);
        turn.apply(tool_end("查找学生"), &mut sink);
        turn.apply(
            token(r#"{"id":1,"name":"小明","phone":"138...","notes":"x"}"#),
            &mut sink,
        );

        assert_eq!(turn.visible_narrative(), "");
        assert_eq!(sink.last_narrative(), Some(""));
        // The raw narrative still holds the token verbatim.
        assert!(turn.narrative().contains("小明"));
    }

    #[test]
    fn errored_is_a_terminal_presentation_state() {
        let mut turn = ChatTurn::new("t1", "m");
        turn.mark_errored();
        assert_eq!(turn.state(), PresentationState::Errored);
    }
}
