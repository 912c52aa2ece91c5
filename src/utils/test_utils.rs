//! Shared helpers for unit tests.

use crate::core::tools::{IconCategory, ToolInvocation};
use crate::render::RenderSink;

/// Records every instruction the pipeline emits, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    ClearPlaceholder,
    Narrative(String),
    Banner {
        name: String,
        icon: IconCategory,
    },
    Locked(Vec<ToolInvocation>),
    RetryStatus {
        failed_attempts: u32,
        max_attempts: u32,
    },
    TerminalError {
        message: String,
        original_text: String,
    },
}

impl RecordingSink {
    pub fn narratives(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Narrative(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_narrative(&self) -> Option<&str> {
        self.narratives().last().copied()
    }
}

impl RenderSink for RecordingSink {
    fn clear_placeholder(&mut self) {
        self.instructions.push(Instruction::ClearPlaceholder);
    }

    fn replace_narrative(&mut self, text: &str) {
        self.instructions
            .push(Instruction::Narrative(text.to_string()));
    }

    fn show_tool_banner(&mut self, name: &str, icon: IconCategory) {
        self.instructions.push(Instruction::Banner {
            name: name.to_string(),
            icon,
        });
    }

    fn lock_tool_summary(&mut self, history: &[ToolInvocation]) {
        self.instructions
            .push(Instruction::Locked(history.to_vec()));
    }

    fn show_retry_status(&mut self, failed_attempts: u32, max_attempts: u32) {
        self.instructions.push(Instruction::RetryStatus {
            failed_attempts,
            max_attempts,
        });
    }

    fn show_terminal_error(&mut self, message: &str, original_text: &str) {
        self.instructions.push(Instruction::TerminalError {
            message: message.to_string(),
            original_text: original_text.to_string(),
        });
    }
}
