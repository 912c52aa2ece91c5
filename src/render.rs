//! Presentation instructions the streaming pipeline emits.

use crate::core::tools::{IconCategory, ToolInvocation};

/// Receives presentation instructions from the stream processor.
///
/// Implementations are synchronous and must tolerate repeated identical
/// instructions; the banner in particular may be re-set to the text it
/// already shows.
pub trait RenderSink {
    /// The first event of a turn has arrived; drop the typing placeholder.
    fn clear_placeholder(&mut self);

    /// Replace the visible narrative with a freshly filtered rendering.
    fn replace_narrative(&mut self, text: &str);

    /// Show or update the live tool banner.
    fn show_tool_banner(&mut self, name: &str, icon: IconCategory);

    /// Replace the banner with the immutable, numbered invocation summary.
    /// Whether the summary shows collapsed or expanded is up to the sink;
    /// toggling it carries no protocol meaning.
    fn lock_tool_summary(&mut self, history: &[ToolInvocation]);

    /// A failed attempt will be retried; update the placeholder status.
    fn show_retry_status(&mut self, failed_attempts: u32, max_attempts: u32);

    /// All attempts failed. `original_text` is the user's message, intact,
    /// for a manual resend action.
    fn show_terminal_error(&mut self, message: &str, original_text: &str);
}

/// Banner copy for a live invocation.
pub fn banner_text(name: &str) -> String {
    format!("正在使用 {name}…")
}

/// Caption for the locked summary.
pub fn summary_caption(count: usize) -> String {
    format!("工具调用完成 · 共 {count} 个")
}
