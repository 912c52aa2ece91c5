//! Tool invocation lifecycle: the open multiset, the immutable history,
//! and the coarse icon category shown next to each invocation.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Search,
    Write,
    Delete,
    Compute,
    Verify,
    General,
}

/// Keyword sets per category, matched by substring against the tool name.
/// Categories are tried in order and the first match wins; later matches
/// never override.
const CATEGORY_KEYWORDS: [(IconCategory, &[&str]); 5] = [
    (
        IconCategory::Search,
        &["翻阅", "查找", "获取", "search", "query", "find", "fetch"],
    ),
    (
        IconCategory::Write,
        &[
            "创建", "更新", "安排", "修改", "create", "update", "schedule", "modify",
        ],
    ),
    (
        IconCategory::Delete,
        &["移除", "删除", "delete", "remove"],
    ),
    (
        IconCategory::Compute,
        &[
            "计算", "统计", "生成", "分析", "compute", "summarize", "analyze", "generate",
        ],
    ),
    (IconCategory::Verify, &["检查", "verify", "check"]),
];

impl IconCategory {
    pub fn for_tool_name(name: &str) -> IconCategory {
        for (category, keywords) in CATEGORY_KEYWORDS {
            if keywords.iter().any(|keyword| name.contains(keyword)) {
                return category;
            }
        }
        IconCategory::General
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IconCategory::Search => "search",
            IconCategory::Write => "write",
            IconCategory::Delete => "delete",
            IconCategory::Compute => "compute",
            IconCategory::Verify => "verify",
            IconCategory::General => "general",
        }
    }
}

/// One tool invocation, appended to the turn history when it starts.
/// History entries are never mutated; `ordinal` is the 1-based position
/// shown in the locked summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub icon: IconCategory,
    pub ordinal: usize,
}

/// Tracks the multiset of in-flight invocations for one turn.
///
/// Identity is by name only: ending a tool closes the earliest open
/// instance of that name, which is not necessarily the one started most
/// recently.
#[derive(Debug, Default)]
pub struct ToolTracker {
    open: Vec<String>,
    history: Vec<ToolInvocation>,
}

impl ToolTracker {
    pub fn start(&mut self, name: &str) {
        self.open.push(name.to_string());
        self.history.push(ToolInvocation {
            name: name.to_string(),
            icon: IconCategory::for_tool_name(name),
            ordinal: self.history.len() + 1,
        });
    }

    /// Close one open instance of `name`. Returns whether an instance was
    /// actually open; an unmatched end is a no-op.
    pub fn end(&mut self, name: &str) -> bool {
        match self.open.iter().position(|open| open == name) {
            Some(index) => {
                self.open.remove(index);
                true
            }
            None => false,
        }
    }

    /// The invocation the banner displays: the earliest still open.
    pub fn displayed(&self) -> Option<(&str, IconCategory)> {
        self.open
            .first()
            .map(|name| (name.as_str(), IconCategory::for_tool_name(name)))
    }

    /// Narrative rendering is suppressed exactly while this is non-zero.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn history(&self) -> &[ToolInvocation] {
        &self.history
    }
}
