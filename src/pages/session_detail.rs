//! Session detail with a collapsible conversation view.

use super::Loader;
use crate::api::{ApiClient, ContentBlock, SessionDetail};
use std::collections::HashSet;
use std::sync::Arc;

/// Position of a content block: (message index, block index).
pub type BlockRef = (usize, usize);

/// Tool blocks start collapsed, except failed tool results.
pub fn expanded_by_default(block: &ContentBlock) -> bool {
    matches!(block, ContentBlock::ToolResult { is_error: true, .. })
}

pub fn is_toggleable(block: &ContentBlock) -> bool {
    matches!(
        block,
        ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. }
    )
}

pub struct SessionDetailPage {
    client: Arc<ApiClient>,
    project_name: String,
    session_id: String,
    state: Loader<SessionDetail>,
    /// Blocks whose expansion differs from the default.
    toggled: HashSet<BlockRef>,
    cursor: usize,
    pub scroll: usize,
    /// Set when the cursor moves; the view scrolls to the focused block once.
    pub follow_focus: bool,
}

impl SessionDetailPage {
    pub fn new(client: Arc<ApiClient>, project_name: &str, session_id: &str) -> Self {
        let mut page = Self {
            client,
            project_name: project_name.to_string(),
            session_id: session_id.to_string(),
            state: Loader::idle("session-detail", "Failed to load session details"),
            toggled: HashSet::new(),
            cursor: 0,
            scroll: 0,
            follow_focus: false,
        };
        page.refresh();
        page
    }

    pub fn refresh(&mut self) {
        let client = self.client.clone();
        let (project, id) = (self.project_name.clone(), self.session_id.clone());
        self.state
            .load(move || client.session_detail(&project, &id));
    }

    pub fn update(&mut self) -> bool {
        let changed = self.state.apply_updates();
        if changed {
            self.cursor = self.cursor.min(self.toggleable().len().saturating_sub(1));
        }
        changed
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn session(&self) -> Option<&SessionDetail> {
        self.state.data()
    }

    /// Tool blocks in conversation order.
    pub fn toggleable(&self) -> Vec<BlockRef> {
        let Some(session) = self.session() else {
            return Vec::new();
        };
        session
            .messages
            .iter()
            .enumerate()
            .flat_map(|(m, msg)| {
                msg.content
                    .iter()
                    .enumerate()
                    .filter(|(_, block)| is_toggleable(block))
                    .map(move |(b, _)| (m, b))
            })
            .collect()
    }

    pub fn is_expanded(&self, at: BlockRef) -> bool {
        let default = self
            .session()
            .and_then(|s| s.messages.get(at.0))
            .and_then(|m| m.content.get(at.1))
            .is_some_and(expanded_by_default);
        default != self.toggled.contains(&at)
    }

    pub fn toggle(&mut self, at: BlockRef) {
        if !self.toggled.remove(&at) {
            self.toggled.insert(at);
        }
    }

    /// Block under the cursor, if the conversation has any tool blocks.
    pub fn focused(&self) -> Option<BlockRef> {
        self.toggleable().get(self.cursor).copied()
    }

    pub fn toggle_focused(&mut self) {
        if let Some(at) = self.focused() {
            self.toggle(at);
        }
    }

    pub fn focus_next(&mut self) {
        if self.cursor + 1 < self.toggleable().len() {
            self.cursor += 1;
        }
        self.follow_focus = true;
    }

    pub fn focus_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.follow_focus = true;
    }

    /// Bring the focused line into view once after a cursor move, then clamp
    /// so the last page stays full.
    pub fn fit_scroll(&mut self, focused_line: Option<usize>, total_lines: usize, height: usize) {
        if let Some(line) = focused_line.filter(|_| self.follow_focus) {
            if line < self.scroll {
                self.scroll = line;
            } else if height > 0 && line >= self.scroll + height {
                self.scroll = line + 1 - height;
            }
        }
        self.follow_focus = false;
        self.scroll = self.scroll.min(total_lines.saturating_sub(height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageKind;
    use crate::pages::test_support::{serve, wait_until};
    use std::time::Duration;

    const DETAIL: &str = r#"{
        "id": "s1",
        "projectName": "web",
        "startTime": "2026-01-27T10:00:00Z",
        "totalTokens": {"inputTokens": 10, "outputTokens": 5, "cacheCreationInputTokens": 0, "cacheReadInputTokens": 0, "totalTokens": 15},
        "messages": [
            {"type": "user", "timestamp": "2026-01-27T10:00:00Z", "content": [{"type": "text", "text": "list files"}]},
            {"type": "assistant", "timestamp": "2026-01-27T10:00:05Z", "model": "claude-sonnet-4", "content": [
                {"type": "thinking", "text": "use ls"},
                {"type": "tool_use", "id": "t1", "name": "Bash", "input": {"command": "ls"}},
                {"type": "tool_result", "tool_use_id": "t1", "content": "a.rs", "is_error": false},
                {"type": "tool_result", "tool_use_id": "t2", "content": "denied", "is_error": true}
            ]}
        ]
    }"#;

    fn loaded() -> SessionDetailPage {
        let (base, _rx) = serve(vec![("/api/sessions/web/s1", 200, DETAIL)]);
        let client = Arc::new(ApiClient::new(&base, Duration::from_secs(5)));
        let mut page = SessionDetailPage::new(client, "web", "s1");
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        page
    }

    #[test]
    fn test_loads_session() {
        let page = loaded();
        let session = page.session().unwrap();
        assert_eq!(session.total_tokens.total_tokens, 15);
        assert_eq!(session.messages[0].kind, MessageKind::User);
        assert_eq!(session.messages[1].model.as_deref(), Some("claude-sonnet-4"));
    }

    #[test]
    fn test_default_expansion() {
        let page = loaded();
        assert_eq!(page.toggleable(), vec![(1, 1), (1, 2), (1, 3)]);
        assert!(!page.is_expanded((1, 1)));
        assert!(!page.is_expanded((1, 2)));
        assert!(page.is_expanded((1, 3)));
    }

    #[test]
    fn test_toggle_focused_block() {
        let mut page = loaded();
        page.toggle_focused();
        assert!(page.is_expanded((1, 1)));
        page.focus_next();
        page.focus_next();
        page.focus_next();
        assert_eq!(page.focused(), Some((1, 3)));
        page.toggle_focused();
        assert!(!page.is_expanded((1, 3)));
        page.toggle_focused();
        assert!(page.is_expanded((1, 3)));
    }

    #[test]
    fn test_fit_scroll_on_long_conversation() {
        let mut page = loaded();
        page.follow_focus = true;
        page.fit_scroll(Some(69_990), 70_000, 40);
        assert_eq!(page.scroll, 69_951);
        assert!(!page.follow_focus);

        // Manual scrolling is only clamped, not snapped back to focus.
        page.scroll = 100_000;
        page.fit_scroll(Some(10), 70_000, 40);
        assert_eq!(page.scroll, 69_960);

        page.follow_focus = true;
        page.fit_scroll(Some(10), 70_000, 40);
        assert_eq!(page.scroll, 10);
    }

    #[test]
    fn test_missing_session_reports_error() {
        let (base, _rx) = serve(vec![]);
        let client = Arc::new(ApiClient::new(&base, Duration::from_secs(5)));
        let mut page = SessionDetailPage::new(client, "web", "gone");
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        assert_eq!(page.error(), Some("no route"));
        assert!(page.toggleable().is_empty());
        assert_eq!(page.focused(), None);
    }
}
