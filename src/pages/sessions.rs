//! Polled session list of one project.

use super::Polled;
use crate::api::{ApiClient, SessionSummary};
use std::sync::Arc;
use std::time::Duration;

pub struct SessionsPage {
    project_name: String,
    state: Polled<Vec<SessionSummary>>,
    pub selected: usize,
}

impl SessionsPage {
    pub fn new(client: Arc<ApiClient>, project_name: &str, interval: Duration) -> Self {
        let name = project_name.to_string();
        let state = Polled::start(
            "sessions",
            move || client.sessions(Some(&name)).map(|r| r.sessions),
            interval,
            "Failed to load sessions",
        );
        Self {
            project_name: project_name.to_string(),
            state,
            selected: 0,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn update(&mut self) -> bool {
        let changed = self.state.apply_updates();
        if changed {
            self.selected = self.selected.min(self.sessions().len().saturating_sub(1));
        }
        changed
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        self.state.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.sessions().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_session(&self) -> Option<&SessionSummary> {
        self.sessions().get(self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::{serve, wait_until};

    #[test]
    fn test_sessions_loaded_for_project() {
        let (base, rx) = serve(vec![(
            "/api/sessions",
            200,
            r#"{"sessions":[
                {"id":"a1","projectName":"my app","gitBranch":"main","startTime":"2026-01-27T10:00:00Z","endTime":"2026-01-27T11:00:00Z","totalTokens":1200,"errorCount":0,"firstUserMessage":"hi"},
                {"id":"b2","projectName":"my app","gitBranch":"dev","startTime":"2026-01-28T10:00:00Z","endTime":"2026-01-28T11:00:00Z","totalTokens":800,"errorCount":2,"firstUserMessage":"fix it"}
            ]}"#,
        )]);
        let client = Arc::new(ApiClient::new(&base, Duration::from_secs(5)));
        let mut page = SessionsPage::new(client, "my app", Duration::from_secs(60));
        assert!(page.loading());
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        assert_eq!(rx.recv().unwrap(), "/api/sessions?project=my%20app");
        assert_eq!(page.sessions().len(), 2);
        page.select_next();
        page.select_next();
        assert_eq!(page.selected_session().map(|s| s.id.as_str()), Some("b2"));
    }

    #[test]
    fn test_failure_reports_message() {
        let (base, _rx) = serve(vec![]);
        let client = Arc::new(ApiClient::new(&base, Duration::from_secs(5)));
        let mut page = SessionsPage::new(client, "ghost", Duration::from_secs(60));
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        assert_eq!(page.error(), Some("no route"));
        assert!(page.sessions().is_empty());
    }
}
