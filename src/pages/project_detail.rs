//! Project detail: stats, timeline, per-day session drilldown and a
//! filterable session list.

use super::{date_badges, DateBadge, Loader, Polled};
use crate::api::{
    ApiClient, ApiError, Period, ProjectDailyStatsResponse, ProjectStats, SessionSummary,
    TimeSeriesResponse, DEFAULT_TIMELINE_LIMIT,
};
use crate::drilldown::Drilldown;
use crate::session_list::SessionListView;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ProjectDetailSnapshot {
    pub stats: ProjectStats,
    pub timeline: TimeSeriesResponse,
}

pub fn fetch_project_detail(
    client: &ApiClient,
    project_name: &str,
    period: Period,
) -> Result<ProjectDetailSnapshot, ApiError> {
    let (stats, timeline) = rayon::join(
        || client.project_stats(project_name),
        || client.project_timeline(project_name, period, DEFAULT_TIMELINE_LIMIT),
    );
    Ok(ProjectDetailSnapshot {
        stats: stats?,
        timeline: timeline?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Stats,
    Sessions,
}

pub struct ProjectDetailPage {
    client: Arc<ApiClient>,
    project_name: String,
    period: Period,
    state: Polled<ProjectDetailSnapshot>,
    pub drilldown: Drilldown<ProjectDailyStatsResponse>,
    tab: DetailTab,
    sessions: Loader<Vec<SessionSummary>>,
    pub list: SessionListView,
    /// Row within the current page of the session list.
    pub selected: usize,
}

impl ProjectDetailPage {
    pub fn new(client: Arc<ApiClient>, project_name: &str, interval: Duration) -> Self {
        let period = Period::Day;
        let state = Polled::start(
            "project-detail",
            Self::fetcher(client.clone(), project_name.to_string(), period),
            interval,
            "Failed to load data",
        );
        let drill_client = client.clone();
        let drill_name = project_name.to_string();
        let drilldown = Drilldown::new(move |date: &str| {
            drill_client.project_daily_stats(&drill_name, date)
        });
        Self {
            client,
            project_name: project_name.to_string(),
            period,
            state,
            drilldown,
            tab: DetailTab::Stats,
            sessions: Loader::idle("project-sessions", "Failed to load sessions"),
            list: SessionListView::default(),
            selected: 0,
        }
    }

    fn fetcher(
        client: Arc<ApiClient>,
        project_name: String,
        period: Period,
    ) -> impl Fn() -> Result<ProjectDetailSnapshot, ApiError> + Send + Sync + 'static {
        move || fetch_project_detail(&client, &project_name, period)
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn set_period(&mut self, period: Period) {
        if self.period == period {
            return;
        }
        self.period = period;
        self.state.restart(Self::fetcher(
            self.client.clone(),
            self.project_name.clone(),
            period,
        ));
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    /// Opening the sessions tab (re)loads the session list.
    pub fn set_tab(&mut self, tab: DetailTab) {
        if self.tab == tab {
            return;
        }
        self.tab = tab;
        if tab == DetailTab::Sessions {
            let client = self.client.clone();
            let name = self.project_name.clone();
            self.sessions
                .load(move || client.sessions(Some(&name)).map(|r| r.sessions));
        }
    }

    pub fn update(&mut self) -> bool {
        let polled = self.state.apply_updates();
        let drilled = self.drilldown.apply_results();
        let listed = self.sessions.apply_updates();
        if listed {
            self.clamp_selection();
        }
        polled || drilled || listed
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn stats(&self) -> Option<&ProjectStats> {
        self.state.data().map(|d| &d.stats)
    }

    pub fn timeline(&self) -> Option<&TimeSeriesResponse> {
        self.state.data().map(|d| &d.timeline)
    }

    pub fn date_badges(&self) -> Vec<DateBadge> {
        if self.loading() {
            return Vec::new();
        }
        date_badges(self.timeline(), self.period)
    }

    pub fn sessions_loading(&self) -> bool {
        self.sessions.loading()
    }

    pub fn all_sessions(&self) -> &[SessionSummary] {
        self.sessions.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible_sessions(&self) -> Vec<&SessionSummary> {
        self.list.current_page(self.all_sessions())
    }

    pub fn filtered_len(&self) -> usize {
        self.list.filtered(self.all_sessions()).len()
    }

    pub fn next_page(&mut self) {
        let len = self.filtered_len();
        self.list.next_page(len);
        self.selected = 0;
    }

    pub fn previous_page(&mut self) {
        self.list.previous_page();
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible_sessions().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_session(&self) -> Option<&SessionSummary> {
        self.visible_sessions().get(self.selected).copied()
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self
            .selected
            .min(self.visible_sessions().len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::{serve, wait_until, Route};

    const ROUTES: [Route; 4] = [
        (
            "/api/projects/web/stats",
            200,
            r#"{"totalSessions":3,"totalInputTokens":10,"totalOutputTokens":20,"totalCacheCreationTokens":0,"totalCacheReadTokens":0,"totalTokens":30,"avgTokens":10.0,"firstSession":"2026-01-25T10:00:00Z","lastSession":"2026-01-28T18:30:00Z","errorRate":0.0}"#,
        ),
        (
            "/api/projects/web/timeline",
            200,
            r#"{"period":"day","data":[{"periodStart":"2026-01-25T00:00:00Z","sessionCount":1,"totalInputTokens":5,"totalOutputTokens":5,"totalTokens":10},{"periodStart":"2026-01-28T00:00:00Z","sessionCount":2,"totalInputTokens":5,"totalOutputTokens":15,"totalTokens":20}]}"#,
        ),
        (
            "/api/sessions",
            200,
            r#"{"sessions":[
                {"id":"a","projectName":"web","startTime":"2026-01-25T10:00:00Z","totalTokens":10,"errorCount":0},
                {"id":"b","projectName":"web","startTime":"2026-01-28T09:00:00Z","totalTokens":10,"errorCount":0},
                {"id":"c","projectName":"web","startTime":"2026-01-28T18:30:00Z","totalTokens":10,"errorCount":1}
            ]}"#,
        ),
        (
            "/api/projects/web/daily/2026-01-28",
            200,
            r#"{"date":"2026-01-28","sessions":[{"id":"b","startTime":"2026-01-28T09:00:00Z","totalInputTokens":1,"totalOutputTokens":2,"totalTokens":3,"errorCount":0}]}"#,
        ),
    ];

    fn page() -> (ProjectDetailPage, std::sync::mpsc::Receiver<String>) {
        let (base, rx) = serve(ROUTES.to_vec());
        let client = Arc::new(ApiClient::new(&base, Duration::from_secs(5)));
        (
            ProjectDetailPage::new(client, "web", Duration::from_secs(60)),
            rx,
        )
    }

    #[test]
    fn test_stats_and_timeline_loaded() {
        let (mut page, _rx) = page();
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        assert_eq!(page.stats().unwrap().total_sessions, 3);
        let badges = page.date_badges();
        assert_eq!(badges[0].date, "2026-01-28");
        assert_eq!(badges[1].date, "2026-01-25");
    }

    #[test]
    fn test_sessions_fetched_only_when_tab_opened() {
        let (mut page, rx) = page();
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        let urls: Vec<String> = rx.try_iter().collect();
        assert!(!urls.iter().any(|u| u.starts_with("/api/sessions")));

        page.set_tab(DetailTab::Sessions);
        assert!(page.sessions_loading());
        assert!(wait_until(|| {
            page.update();
            !page.sessions_loading()
        }));
        assert_eq!(page.all_sessions().len(), 3);

        page.list.set_start(chrono::NaiveDate::from_ymd_opt(2026, 1, 28));
        assert_eq!(page.filtered_len(), 2);
        page.select_next();
        page.select_next();
        assert_eq!(page.selected_session().map(|s| s.id.as_str()), Some("c"));
    }

    #[test]
    fn test_drilldown_lists_daily_sessions() {
        let (mut page, _rx) = page();
        page.drilldown.handle_date_click("2026-01-28");
        assert!(wait_until(|| {
            page.update();
            page.drilldown.data().is_some()
        }));
        assert_eq!(page.drilldown.data().unwrap().sessions[0].total_tokens, 3);
    }
}
