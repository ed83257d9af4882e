//! Group detail: one-shot load of the group, its stats and timeline.

use super::{date_badges, DateBadge, Loader};
use crate::api::{
    ApiClient, ApiError, GroupDailyStatsResponse, Period, ProjectGroupDetail, ProjectGroupStats,
    TimeSeriesResponse, DEFAULT_TIMELINE_LIMIT,
};
use crate::drilldown::Drilldown;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct GroupSnapshot {
    pub group: ProjectGroupDetail,
    pub stats: ProjectGroupStats,
    pub timeline: TimeSeriesResponse,
}

pub fn fetch_group(
    client: &ApiClient,
    group_id: i64,
    period: Period,
) -> Result<GroupSnapshot, ApiError> {
    let (group, (stats, timeline)) = rayon::join(
        || client.group(group_id),
        || {
            rayon::join(
                || client.group_stats(group_id),
                || client.group_timeline(group_id, period, DEFAULT_TIMELINE_LIMIT),
            )
        },
    );
    Ok(GroupSnapshot {
        group: group?,
        stats: stats?,
        timeline: timeline?,
    })
}

pub struct GroupDetailPage {
    client: Arc<ApiClient>,
    group_id: i64,
    period: Period,
    state: Loader<GroupSnapshot>,
    pub drilldown: Drilldown<GroupDailyStatsResponse>,
    pub selected: usize,
}

impl GroupDetailPage {
    pub fn new(client: Arc<ApiClient>, group_id: i64) -> Self {
        let drill_client = client.clone();
        let drilldown =
            Drilldown::new(move |date: &str| drill_client.group_daily_stats(group_id, date));
        let mut page = Self {
            client,
            group_id,
            period: Period::Day,
            state: Loader::idle("group", "Failed to load group"),
            drilldown,
            selected: 0,
        };
        page.refresh();
        page
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn set_period(&mut self, period: Period) {
        if self.period == period {
            return;
        }
        self.period = period;
        self.refresh();
    }

    pub fn refresh(&mut self) {
        let client = self.client.clone();
        let (group_id, period) = (self.group_id, self.period);
        self.state
            .load(move || fetch_group(&client, group_id, period));
    }

    pub fn update(&mut self) -> bool {
        let loaded = self.state.apply_updates();
        let drilled = self.drilldown.apply_results();
        if loaded {
            self.selected = self.selected.min(self.projects_len().saturating_sub(1));
        }
        loaded || drilled
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn group(&self) -> Option<&ProjectGroupDetail> {
        self.state.data().map(|d| &d.group)
    }

    pub fn stats(&self) -> Option<&ProjectGroupStats> {
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

    fn projects_len(&self) -> usize {
        self.group().map_or(0, |g| g.projects.len())
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.projects_len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_project_name(&self) -> Option<&str> {
        self.group()?
            .projects
            .get(self.selected)
            .map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::{serve, wait_until, Route};
    use std::time::Duration;

    const ROUTES: [Route; 4] = [
        (
            "/api/groups/4",
            200,
            r#"{"id":4,"name":"monorepo","gitRoot":"/src/monorepo","createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-27T00:00:00Z","projects":[{"name":"api","decodedPath":"/src/monorepo/api","sessionCount":2},{"name":"web","decodedPath":"/src/monorepo/web","sessionCount":5}]}"#,
        ),
        (
            "/api/groups/4/stats",
            200,
            r#"{"totalProjects":2,"totalSessions":7,"totalInputTokens":70,"totalOutputTokens":30,"totalCacheCreationTokens":0,"totalCacheReadTokens":0,"avgTokens":14.3,"errorRate":0.0}"#,
        ),
        (
            "/api/groups/4/timeline",
            200,
            r#"{"period":"day","data":[{"periodStart":"2026-01-27T00:00:00Z","sessionCount":7,"totalInputTokens":70,"totalOutputTokens":30,"totalTokens":100}]}"#,
        ),
        (
            "/api/groups/4/daily/2026-01-27",
            200,
            r#"{"date":"2026-01-27","projects":[{"projectId":9,"projectName":"web","sessionCount":5,"totalInputTokens":50,"totalOutputTokens":20,"totalTokens":70}]}"#,
        ),
    ];

    fn client(base: &str) -> Arc<ApiClient> {
        Arc::new(ApiClient::new(base, Duration::from_secs(5)))
    }

    #[test]
    fn test_group_loads_with_projects() {
        let (base, _rx) = serve(ROUTES.to_vec());
        let mut page = GroupDetailPage::new(client(&base), 4);
        assert!(page.loading());
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        assert_eq!(page.group().unwrap().name, "monorepo");
        assert_eq!(page.stats().unwrap().total_sessions, 7);
        page.select_next();
        page.select_next();
        assert_eq!(page.selected_project_name(), Some("web"));
        assert_eq!(page.date_badges()[0].label, "1/27");
    }

    #[test]
    fn test_period_change_reloads() {
        let (base, rx) = serve(ROUTES.to_vec());
        let mut page = GroupDetailPage::new(client(&base), 4);
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        page.set_period(Period::Week);
        assert!(page.loading());
        let mut saw_week = false;
        assert!(wait_until(|| {
            while let Ok(url) = rx.try_recv() {
                saw_week |= url == "/api/groups/4/timeline?period=week&limit=30";
            }
            saw_week
        }));
        assert!(page.date_badges().is_empty());
    }

    #[test]
    fn test_missing_group_reports_error() {
        let (base, _rx) = serve(ROUTES[1..].to_vec());
        let mut page = GroupDetailPage::new(client(&base), 4);
        assert!(wait_until(|| {
            page.update();
            !page.loading()
        }));
        assert_eq!(page.error(), Some("no route"));
        assert!(page.group().is_none());
    }

    #[test]
    fn test_drilldown_per_project() {
        let (base, _rx) = serve(ROUTES.to_vec());
        let mut page = GroupDetailPage::new(client(&base), 4);
        page.drilldown.handle_date_click("2026-01-27");
        assert!(wait_until(|| {
            page.update();
            page.drilldown.data().is_some()
        }));
        assert_eq!(page.drilldown.data().unwrap().projects[0].project_name, "web");
    }
}
