//! Dashboard: all projects, groups and combined usage.

use super::{date_badges, DateBadge, Polled};
use crate::api::{
    ApiClient, ApiError, DailyStatsResponse, Period, Project, ProjectGroup, TimeSeriesResponse,
    TotalStats, DEFAULT_TIMELINE_LIMIT,
};
use crate::drilldown::Drilldown;
use std::sync::Arc;
use std::time::Duration;

/// Everything the dashboard shows, fetched together on each tick.
#[derive(Debug, Clone, Default)]
pub struct ProjectsSnapshot {
    pub projects: Vec<Project>,
    pub groups: Vec<ProjectGroup>,
    pub total_stats: TotalStats,
    pub timeline: TimeSeriesResponse,
}

/// The four dashboard requests, issued in parallel.
pub fn fetch_projects(client: &ApiClient, period: Period) -> Result<ProjectsSnapshot, ApiError> {
    let ((projects, groups), (total_stats, timeline)) = rayon::join(
        || rayon::join(|| client.projects(), || client.groups()),
        || {
            rayon::join(
                || client.total_stats(),
                || client.total_timeline(period, DEFAULT_TIMELINE_LIMIT),
            )
        },
    );
    Ok(ProjectsSnapshot {
        projects: projects?.projects,
        groups: groups?.groups,
        total_stats: total_stats?,
        timeline: timeline?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTab {
    Groups,
    Projects,
}

pub struct ProjectsPage {
    client: Arc<ApiClient>,
    period: Period,
    state: Polled<ProjectsSnapshot>,
    pub drilldown: Drilldown<DailyStatsResponse>,
    pub tab: ListTab,
    pub selected: usize,
}

impl ProjectsPage {
    pub fn new(client: Arc<ApiClient>, interval: Duration) -> Self {
        let period = Period::Day;
        let state = Polled::start(
            "projects",
            Self::fetcher(client.clone(), period),
            interval,
            "Failed to load data",
        );
        let drill_client = client.clone();
        let drilldown = Drilldown::new(move |date: &str| drill_client.daily_stats(date));
        Self {
            client,
            period,
            state,
            drilldown,
            tab: ListTab::Groups,
            selected: 0,
        }
    }

    fn fetcher(
        client: Arc<ApiClient>,
        period: Period,
    ) -> impl Fn() -> Result<ProjectsSnapshot, ApiError> + Send + Sync + 'static {
        move || fetch_projects(&client, period)
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn set_period(&mut self, period: Period) {
        if self.period == period {
            return;
        }
        self.period = period;
        self.state.restart(Self::fetcher(self.client.clone(), period));
    }

    pub fn update(&mut self) -> bool {
        let polled = self.state.apply_updates();
        let drilled = self.drilldown.apply_results();
        if polled {
            self.selected = self.selected.min(self.list_len().saturating_sub(1));
        }
        polled || drilled
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn projects(&self) -> &[Project] {
        self.state.data().map(|d| d.projects.as_slice()).unwrap_or(&[])
    }

    pub fn groups(&self) -> &[ProjectGroup] {
        self.state.data().map(|d| d.groups.as_slice()).unwrap_or(&[])
    }

    pub fn total_stats(&self) -> Option<&TotalStats> {
        self.state.data().map(|d| &d.total_stats)
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

    pub fn list_len(&self) -> usize {
        match self.tab {
            ListTab::Groups => self.groups().len(),
            ListTab::Projects => self.projects().len(),
        }
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            ListTab::Groups => ListTab::Projects,
            ListTab::Projects => ListTab::Groups,
        };
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.list_len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_group(&self) -> Option<&ProjectGroup> {
        match self.tab {
            ListTab::Groups => self.groups().get(self.selected),
            ListTab::Projects => None,
        }
    }

    pub fn selected_project(&self) -> Option<&Project> {
        match self.tab {
            ListTab::Projects => self.projects().get(self.selected),
            ListTab::Groups => None,
        }
    }
}
