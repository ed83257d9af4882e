//! Date-range filtering and pagination of a project's session list.

use crate::api::SessionSummary;
use crate::format::utc_day;
use chrono::NaiveDate;

pub const PAGE_SIZE: usize = 20;

/// Inclusive bounds on the UTC start day of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn contains(&self, session: &SessionSummary) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(day) = utc_day(&session.start_time) else {
            return false;
        };
        if self.start.is_some_and(|start| day < start) {
            return false;
        }
        if self.end.is_some_and(|end| day > end) {
            return false;
        }
        true
    }
}

/// Filter + page cursor. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct SessionListView {
    filter: DateRange,
    page: usize,
    page_size: usize,
}

impl Default for SessionListView {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl SessionListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: DateRange::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> DateRange {
        self.filter
    }

    #[cfg(test)]
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_start(&mut self, start: Option<NaiveDate>) {
        self.filter.start = start;
        self.page = 1;
    }

    pub fn set_end(&mut self, end: Option<NaiveDate>) {
        self.filter.end = end;
        self.page = 1;
    }

    pub fn clear_filter(&mut self) {
        self.filter = DateRange::default();
        self.page = 1;
    }

    pub fn filtered<'a>(&self, sessions: &'a [SessionSummary]) -> Vec<&'a SessionSummary> {
        sessions.iter().filter(|s| self.filter.contains(s)).collect()
    }

    pub fn total_pages(&self, filtered_len: usize) -> usize {
        filtered_len.div_ceil(self.page_size)
    }

    /// Index range of the current page within the filtered list.
    pub fn page_bounds(&self, filtered_len: usize) -> (usize, usize) {
        let start = ((self.page - 1) * self.page_size).min(filtered_len);
        let end = (start + self.page_size).min(filtered_len);
        (start, end)
    }

    pub fn current_page<'a>(&self, sessions: &'a [SessionSummary]) -> Vec<&'a SessionSummary> {
        let filtered = self.filtered(sessions);
        let (start, end) = self.page_bounds(filtered.len());
        filtered[start..end].to_vec()
    }

    pub fn next_page(&mut self, filtered_len: usize) {
        if self.page < self.total_pages(filtered_len) {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    /// "21–25/25件"; `None` when everything fits on one page.
    pub fn range_label(&self, filtered_len: usize) -> Option<String> {
        if self.total_pages(filtered_len) <= 1 {
            return None;
        }
        let (start, end) = self.page_bounds(filtered_len);
        Some(format!("{}–{}/{}件", start + 1, end, filtered_len))
    }

    pub fn page_label(&self, filtered_len: usize) -> String {
        format!("{} / {}", self.page, self.total_pages(filtered_len).max(1))
    }

    /// "2 results", or "2 results / 3 total" when the filter hides some.
    pub fn summary_label(&self, filtered_len: usize, total: usize) -> String {
        if filtered_len == total {
            format!("{} results", filtered_len)
        } else {
            format!("{} results / {} total", filtered_len, total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, start_time: &str) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            project_name: "web".to_string(),
            start_time: start_time.to_string(),
            ..Default::default()
        }
    }

    fn day(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn sample() -> Vec<SessionSummary> {
        vec![
            session("a", "2026-01-25T10:00:00Z"),
            session("b", "2026-01-28T09:00:00Z"),
            session("c", "2026-01-28T18:30:00Z"),
        ]
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let sessions = sample();
        let view = SessionListView::default();
        assert_eq!(view.filtered(&sessions).len(), 3);
        assert_eq!(view.summary_label(3, 3), "3 results");
    }

    #[test]
    fn test_start_date_filter() {
        let sessions = sample();
        let mut view = SessionListView::default();
        view.set_start(day("2026-01-28"));
        let ids: Vec<_> = view.filtered(&sessions).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(view.summary_label(2, 3), "2 results / 3 total");
    }

    #[test]
    fn test_end_date_filter_is_inclusive() {
        let sessions = sample();
        let mut view = SessionListView::default();
        view.set_end(day("2026-01-25"));
        let ids: Vec<_> = view.filtered(&sessions).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_filter_excluding_all_reports_zero() {
        let sessions = sample();
        let mut view = SessionListView::default();
        view.set_start(day("2026-02-01"));
        let filtered = view.filtered(&sessions);
        assert!(filtered.is_empty());
        assert!(view.summary_label(filtered.len(), sessions.len()).starts_with("0 results"));
    }

    #[test]
    fn test_filter_uses_utc_day() {
        let sessions = vec![session("tz", "2026-01-28T02:00:00+09:00")];
        let mut view = SessionListView::default();
        view.set_start(day("2026-01-28"));
        assert!(view.filtered(&sessions).is_empty());
    }

    #[test]
    fn test_unparseable_start_time_only_hidden_when_filtering() {
        let sessions = vec![session("bad", "not a time")];
        let mut view = SessionListView::default();
        assert_eq!(view.filtered(&sessions).len(), 1);
        view.set_end(day("2030-01-01"));
        assert!(view.filtered(&sessions).is_empty());
    }

    #[test]
    fn test_pagination_of_25_sessions() {
        let sessions: Vec<_> = (1..=25)
            .map(|i| session(&format!("s{}", i), "2026-01-28T09:00:00Z"))
            .collect();
        let mut view = SessionListView::default();
        assert_eq!(view.total_pages(25), 2);
        assert_eq!(view.range_label(25).as_deref(), Some("1–20/25件"));

        view.next_page(25);
        assert_eq!(view.page(), 2);
        let page = view.current_page(&sessions);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].id, "s21");
        assert_eq!(page[4].id, "s25");
        assert_eq!(view.range_label(25).as_deref(), Some("21–25/25件"));
        assert_eq!(view.page_label(25), "2 / 2");

        view.next_page(25);
        assert_eq!(view.page(), 2);
    }

    #[test]
    fn test_single_page_has_no_range_label() {
        let view = SessionListView::default();
        assert_eq!(view.range_label(20), None);
        assert_eq!(view.range_label(0), None);
        assert_eq!(view.page_label(0), "1 / 1");
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut view = SessionListView::default();
        view.next_page(45);
        view.next_page(45);
        assert_eq!(view.page(), 3);
        view.set_start(day("2026-01-01"));
        assert_eq!(view.page(), 1);
        view.next_page(45);
        view.clear_filter();
        assert_eq!(view.page(), 1);
        view.previous_page();
        assert_eq!(view.page(), 1);
    }
}
