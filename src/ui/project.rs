//! Project detail screen: stats tab with timeline and drilldown, sessions tab
//! with date filter and pagination.

use super::helpers::{
    badge_line, drilldown_panel, error_line, loading_line, message_panel, panel_block,
    period_tabs, stat_widget, timeline_lines, BadgeCursor,
};
use super::sessions::session_list;
use crate::format::{
    format_date, format_number, format_percent, is_valid_date_format, short_id,
    truncate_with_ellipsis,
};
use crate::pages::project_detail::{DetailTab, ProjectDetailPage};
use crate::theme::ThemeColors;
use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{ListState, Paragraph},
    Frame,
};

const COLORS: ThemeColors = ThemeColors::DEFAULT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Start,
    End,
}

/// A date bound being typed on the sessions tab.
#[derive(Debug, Clone)]
pub struct FilterInput {
    pub field: FilterField,
    pub buffer: String,
}

pub struct ProjectView {
    pub page: ProjectDetailPage,
    pub badges: BadgeCursor,
    pub input: Option<FilterInput>,
}

impl ProjectView {
    pub fn new(page: ProjectDetailPage) -> Self {
        Self {
            page,
            badges: BadgeCursor::default(),
            input: None,
        }
    }

    pub fn click_badge(&mut self) {
        let badges = self.page.date_badges();
        if let Some(badge) = self.badges.current(&badges) {
            self.page.drilldown.handle_date_click(&badge.date);
        }
    }

    pub fn begin_input(&mut self, field: FilterField) {
        let filter = self.page.list.filter();
        let current = match field {
            FilterField::Start => filter.start,
            FilterField::End => filter.end,
        };
        self.input = Some(FilterInput {
            field,
            buffer: current
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        });
    }

    /// Apply the typed bound. An empty buffer clears it.
    pub fn commit_input(&mut self) -> Result<(), String> {
        let Some(input) = self.input.take() else {
            return Ok(());
        };
        let value = input.buffer.trim();
        let date = if value.is_empty() {
            None
        } else if is_valid_date_format(value) {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
        } else {
            return Err(format!("Invalid date: {} (expected YYYY-MM-DD)", value));
        };
        match input.field {
            FilterField::Start => self.page.list.set_start(date),
            FilterField::End => self.page.list.set_end(date),
        }
        self.page.selected = 0;
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.page.list.clear_filter();
        self.page.selected = 0;
    }
}

pub fn render(frame: &mut Frame, area: Rect, view: &ProjectView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)])
        .split(area);
    render_stats(frame, rows[0], &view.page);
    match view.page.tab() {
        DetailTab::Stats => render_stats_tab(frame, rows[1], view),
        DetailTab::Sessions => render_sessions_tab(frame, rows[1], view),
    }
}

fn tab_title(page: &ProjectDetailPage) -> String {
    let (stats, sessions) = match page.tab() {
        DetailTab::Stats => ("[Stats]", "Sessions"),
        DetailTab::Sessions => ("Stats", "[Sessions]"),
    };
    format!("{} · {} {}", page.project_name(), stats, sessions)
}

fn render_stats(frame: &mut Frame, area: Rect, page: &ProjectDetailPage) {
    let block = panel_block(&tab_title(page), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(stats) = page.stats() else {
        let line = match page.error() {
            Some(message) => error_line(message),
            None => loading_line(),
        };
        frame.render_widget(Paragraph::new(line), inner);
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(inner);
    frame.render_widget(
        stat_widget("Sessions", stats.total_sessions.to_string(), COLORS.accent_cyan),
        cols[0],
    );
    frame.render_widget(
        stat_widget("Tokens", format_number(stats.total_tokens), COLORS.accent_yellow),
        cols[1],
    );
    frame.render_widget(
        stat_widget(
            "Avg / session",
            format_number(stats.avg_tokens.round() as u64),
            COLORS.accent_blue,
        ),
        cols[2],
    );
    frame.render_widget(
        stat_widget(
            "Active",
            format!(
                "{} – {}",
                format_date(&stats.first_session),
                format_date(&stats.last_session)
            ),
            COLORS.text_secondary,
        ),
        cols[3],
    );
    frame.render_widget(
        stat_widget("Error rate", format_percent(stats.error_rate), COLORS.error),
        cols[4],
    );
}

fn render_stats_tab(frame: &mut Frame, area: Rect, view: &ProjectView) {
    let page = &view.page;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let block = panel_block("TOKEN USAGE", true);
    let inner = block.inner(cols[0]);
    frame.render_widget(block, cols[0]);
    let mut lines = vec![period_tabs(page.period())];
    if let Some(message) = page.error() {
        lines.push(error_line(message));
    }
    let badges = page.date_badges();
    if !badges.is_empty() {
        lines.push(badge_line(
            &badges,
            view.badges.index(badges.len()),
            page.drilldown.selected_date(),
        ));
    }
    lines.push(Line::from(""));
    if page.loading() {
        lines.push(loading_line());
    } else {
        lines.extend(timeline_lines(page.timeline(), inner.width as usize));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    let drill = &page.drilldown;
    let width = cols[1].width as usize;
    let drill_rows = drill
        .data()
        .map(|daily| {
            daily
                .sessions
                .iter()
                .map(|s| {
                    Line::from(vec![
                        Span::styled(
                            format!("{:<8}", short_id(&s.id)),
                            Style::default().fg(COLORS.accent_blue),
                        ),
                        Span::styled(
                            format!(" {:>7}", format_number(s.total_tokens)),
                            Style::default().fg(COLORS.accent_yellow),
                        ),
                        Span::styled(
                            format!(" {:>3} err ", s.error_count),
                            Style::default().fg(COLORS.error_count(s.error_count)),
                        ),
                        Span::styled(
                            truncate_with_ellipsis(
                                s.first_user_message.lines().next().unwrap_or(""),
                                width.saturating_sub(26),
                            ),
                            Style::default().fg(COLORS.text_primary),
                        ),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    frame.render_widget(
        drilldown_panel(
            "SESSIONS ON DATE",
            drill.selected_date(),
            drill.loading(),
            drill.error(),
            drill_rows,
        ),
        cols[1],
    );
}

fn render_sessions_tab(frame: &mut Frame, area: Rect, view: &ProjectView) {
    let page = &view.page;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let filter = page.list.filter();
    let bound = |field: FilterField, value: Option<NaiveDate>| -> Span<'static> {
        match &view.input {
            Some(input) if input.field == field => Span::styled(
                format!("{}▏", input.buffer),
                Style::default()
                    .fg(COLORS.accent_yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            _ => Span::styled(
                value
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "any".to_string()),
                Style::default().fg(COLORS.text_primary),
            ),
        }
    };
    let total = page.all_sessions().len();
    let filtered = page.filtered_len();
    let mut spans = vec![
        Span::styled("from ", Style::default().fg(COLORS.text_muted)),
        bound(FilterField::Start, filter.start),
        Span::styled("  to ", Style::default().fg(COLORS.text_muted)),
        bound(FilterField::End, filter.end),
        Span::styled("   ", Style::default()),
        Span::styled(
            page.list.summary_label(filtered, total),
            Style::default().fg(COLORS.accent_cyan),
        ),
    ];
    if let Some(range) = page.list.range_label(filtered) {
        spans.push(Span::styled(
            format!("   {}  page {}", range, page.list.page_label(filtered)),
            Style::default().fg(COLORS.text_secondary),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(panel_block("FILTER", view.input.is_some())),
        rows[0],
    );

    if page.sessions_loading() && total == 0 {
        frame.render_widget(message_panel("SESSIONS", loading_line()), rows[1]);
        return;
    }
    let visible = page.visible_sessions();
    if visible.is_empty() {
        frame.render_widget(
            message_panel(
                "SESSIONS",
                Line::from(Span::styled(
                    "No sessions match",
                    Style::default().fg(COLORS.text_muted),
                )),
            ),
            rows[1],
        );
        return;
    }
    let width = rows[1].width as usize;
    let list = session_list("SESSIONS", visible.iter().copied(), width);
    let mut state = ListState::default();
    state.select(Some(page.selected));
    frame.render_stateful_widget(list, rows[1], &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use std::sync::Arc;
    use std::time::Duration;

    fn view() -> ProjectView {
        let client = Arc::new(ApiClient::new(
            "http://127.0.0.1:9/api",
            Duration::from_millis(200),
        ));
        ProjectView::new(ProjectDetailPage::new(client, "web", Duration::from_secs(60)))
    }

    #[test]
    fn test_commit_valid_start_date() {
        let mut view = view();
        view.begin_input(FilterField::Start);
        view.input.as_mut().unwrap().buffer.push_str("2026-01-28");
        assert!(view.commit_input().is_ok());
        assert!(view.input.is_none());
        assert_eq!(
            view.page.list.filter().start,
            NaiveDate::from_ymd_opt(2026, 1, 28)
        );

        view.begin_input(FilterField::Start);
        assert_eq!(view.input.as_ref().unwrap().buffer, "2026-01-28");
    }

    #[test]
    fn test_commit_rejects_bad_date_and_keeps_filter() {
        let mut view = view();
        view.begin_input(FilterField::End);
        view.input.as_mut().unwrap().buffer.push_str("2026-02-30");
        let err = view.commit_input().unwrap_err();
        assert!(err.contains("2026-02-30"));
        assert_eq!(view.page.list.filter().end, None);
    }

    #[test]
    fn test_empty_buffer_clears_bound() {
        let mut view = view();
        view.page.list.set_end(NaiveDate::from_ymd_opt(2026, 1, 31));
        view.begin_input(FilterField::End);
        view.input.as_mut().unwrap().buffer.clear();
        assert!(view.commit_input().is_ok());
        assert!(!view.page.list.filter().is_active());
    }
}
