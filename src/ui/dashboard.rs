//! Dashboard screen: totals, combined timeline, per-day drilldown and the
//! group/project lists.

use super::helpers::{
    badge_line, drilldown_panel, error_line, fixed_width, loading_line, panel_block,
    period_tabs, stat_widget, timeline_lines, usage_row, BadgeCursor,
};
use crate::format::{format_date, format_number, format_percent};
use crate::pages::projects::{ListTab, ProjectsPage};
use crate::theme::ThemeColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{HighlightSpacing, List, ListItem, ListState, Paragraph},
    Frame,
};

const COLORS: ThemeColors = ThemeColors::DEFAULT;

pub struct DashboardView {
    pub page: ProjectsPage,
    pub badges: BadgeCursor,
}

impl DashboardView {
    pub fn new(page: ProjectsPage) -> Self {
        Self {
            page,
            badges: BadgeCursor::default(),
        }
    }

    /// Open or close the drilldown for the date under the badge cursor.
    pub fn click_badge(&mut self) {
        let badges = self.page.date_badges();
        if let Some(badge) = self.badges.current(&badges) {
            self.page.drilldown.handle_date_click(&badge.date);
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(45),
            Constraint::Min(6),
        ])
        .split(area);

    render_summary(frame, rows[0], &view.page);
    render_timeline(frame, rows[1], view);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(rows[2]);
    render_list(frame, bottom[0], &view.page);
    render_drilldown(frame, bottom[1], &view.page);
}

fn render_summary(frame: &mut Frame, area: Rect, page: &ProjectsPage) {
    let block = panel_block("OVERVIEW", false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(stats) = page.total_stats() else {
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
        stat_widget("Groups", stats.total_groups.to_string(), COLORS.accent_magenta),
        cols[0],
    );
    frame.render_widget(
        stat_widget("Sessions", stats.total_sessions.to_string(), COLORS.accent_cyan),
        cols[1],
    );
    frame.render_widget(
        stat_widget(
            "Tokens",
            format_number(stats.total_tokens),
            COLORS.accent_yellow,
        ),
        cols[2],
    );
    frame.render_widget(
        stat_widget(
            "In / Out",
            format!(
                "{} / {}",
                format_number(stats.total_input_tokens),
                format_number(stats.total_output_tokens)
            ),
            COLORS.token_input(),
        ),
        cols[3],
    );
    frame.render_widget(
        stat_widget("Error rate", format_percent(stats.error_rate), COLORS.error),
        cols[4],
    );
}

fn render_timeline(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let page = &view.page;
    let block = panel_block("TOKEN USAGE", false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

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
}

fn render_list(frame: &mut Frame, area: Rect, page: &ProjectsPage) {
    let (title, items): (String, Vec<ListItem>) = match page.tab {
        ListTab::Groups => (
            format!("GROUPS ({}) · Tab: projects", page.groups().len()),
            page.groups()
                .iter()
                .map(|g| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            fixed_width(&g.name, 28),
                            Style::default().fg(COLORS.text_primary),
                        ),
                        Span::styled(
                            format!("  updated {}", format_date(&g.updated_at)),
                            Style::default().fg(COLORS.text_muted),
                        ),
                    ]))
                })
                .collect(),
        ),
        ListTab::Projects => (
            format!("PROJECTS ({}) · Tab: groups", page.projects().len()),
            page.projects()
                .iter()
                .map(|p| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            fixed_width(&p.name, 28),
                            Style::default().fg(COLORS.text_primary),
                        ),
                        Span::styled(
                            format!("{:>5} sess", p.session_count),
                            Style::default().fg(COLORS.accent_cyan),
                        ),
                    ]))
                })
                .collect(),
        ),
    };

    let list = List::new(items)
        .block(panel_block(&title, true))
        .highlight_style(
            Style::default()
                .bg(COLORS.bg_highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);
    let mut state = ListState::default();
    if page.list_len() > 0 {
        state.select(Some(page.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_drilldown(frame: &mut Frame, area: Rect, page: &ProjectsPage) {
    let drill = &page.drilldown;
    let name_width = (area.width as usize).saturating_sub(52).clamp(8, 24);
    let rows = drill
        .data()
        .map(|daily| {
            daily
                .groups
                .iter()
                .map(|g| {
                    usage_row(
                        &g.group_name,
                        name_width,
                        g.total_input_tokens,
                        g.total_output_tokens,
                        g.total_tokens,
                        g.session_count,
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    frame.render_widget(
        drilldown_panel(
            "BY GROUP",
            drill.selected_date(),
            drill.loading(),
            drill.error(),
            rows,
        ),
        area,
    );
}
