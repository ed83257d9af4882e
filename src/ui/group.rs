//! Group detail screen.

use super::helpers::{
    badge_line, drilldown_panel, error_line, fixed_width, loading_line, message_panel,
    panel_block, period_tabs, stat_widget, timeline_lines, usage_row, BadgeCursor,
};
use crate::format::{format_date, format_number, format_percent};
use crate::pages::group_detail::GroupDetailPage;
use crate::theme::ThemeColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{HighlightSpacing, List, ListItem, ListState, Paragraph},
    Frame,
};

const COLORS: ThemeColors = ThemeColors::DEFAULT;

pub struct GroupView {
    pub page: GroupDetailPage,
    pub badges: BadgeCursor,
}

impl GroupView {
    pub fn new(page: GroupDetailPage) -> Self {
        Self {
            page,
            badges: BadgeCursor::default(),
        }
    }

    pub fn click_badge(&mut self) {
        let badges = self.page.date_badges();
        if let Some(badge) = self.badges.current(&badges) {
            self.page.drilldown.handle_date_click(&badge.date);
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, view: &GroupView) {
    let page = &view.page;
    let (Some(group), Some(stats)) = (page.group(), page.stats()) else {
        let line = match page.error() {
            Some(message) => error_line(message),
            None => loading_line(),
        };
        frame.render_widget(message_panel("GROUP", line), area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Percentage(45),
            Constraint::Min(6),
        ])
        .split(area);

    let mut header = vec![
        Span::styled(
            group.name.clone(),
            Style::default()
                .fg(COLORS.text_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", group.git_root.as_deref().unwrap_or("no git root")),
            Style::default().fg(COLORS.text_secondary),
        ),
        Span::styled(
            format!(
                "  created {} · updated {}",
                format_date(&group.created_at),
                format_date(&group.updated_at)
            ),
            Style::default().fg(COLORS.text_muted),
        ),
    ];
    if page.loading() {
        header.push(Span::styled(
            "  refreshing...",
            Style::default().fg(COLORS.info),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(header)).block(panel_block("GROUP", false)),
        rows[0],
    );

    let block = panel_block("STATS", false);
    let inner = block.inner(rows[1]);
    frame.render_widget(block, rows[1]);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(inner);
    let total_tokens = stats.total_input_tokens + stats.total_output_tokens;
    frame.render_widget(
        stat_widget("Projects", stats.total_projects.to_string(), COLORS.accent_magenta),
        cols[0],
    );
    frame.render_widget(
        stat_widget("Sessions", stats.total_sessions.to_string(), COLORS.accent_cyan),
        cols[1],
    );
    frame.render_widget(
        stat_widget("Tokens", format_number(total_tokens), COLORS.accent_yellow),
        cols[2],
    );
    frame.render_widget(
        stat_widget(
            "Avg / session",
            format_number(stats.avg_tokens.round() as u64),
            COLORS.accent_blue,
        ),
        cols[3],
    );
    frame.render_widget(
        stat_widget("Error rate", format_percent(stats.error_rate), COLORS.error),
        cols[4],
    );

    let block = panel_block("TOKEN USAGE", false);
    let inner = block.inner(rows[2]);
    frame.render_widget(block, rows[2]);
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
    lines.extend(timeline_lines(page.timeline(), inner.width as usize));
    frame.render_widget(Paragraph::new(lines), inner);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);

    let items: Vec<ListItem> = group
        .projects
        .iter()
        .map(|p| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    fixed_width(&p.name, 24),
                    Style::default().fg(COLORS.text_primary),
                ),
                Span::styled(
                    format!("{:>5} sess", p.session_count),
                    Style::default().fg(COLORS.accent_cyan),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(panel_block(
            &format!("PROJECTS ({})", group.projects.len()),
            true,
        ))
        .highlight_style(
            Style::default()
                .bg(COLORS.bg_highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);
    let mut state = ListState::default();
    if !group.projects.is_empty() {
        state.select(Some(page.selected));
    }
    frame.render_stateful_widget(list, bottom[0], &mut state);

    let drill = &page.drilldown;
    let name_width = (bottom[1].width as usize).saturating_sub(52).clamp(8, 24);
    let drill_rows = drill
        .data()
        .map(|daily| {
            daily
                .projects
                .iter()
                .map(|p| {
                    usage_row(
                        &p.project_name,
                        name_width,
                        p.total_input_tokens,
                        p.total_output_tokens,
                        p.total_tokens,
                        p.session_count,
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    frame.render_widget(
        drilldown_panel(
            "BY PROJECT",
            drill.selected_date(),
            drill.loading(),
            drill.error(),
            drill_rows,
        ),
        bottom[1],
    );
}
