//! Session list screen and the session row shared with the project screen.

use super::helpers::{error_line, loading_line, message_panel, panel_block};
use crate::api::SessionSummary;
use crate::format::{format_datetime, format_number, short_id, truncate_with_ellipsis};
use crate::pages::sessions::SessionsPage;
use crate::theme::ThemeColors;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{HighlightSpacing, List, ListItem, ListState},
    Frame,
};

const COLORS: ThemeColors = ThemeColors::DEFAULT;

/// id │ started │ branch │ tokens │ errors │ first prompt
pub fn session_row(session: &SessionSummary, width: usize) -> Line<'static> {
    let sep = Style::default().fg(COLORS.text_muted);
    let branch = if session.git_branch.is_empty() {
        "-"
    } else {
        session.git_branch.as_str()
    };
    let error_style = Style::default().fg(COLORS.error_count(session.error_count));
    // id(8) + time(19) + branch(12) + tokens(7) + errors(5) + separators
    let prompt_width = width.saturating_sub(70).max(10);
    let prompt = first_line(&session.first_user_message);

    Line::from(vec![
        Span::styled(
            format!("{:<8}", short_id(&session.id)),
            Style::default().fg(COLORS.accent_blue),
        ),
        Span::styled(" │ ", sep),
        Span::styled(
            format_datetime(&session.start_time),
            Style::default().fg(COLORS.text_secondary),
        ),
        Span::styled(" │ ", sep),
        Span::styled(
            format!("{:<12}", truncate_with_ellipsis(branch, 12)),
            Style::default().fg(COLORS.accent_green),
        ),
        Span::styled(" │ ", sep),
        Span::styled(
            format!("{:>7}", format_number(session.total_tokens)),
            Style::default().fg(COLORS.accent_yellow),
        ),
        Span::styled(" │ ", sep),
        Span::styled(format!("{:>3} err", session.error_count), error_style),
        Span::styled(" │ ", sep),
        Span::styled(
            truncate_with_ellipsis(prompt, prompt_width),
            Style::default().fg(COLORS.text_primary),
        ),
    ])
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

pub fn session_list<'a>(
    title: &str,
    sessions: impl IntoIterator<Item = &'a SessionSummary>,
    width: usize,
) -> List<'static> {
    let items: Vec<ListItem> = sessions
        .into_iter()
        .map(|s| ListItem::new(session_row(s, width)))
        .collect();
    List::new(items)
        .block(panel_block(title, true))
        .highlight_style(
            Style::default()
                .bg(COLORS.bg_highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always)
}

pub fn render(frame: &mut Frame, area: Rect, page: &SessionsPage) {
    let title = format!("SESSIONS · {}", page.project_name());
    if page.sessions().is_empty() {
        let line = if page.loading() {
            loading_line()
        } else if let Some(message) = page.error() {
            error_line(message)
        } else {
            Line::from(Span::styled(
                "No sessions found",
                Style::default().fg(COLORS.text_muted),
            ))
        };
        frame.render_widget(message_panel(&title, line), area);
        return;
    }

    let title = match page.error() {
        Some(message) => format!("{} · {}", title, message),
        None => format!("{} ({})", title, page.sessions().len()),
    };
    let list = session_list(&title, page.sessions(), area.width as usize);
    let mut state = ListState::default();
    state.select(Some(page.selected));
    frame.render_stateful_widget(list, area, &mut state);
}
