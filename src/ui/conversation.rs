//! Session detail screen: summary, token breakdown and the conversation.

use super::helpers::{error_line, fixed_width, loading_line, message_panel, panel_block};
use crate::api::{ContentBlock, Message, MessageKind, SessionDetail};
use crate::format::{format_datetime, format_number, format_number_full, safe_truncate_plain};
use crate::pages::session_detail::SessionDetailPage;
use crate::theme::ThemeColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthChar;

const COLORS: ThemeColors = ThemeColors::DEFAULT;

/// Longest tool output shown when a result is expanded.
const MAX_RESULT_LINES: usize = 40;

pub fn render(frame: &mut Frame, area: Rect, page: &mut SessionDetailPage) {
    let Some(session) = page.session() else {
        let line = match page.error() {
            Some(message) => error_line(message),
            None => loading_line(),
        };
        frame.render_widget(message_panel("SESSION", line), area);
        return;
    };

    let model_rows = session.model_usage.len().min(4) as u16;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8.max(model_rows + 4)), Constraint::Min(5)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    frame.render_widget(
        Paragraph::new(summary_lines(session, page.error())).block(panel_block(
            &format!("SESSION {}", page.session_id()),
            false,
        )),
        top[0],
    );
    frame.render_widget(
        Paragraph::new(token_lines(session, top[1].width as usize))
            .block(panel_block("TOKENS", false)),
        top[1],
    );

    let inner_width = rows[1].width.saturating_sub(2) as usize;
    let inner_height = rows[1].height.saturating_sub(2) as usize;
    let (lines, focused_line) = conversation_lines(page, inner_width);

    page.fit_scroll(focused_line, lines.len(), inner_height);

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(page.scroll)
        .take(inner_height)
        .collect();
    frame.render_widget(
        Paragraph::new(visible).block(panel_block("CONVERSATION", true)),
        rows[1],
    );
}

fn summary_lines(session: &SessionDetail, error: Option<&str>) -> Vec<Line<'static>> {
    let label = Style::default().fg(COLORS.text_muted);
    let value = Style::default().fg(COLORS.text_primary);
    let row = |name: &'static str, text: String| {
        Line::from(vec![Span::styled(format!("{:<9}", name), label), Span::styled(text, value)])
    };
    let mut lines = vec![
        row("Project", session.project_name.clone()),
        row(
            "Branch",
            if session.git_branch.is_empty() {
                "-".to_string()
            } else {
                session.git_branch.clone()
            },
        ),
        row("Started", format_datetime(&session.start_time)),
        row("Ended", format_datetime(&session.end_time)),
        row("Duration", session.duration.clone()),
        Line::from(vec![
            Span::styled(format!("{:<9}", "Errors"), label),
            Span::styled(
                session.error_count.to_string(),
                if session.error_count > 0 {
                    Style::default().fg(COLORS.error).add_modifier(Modifier::BOLD)
                } else {
                    value
                },
            ),
            Span::styled(
                format!("   {} tool calls", session.tool_calls.len()),
                label,
            ),
        ]),
    ];
    if let Some(message) = error {
        lines.push(error_line(message));
    }
    lines
}

fn token_lines(session: &SessionDetail, width: usize) -> Vec<Line<'static>> {
    let t = &session.total_tokens;
    let label = Style::default().fg(COLORS.text_muted);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Input ", label),
            Span::styled(
                format_number_full(t.input_tokens),
                Style::default().fg(COLORS.token_input()),
            ),
            Span::styled("  Output ", label),
            Span::styled(
                format_number_full(t.output_tokens),
                Style::default().fg(COLORS.token_output()),
            ),
        ]),
        Line::from(vec![
            Span::styled("Cache write ", label),
            Span::styled(
                format_number_full(t.cache_creation_input_tokens),
                Style::default().fg(COLORS.accent_orange),
            ),
            Span::styled("  Cache read ", label),
            Span::styled(
                format_number_full(t.cache_read_input_tokens),
                Style::default().fg(COLORS.accent_green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Total ", label),
            Span::styled(
                format_number_full(t.total_tokens),
                Style::default()
                    .fg(COLORS.accent_yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    let name_width = width.saturating_sub(30).clamp(8, 32);
    for usage in session.model_usage.iter().take(4) {
        lines.push(Line::from(vec![
            Span::styled(
                fixed_width(&usage.model, name_width),
                Style::default().fg(COLORS.text_secondary),
            ),
            Span::styled(" │ ", label),
            Span::styled(
                format!("{:>7}", format_number(usage.tokens.input_tokens)),
                Style::default().fg(COLORS.token_input()),
            ),
            Span::styled(" in ", label),
            Span::styled(
                format!("{:>7}", format_number(usage.tokens.output_tokens)),
                Style::default().fg(COLORS.token_output()),
            ),
            Span::styled(" out", label),
        ]));
    }
    lines
}

/// Conversation as rendered lines plus the line of the focused tool block.
pub fn conversation_lines(
    page: &SessionDetailPage,
    width: usize,
) -> (Vec<Line<'static>>, Option<usize>) {
    let Some(session) = page.session() else {
        return (Vec::new(), None);
    };
    if session.messages.is_empty() {
        return (
            vec![Line::from(Span::styled(
                "No messages found",
                Style::default().fg(COLORS.text_muted),
            ))],
            None,
        );
    }

    let focused = page.focused();
    let mut focused_line = None;
    let mut lines = Vec::with_capacity(session.messages.len() * 6);
    for (m, msg) in session.messages.iter().enumerate() {
        lines.push(message_header(msg, width));
        for (b, block) in msg.content.iter().enumerate() {
            let at = (m, b);
            if focused == Some(at) {
                focused_line = Some(lines.len());
            }
            block_lines(
                block,
                page.is_expanded(at),
                focused == Some(at),
                width,
                &mut lines,
            );
        }
        lines.push(Line::from(""));
    }
    (lines, focused_line)
}

fn message_header(msg: &Message, width: usize) -> Line<'static> {
    let (icon, role, color) = match msg.kind {
        MessageKind::User => ("👤", "USER", COLORS.accent_cyan),
        MessageKind::Assistant => ("🤖", "ASSISTANT", COLORS.accent_green),
    };
    let role = match &msg.model {
        Some(model) if msg.kind == MessageKind::Assistant => format!("{} ({})", role, model),
        _ => role.to_string(),
    };
    let header = format!(" {} {} · {} ", icon, role, format_datetime(&msg.timestamp));
    let dashes = "─".repeat(width.saturating_sub(header.chars().count() + 1));
    Line::from(vec![
        Span::styled(header, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(dashes, Style::default().fg(COLORS.border_muted)),
    ])
}

fn block_lines(
    block: &ContentBlock,
    expanded: bool,
    focused: bool,
    width: usize,
    out: &mut Vec<Line<'static>>,
) {
    let arrow = if expanded { "▼" } else { "▶" };
    let toggle_style = |color| {
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if focused {
            style.bg(COLORS.bg_highlight)
        } else {
            style
        }
    };
    let body_width = width.saturating_sub(4).max(1);
    match block {
        ContentBlock::Text { text } => {
            for line in wrap_text(text, width.saturating_sub(2).max(1)) {
                out.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(line, Style::default().fg(COLORS.text_primary)),
                ]));
            }
        }
        ContentBlock::ToolUse { name, input, .. } => {
            out.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{} Tool: {}", arrow, name),
                    toggle_style(COLORS.accent_blue),
                ),
            ]));
            if expanded {
                out.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled("Input:", Style::default().fg(COLORS.text_muted)),
                ]));
                let pretty = serde_json::to_string_pretty(input).unwrap_or_default();
                for line in pretty.lines() {
                    out.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(
                            safe_truncate_plain(line, body_width).into_owned(),
                            Style::default().fg(COLORS.text_secondary),
                        ),
                    ]));
                }
            }
        }
        ContentBlock::ToolResult {
            content, is_error, ..
        } => {
            let (label, color) = if *is_error {
                ("Tool Result (Error)", COLORS.error)
            } else {
                ("Tool Result", COLORS.text_muted)
            };
            out.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{} {}", arrow, label), toggle_style(color)),
            ]));
            if expanded {
                let body = if *is_error {
                    COLORS.error
                } else {
                    COLORS.text_secondary
                };
                let total = content.lines().count();
                for line in content.lines().take(MAX_RESULT_LINES) {
                    out.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(
                            safe_truncate_plain(line, body_width).into_owned(),
                            Style::default().fg(body),
                        ),
                    ]));
                }
                if total > MAX_RESULT_LINES {
                    out.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(
                            format!("... ({} more)", total - MAX_RESULT_LINES),
                            Style::default().fg(COLORS.text_muted),
                        ),
                    ]));
                }
            }
        }
        ContentBlock::Thinking { .. } | ContentBlock::Unknown => {}
    }
}

/// Word-wrap to `width` columns, keeping blank lines and splitting words
/// longer than a line.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_width = 0;
        for word in raw.split_whitespace() {
            let word_width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
            if current_width > 0 && current_width + 1 + word_width <= width {
                current.push(' ');
                current.push_str(word);
                current_width += 1 + word_width;
                continue;
            }
            if current_width > 0 {
                out.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if word_width <= width {
                current.push_str(word);
                current_width = word_width;
                continue;
            }
            for ch in word.chars() {
                let w = ch.width().unwrap_or(0);
                if current_width + w > width {
                    out.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(ch);
                current_width += w;
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}
