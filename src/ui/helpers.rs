//! Helper functions and shared types for UI rendering

use crate::api::{Period, TimeSeriesResponse};
use crate::format::{format_number, format_period_label, truncate_with_ellipsis};
use crate::pages::DateBadge;
use crate::theme::ThemeColors;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

const COLORS: ThemeColors = ThemeColors::DEFAULT;

/// Helper: Create a stat paragraph with label and value
pub fn stat_widget(label: &str, value: String, color: Color) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(COLORS.text_muted),
        )),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
}

/// Bordered panel with a centered title; focused panels get the accent border.
pub fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let (border, title_color) = if focused {
        (
            Style::default()
                .fg(COLORS.border_focus)
                .add_modifier(Modifier::BOLD),
            COLORS.border_focus,
        )
    } else {
        (Style::default().fg(COLORS.border_muted), COLORS.text_muted)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(
            Line::from(Span::styled(
                format!(" {} ", title),
                Style::default()
                    .fg(title_color)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        )
}

pub fn loading_line() -> Line<'static> {
    Line::from(Span::styled(
        "Loading...",
        Style::default().fg(COLORS.text_muted),
    ))
}

pub fn error_line(message: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "Error: ",
            Style::default()
                .fg(COLORS.error)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(message.to_string(), Style::default().fg(COLORS.error)),
    ])
}

pub fn message_panel(title: &str, line: Line<'static>) -> Paragraph<'static> {
    Paragraph::new(line)
        .block(panel_block(title, false))
        .wrap(Wrap { trim: false })
}

/// Key hint spans in the status bar style: bold key, dim description.
pub fn key_hints(hints: &[(&'static str, &'static str)]) -> Vec<Span<'static>> {
    let k = Style::default()
        .fg(Color::Rgb(140, 140, 160))
        .add_modifier(Modifier::BOLD);
    let t = Style::default().fg(Color::DarkGray);
    let sep = Span::styled(" │ ", Style::default().fg(Color::Rgb(50, 50, 70)));

    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (i, (key, text)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(sep.clone());
        }
        spans.push(Span::styled(*key, k));
        spans.push(Span::styled(format!(" {}", text), t));
    }
    spans
}

/// "[Day] Week Month" with the active period highlighted.
pub fn period_tabs(active: Period) -> Line<'static> {
    let mut spans = Vec::with_capacity(6);
    for (period, key) in [(Period::Day, 'd'), (Period::Week, 'w'), (Period::Month, 'm')] {
        let label = format!(" {} {} ", key, period.as_str());
        let style = if period == active {
            Style::default()
                .fg(COLORS.bg_primary)
                .bg(COLORS.accent_cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLORS.text_secondary)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Date badges with the cursor and the open drilldown date marked.
pub fn badge_line(badges: &[DateBadge], cursor: usize, selected: Option<&str>) -> Line<'static> {
    if badges.is_empty() {
        return Line::from(Span::styled(
            "No dates",
            Style::default().fg(COLORS.text_muted),
        ));
    }
    let mut spans = Vec::with_capacity(badges.len() * 2);
    for (i, badge) in badges.iter().enumerate() {
        let mut style = if selected == Some(badge.date.as_str()) {
            Style::default()
                .fg(COLORS.bg_primary)
                .bg(COLORS.accent_yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLORS.text_secondary)
        };
        if i == cursor {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {} ", badge.label), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Cursor over the date badges of a screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct BadgeCursor {
    index: usize,
}

impl BadgeCursor {
    pub fn index(&self, len: usize) -> usize {
        self.index.min(len.saturating_sub(1))
    }

    pub fn next(&mut self, len: usize) {
        if self.index + 1 < len {
            self.index += 1;
        }
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn current<'a>(&self, badges: &'a [DateBadge]) -> Option<&'a DateBadge> {
        badges.get(self.index(badges.len()))
    }
}

/// Horizontal bar per timeline bucket, input and output stacked.
pub fn timeline_lines(timeline: Option<&TimeSeriesResponse>, width: usize) -> Vec<Line<'static>> {
    let Some(timeline) = timeline.filter(|t| !t.data.is_empty()) else {
        return vec![Line::from(Span::styled(
            "No data",
            Style::default().fg(COLORS.text_muted),
        ))];
    };
    let monthly = timeline.period == Period::Month;
    let max = timeline
        .data
        .iter()
        .map(|p| p.total_tokens)
        .max()
        .unwrap_or(0)
        .max(1);
    // label(8) + value(8) + spacing
    let bar_width = width.saturating_sub(20).max(1);

    timeline
        .data
        .iter()
        .map(|point| {
            let label = format_period_label(&point.period_start, monthly);
            let total_cells = bar_cells(point.total_tokens, max, bar_width);
            let input_cells = if point.total_tokens == 0 {
                0
            } else {
                ((point.total_input_tokens as f64 / point.total_tokens as f64)
                    * total_cells as f64)
                    .round() as usize
            }
            .min(total_cells);
            Line::from(vec![
                Span::styled(
                    format!("{:>7} ", label),
                    Style::default().fg(COLORS.text_secondary),
                ),
                Span::styled(
                    "█".repeat(input_cells),
                    Style::default().fg(COLORS.token_input()),
                ),
                Span::styled(
                    "█".repeat(total_cells - input_cells),
                    Style::default().fg(COLORS.token_output()),
                ),
                Span::styled(
                    format!(" {}", format_number(point.total_tokens)),
                    Style::default().fg(COLORS.text_primary),
                ),
            ])
        })
        .collect()
}

/// Cells for `value` on a bar scaled so that `max` fills `width`.
/// Any non-zero value gets at least one cell.
pub fn bar_cells(value: u64, max: u64, width: usize) -> usize {
    if value == 0 || max == 0 {
        return 0;
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    cells.clamp(1, width)
}

/// Helper: Create a list row with consistent formatting for usage lists
pub fn usage_row(
    name: &str,
    name_width: usize,
    input_tokens: u64,
    output_tokens: u64,
    total_tokens: u64,
    session_count: u64,
) -> Line<'static> {
    let sep = Style::default().fg(COLORS.text_muted);
    Line::from(vec![
        Span::styled(
            fixed_width(name, name_width),
            Style::default().fg(COLORS.text_primary),
        ),
        Span::styled(" │ ", sep),
        Span::styled(
            format!("{:>7}", format_number(input_tokens)),
            Style::default().fg(COLORS.token_input()),
        ),
        Span::styled(" in ", sep),
        Span::styled(
            format!("{:>7}", format_number(output_tokens)),
            Style::default().fg(COLORS.token_output()),
        ),
        Span::styled(" out", sep),
        Span::styled(" │ ", sep),
        Span::styled(
            format!("{:>7}", format_number(total_tokens)),
            Style::default().fg(COLORS.accent_yellow),
        ),
        Span::styled(" │ ", sep),
        Span::styled(
            format!("{:>4} sess", session_count),
            Style::default().fg(COLORS.accent_cyan),
        ),
    ])
}

/// Drilldown panel body: hint when closed, then loading, error or rows.
pub fn drilldown_panel(
    title: &str,
    date: Option<&str>,
    loading: bool,
    error: Option<&str>,
    rows: Vec<Line<'static>>,
) -> Paragraph<'static> {
    let title = match date {
        Some(date) => format!("{} · {}", title, date),
        None => title.to_string(),
    };
    let lines = if date.is_none() {
        vec![Line::from(Span::styled(
            "Select a date with ←→ and Space",
            Style::default().fg(COLORS.text_muted),
        ))]
    } else if loading {
        vec![loading_line()]
    } else if let Some(message) = error {
        vec![error_line(message)]
    } else if rows.is_empty() {
        vec![Line::from(Span::styled(
            "No activity on this date",
            Style::default().fg(COLORS.text_muted),
        ))]
    } else {
        rows
    };
    Paragraph::new(lines).block(panel_block(&title, date.is_some()))
}

/// Name padded or cut to a fixed display width.
pub fn fixed_width(name: &str, width: usize) -> String {
    let name = truncate_with_ellipsis(name, width);
    let pad = width.saturating_sub(unicode_width::UnicodeWidthStr::width(name.as_str()));
    format!("{}{}", name, " ".repeat(pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TimeSeriesDataPoint;

    #[test]
    fn test_bar_cells_scale() {
        assert_eq!(bar_cells(0, 100, 10), 0);
        assert_eq!(bar_cells(100, 100, 10), 10);
        assert_eq!(bar_cells(50, 100, 10), 5);
        assert_eq!(bar_cells(1, 1_000_000, 10), 1);
    }

    #[test]
    fn test_badge_cursor_clamps() {
        let badges = vec![
            DateBadge {
                date: "2026-01-28".to_string(),
                label: "1/28".to_string(),
            },
            DateBadge {
                date: "2026-01-27".to_string(),
                label: "1/27".to_string(),
            },
        ];
        let mut cursor = BadgeCursor::default();
        cursor.next(badges.len());
        cursor.next(badges.len());
        assert_eq!(cursor.current(&badges).map(|b| b.label.as_str()), Some("1/27"));
        assert_eq!(cursor.current(&badges[..1]).map(|b| b.label.as_str()), Some("1/28"));
        assert!(cursor.current(&[]).is_none());
    }

    #[test]
    fn test_timeline_one_line_per_bucket() {
        let timeline = TimeSeriesResponse {
            period: Period::Day,
            data: vec![
                TimeSeriesDataPoint {
                    period_start: "2026-01-26T00:00:00Z".to_string(),
                    total_input_tokens: 600,
                    total_output_tokens: 400,
                    total_tokens: 1000,
                    ..Default::default()
                },
                TimeSeriesDataPoint {
                    period_start: "2026-01-27T00:00:00Z".to_string(),
                    ..Default::default()
                },
            ],
        };
        let lines = timeline_lines(Some(&timeline), 30);
        assert_eq!(lines.len(), 2);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.contains("1/26"));
        assert!(first.ends_with("1.0K"));
        assert_eq!(timeline_lines(None, 30).len(), 1);
    }

    #[test]
    fn test_fixed_width_pads_and_cuts() {
        assert_eq!(fixed_width("web", 5), "web  ");
        assert_eq!(fixed_width("monorepo", 5), "mono…");
    }
}
