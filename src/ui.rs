//! Terminal UI: a stack of screens over the API page state.

mod conversation;
mod dashboard;
mod group;
mod helpers;
mod project;
mod sessions;

use crate::api::{AnalyzeResponse, ApiClient, HealthResponse, Period};
use crate::pages::group_detail::GroupDetailPage;
use crate::pages::project_detail::{DetailTab, ProjectDetailPage};
use crate::pages::projects::ProjectsPage;
use crate::pages::session_detail::SessionDetailPage;
use crate::pages::sessions::SessionsPage;
use crate::pages::Loader;
use crate::scan_status::{ScanMonitor, SCAN_POLL_INTERVAL};
use crate::theme::ThemeColors;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dashboard::DashboardView;
use group::GroupView;
use helpers::key_hints;
use log::{error, info};
use project::{FilterField, ProjectView};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

const COLORS: ThemeColors = ThemeColors::DEFAULT;

/// How long a notice stays in the status bar.
const NOTICE_TTL: Duration = Duration::from_secs(5);

enum Screen {
    Dashboard(DashboardView),
    Group(GroupView),
    Project(ProjectView),
    Sessions(SessionsPage),
    Session(SessionDetailPage),
}

impl Screen {
    fn update(&mut self) -> bool {
        match self {
            Screen::Dashboard(view) => view.page.update(),
            Screen::Group(view) => view.page.update(),
            Screen::Project(view) => view.page.update(),
            Screen::Sessions(page) => page.update(),
            Screen::Session(page) => page.update(),
        }
    }

    fn title(&self) -> String {
        match self {
            Screen::Dashboard(_) => "Dashboard".to_string(),
            Screen::Group(view) => view
                .page
                .group()
                .map(|g| g.name.clone())
                .unwrap_or_else(|| format!("group {}", view.page.group_id())),
            Screen::Project(view) => view.page.project_name().to_string(),
            Screen::Sessions(page) => format!("{} sessions", page.project_name()),
            Screen::Session(page) => crate::format::short_id(page.session_id()).to_string(),
        }
    }
}

struct Notice {
    text: String,
    is_error: bool,
    at: Instant,
}

pub struct App {
    client: Arc<ApiClient>,
    poll_interval: Duration,
    /// Never empty; the dashboard is at the bottom.
    stack: Vec<Screen>,
    scan: ScanMonitor,
    health: Loader<HealthResponse>,
    analysis: Loader<AnalyzeResponse>,
    notice: Option<Notice>,
    exit: bool,
    should_redraw: bool,
}

impl App {
    pub fn new(client: Arc<ApiClient>, poll_interval: Duration) -> Self {
        let dashboard = DashboardView::new(ProjectsPage::new(client.clone(), poll_interval));
        let scan_client = client.clone();
        let scan = ScanMonitor::new(move || scan_client.scan_status(), SCAN_POLL_INTERVAL);
        let health_client = client.clone();
        let health = Loader::spawn("health", "Backend unreachable", move || {
            health_client.health()
        });
        Self {
            client,
            poll_interval,
            stack: vec![Screen::Dashboard(dashboard)],
            scan,
            health,
            analysis: Loader::idle("analyze", "Analysis failed"),
            notice: None,
            exit: false,
            should_redraw: true,
        }
    }

    pub fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> io::Result<()> {
        self.should_redraw = true;

        while !self.exit {
            // Short poll: 30ms keeps UI responsive while saving CPU.
            if event::poll(Duration::from_millis(30))? {
                while event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) => {
                            if key.kind == KeyEventKind::Press {
                                self.handle_key_event(key);
                                self.should_redraw = true;
                                if self.exit {
                                    return Ok(());
                                }
                            }
                        }
                        Event::Resize(_, _) => self.should_redraw = true,
                        Event::Mouse(_)
                        | Event::FocusGained
                        | Event::FocusLost
                        | Event::Paste(_) => {}
                    }
                }
            }

            if self.tick() {
                self.should_redraw = true;
            }

            if self.should_redraw {
                terminal.draw(|frame| self.render(frame))?;
                self.should_redraw = false;
            }
        }

        Ok(())
    }

    /// Pick up background results. Returns true when anything visible changed.
    fn tick(&mut self) -> bool {
        let mut changed = false;
        for screen in &mut self.stack {
            changed |= screen.update();
        }
        changed |= self.scan.update();

        if self.health.apply_updates() {
            changed = true;
            match (self.health.data(), self.health.error()) {
                (_, Some(message)) => {
                    let text = format!("Backend unreachable: {}", message);
                    self.set_notice(text, true);
                }
                (Some(health), None) => {
                    info!("backend {} reports {}", self.client.base_url(), health.status)
                }
                (None, None) => {}
            }
        }

        if self.analysis.apply_updates() {
            changed = true;
            match (self.analysis.data(), self.analysis.error()) {
                (_, Some(message)) => {
                    let text = format!("Analysis failed: {}", message);
                    self.set_notice(text, true);
                }
                (Some(result), None) => {
                    info!(
                        "analysis {}: {} found, {} parsed, {} errors",
                        result.status, result.sessions_found, result.sessions_parsed, result.error_count
                    );
                    let text = format!(
                        "Analysis {}: {}/{} sessions parsed",
                        result.status, result.sessions_parsed, result.sessions_found
                    );
                    let had_errors = result.error_count > 0;
                    self.set_notice(text, had_errors);
                }
                (None, None) => {}
            }
        }

        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
            changed = true;
        }
        changed
    }

    fn set_notice(&mut self, text: String, is_error: bool) {
        if is_error {
            error!("{}", text);
        }
        self.notice = Some(Notice {
            text,
            is_error,
            at: Instant::now(),
        });
    }

    fn push(&mut self, screen: Screen) {
        info!("open {}", screen.title());
        self.stack.push(screen);
    }

    /// Pop the current screen; quitting when only the dashboard is left.
    fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            self.exit = true;
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.exit = true;
            return;
        }

        // Typing a filter date captures every key until Enter or Esc.
        if let Some(Screen::Project(view)) = self.stack.last_mut() {
            if let Some(input) = view.input.as_mut() {
                match key.code {
                    KeyCode::Esc => view.input = None,
                    KeyCode::Enter => {
                        if let Err(message) = view.commit_input() {
                            self.set_notice(message, true);
                        }
                    }
                    KeyCode::Backspace => {
                        input.buffer.pop();
                    }
                    KeyCode::Char(c) if (c.is_ascii_digit() || c == '-') && input.buffer.len() < 10 => {
                        input.buffer.push(c);
                    }
                    _ => {}
                }
                return;
            }
        }

        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            self.pop();
            return;
        }

        let client = self.client.clone();
        let poll_interval = self.poll_interval;
        let mut next: Option<Screen> = None;

        match self.stack.last_mut() {
            Some(Screen::Dashboard(view)) => match key.code {
                KeyCode::Char(c @ ('d' | 'w' | 'm')) => {
                    view.page.set_period(period_for_key(c));
                    view.page.drilldown.close();
                }
                KeyCode::Tab => view.page.toggle_tab(),
                KeyCode::Down | KeyCode::Char('j') => view.page.select_next(),
                KeyCode::Up | KeyCode::Char('k') => view.page.select_previous(),
                KeyCode::Right | KeyCode::Char('l') => {
                    view.badges.next(view.page.date_badges().len())
                }
                KeyCode::Left | KeyCode::Char('h') => view.badges.previous(),
                KeyCode::Char(' ') => view.click_badge(),
                KeyCode::Char('x') => view.page.drilldown.close(),
                KeyCode::Char('a') => {
                    if !self.analysis.loading() {
                        let client = client.clone();
                        self.analysis.load(move || client.analyze(None));
                        self.notice = Some(Notice {
                            text: "Analysis started".to_string(),
                            is_error: false,
                            at: Instant::now(),
                        });
                    }
                }
                KeyCode::Enter => {
                    if let Some(group) = view.page.selected_group() {
                        next = Some(Screen::Group(GroupView::new(GroupDetailPage::new(
                            client, group.id,
                        ))));
                    } else if let Some(project) = view.page.selected_project() {
                        next = Some(Screen::Project(ProjectView::new(ProjectDetailPage::new(
                            client,
                            &project.name,
                            poll_interval,
                        ))));
                    }
                }
                _ => {}
            },
            Some(Screen::Group(view)) => match key.code {
                KeyCode::Char(c @ ('d' | 'w' | 'm')) => {
                    view.page.set_period(period_for_key(c));
                    view.page.drilldown.close();
                }
                KeyCode::Char('r') => view.page.refresh(),
                KeyCode::Down | KeyCode::Char('j') => view.page.select_next(),
                KeyCode::Up | KeyCode::Char('k') => view.page.select_previous(),
                KeyCode::Right | KeyCode::Char('l') => {
                    view.badges.next(view.page.date_badges().len())
                }
                KeyCode::Left | KeyCode::Char('h') => view.badges.previous(),
                KeyCode::Char(' ') => view.click_badge(),
                KeyCode::Char('x') => view.page.drilldown.close(),
                KeyCode::Enter => {
                    if let Some(name) = view.page.selected_project_name() {
                        next = Some(Screen::Project(ProjectView::new(ProjectDetailPage::new(
                            client,
                            name,
                            poll_interval,
                        ))));
                    }
                }
                _ => {}
            },
            Some(Screen::Project(view)) => {
                let tab = view.page.tab();
                match (tab, key.code) {
                    (_, KeyCode::Tab | KeyCode::Char('t')) => view.page.set_tab(match tab {
                        DetailTab::Stats => DetailTab::Sessions,
                        DetailTab::Sessions => DetailTab::Stats,
                    }),
                    (_, KeyCode::Char('o')) => {
                        next = Some(Screen::Sessions(SessionsPage::new(
                            client,
                            view.page.project_name(),
                            poll_interval,
                        )));
                    }
                    (DetailTab::Stats, KeyCode::Char(c @ ('d' | 'w' | 'm'))) => {
                        view.page.set_period(period_for_key(c));
                        view.page.drilldown.close();
                    }
                    (DetailTab::Stats, KeyCode::Right | KeyCode::Char('l')) => {
                        view.badges.next(view.page.date_badges().len())
                    }
                    (DetailTab::Stats, KeyCode::Left | KeyCode::Char('h')) => {
                        view.badges.previous()
                    }
                    (DetailTab::Stats, KeyCode::Char(' ')) => view.click_badge(),
                    (DetailTab::Stats, KeyCode::Char('x')) => view.page.drilldown.close(),
                    (DetailTab::Sessions, KeyCode::Down | KeyCode::Char('j')) => {
                        view.page.select_next()
                    }
                    (DetailTab::Sessions, KeyCode::Up | KeyCode::Char('k')) => {
                        view.page.select_previous()
                    }
                    (DetailTab::Sessions, KeyCode::Right | KeyCode::Char('l')) => {
                        view.page.next_page()
                    }
                    (DetailTab::Sessions, KeyCode::Left | KeyCode::Char('h')) => {
                        view.page.previous_page()
                    }
                    (DetailTab::Sessions, KeyCode::Char('s')) => {
                        view.begin_input(FilterField::Start)
                    }
                    (DetailTab::Sessions, KeyCode::Char('e')) => {
                        view.begin_input(FilterField::End)
                    }
                    (DetailTab::Sessions, KeyCode::Char('c')) => view.clear_filter(),
                    (DetailTab::Sessions, KeyCode::Enter) => {
                        if let Some(session) = view.page.selected_session() {
                            next = Some(Screen::Session(SessionDetailPage::new(
                                client,
                                &session.project_name,
                                &session.id,
                            )));
                        }
                    }
                    _ => {}
                }
            }
            Some(Screen::Sessions(page)) => match key.code {
                KeyCode::Down | KeyCode::Char('j') => page.select_next(),
                KeyCode::Up | KeyCode::Char('k') => page.select_previous(),
                KeyCode::Enter => {
                    if let Some(session) = page.selected_session() {
                        next = Some(Screen::Session(SessionDetailPage::new(
                            client,
                            &session.project_name,
                            &session.id,
                        )));
                    }
                }
                _ => {}
            },
            Some(Screen::Session(page)) => match key.code {
                KeyCode::Down | KeyCode::Char('j') => page.focus_next(),
                KeyCode::Up | KeyCode::Char('k') => page.focus_previous(),
                KeyCode::Enter | KeyCode::Char(' ') => page.toggle_focused(),
                KeyCode::PageDown => page.scroll = page.scroll.saturating_add(10),
                KeyCode::PageUp => page.scroll = page.scroll.saturating_sub(10),
                KeyCode::Home => page.scroll = 0,
                KeyCode::Char('r') => page.refresh(),
                _ => {}
            },
            None => self.exit = true,
        }

        if let Some(screen) = next {
            self.push(screen);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_breadcrumb(frame, main_chunks[0]);
        match self.stack.last_mut() {
            Some(Screen::Dashboard(view)) => dashboard::render(frame, main_chunks[1], view),
            Some(Screen::Group(view)) => group::render(frame, main_chunks[1], view),
            Some(Screen::Project(view)) => project::render(frame, main_chunks[1], view),
            Some(Screen::Sessions(page)) => sessions::render(frame, main_chunks[1], page),
            Some(Screen::Session(page)) => conversation::render(frame, main_chunks[1], page),
            None => {}
        }
        self.render_status_bar(frame, main_chunks[2]);

        if self.scan.is_visible() {
            self.render_scan_indicator(frame, main_chunks[1]);
        }
    }

    fn render_breadcrumb(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::with_capacity(self.stack.len() * 2 + 1);
        spans.push(Span::styled(
            " cclog ",
            Style::default()
                .fg(COLORS.bg_primary)
                .bg(COLORS.accent_cyan)
                .add_modifier(Modifier::BOLD),
        ));
        for (i, screen) in self.stack.iter().enumerate() {
            let style = if i + 1 == self.stack.len() {
                Style::default()
                    .fg(COLORS.text_primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(COLORS.text_muted)
            };
            spans.push(Span::styled(" › ", Style::default().fg(COLORS.border_muted)));
            spans.push(Span::styled(screen.title(), style));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(COLORS.bg_tertiary)),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(notice) = &self.notice {
            let color = if notice.is_error {
                COLORS.error
            } else {
                COLORS.success
            };
            let bar = Paragraph::new(Line::from(Span::styled(
                notice.text.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .style(Style::default().bg(Color::Rgb(15, 15, 25)))
            .alignment(Alignment::Center);
            frame.render_widget(bar, area);
            return;
        }

        let back = if self.stack.len() > 1 { "back" } else { "quit" };
        let hints: Vec<(&'static str, &'static str)> = match self.stack.last() {
            Some(Screen::Dashboard(_)) => vec![
                ("↑↓", "select"),
                ("Enter", "open"),
                ("Tab", "groups/projects"),
                ("d/w/m", "period"),
                ("←→ Space", "date"),
                ("a", "analyze"),
                ("Esc/q", back),
            ],
            Some(Screen::Group(_)) => vec![
                ("↑↓", "select"),
                ("Enter", "open"),
                ("d/w/m", "period"),
                ("←→ Space", "date"),
                ("r", "reload"),
                ("Esc/q", back),
            ],
            Some(Screen::Project(view)) if view.input.is_some() => {
                vec![("YYYY-MM-DD", "type"), ("Enter", "apply"), ("Esc", "cancel")]
            }
            Some(Screen::Project(view)) => match view.page.tab() {
                DetailTab::Stats => vec![
                    ("Tab", "sessions"),
                    ("d/w/m", "period"),
                    ("←→ Space", "date"),
                    ("o", "live list"),
                    ("Esc/q", back),
                ],
                DetailTab::Sessions => vec![
                    ("Tab", "stats"),
                    ("↑↓", "select"),
                    ("←→", "page"),
                    ("s/e", "from/to"),
                    ("c", "clear"),
                    ("Enter", "open"),
                    ("Esc/q", back),
                ],
            },
            Some(Screen::Sessions(_)) => {
                vec![("↑↓", "select"), ("Enter", "open"), ("Esc/q", back)]
            }
            Some(Screen::Session(_)) => vec![
                ("↑↓", "tool blocks"),
                ("Enter/Space", "expand"),
                ("PgUp/Dn", "scroll"),
                ("r", "reload"),
                ("Esc/q", back),
            ],
            None => Vec::new(),
        };

        let status_bar = Paragraph::new(Line::from(key_hints(&hints)))
            .style(Style::default().bg(Color::Rgb(15, 15, 25)))
            .alignment(Alignment::Center);
        frame.render_widget(status_bar, area);
    }

    fn render_scan_indicator(&self, frame: &mut Frame, area: Rect) {
        let Some(status) = self.scan.status() else {
            return;
        };
        let mut lines = vec![Line::from(vec![
            Span::styled("⟳ ", Style::default().fg(COLORS.info)),
            Span::styled(
                format!("{} sessions processed", status.processed_sessions()),
                Style::default().fg(COLORS.text_primary),
            ),
        ])];
        if status.error_count > 0 {
            let detail = status.last_error.as_deref().unwrap_or("");
            lines.push(Line::from(Span::styled(
                helpers::fixed_width(&format!("{} errors {}", status.error_count, detail), 40),
                Style::default().fg(COLORS.error),
            )));
        }

        let width = 44.min(area.width);
        let height = (lines.len() as u16 + 2).min(area.height);
        let rect = Rect::new(area.x + area.width - width, area.y, width, height);
        let body = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLORS.info))
                .title(Span::styled(
                    " Scanning ",
                    Style::default().fg(COLORS.info).add_modifier(Modifier::BOLD),
                )),
        );
        frame.render_widget(Clear, rect);
        frame.render_widget(body, rect);
    }
}

fn period_for_key(key: char) -> Period {
    match key {
        'w' => Period::Week,
        'm' => Period::Month,
        _ => Period::Day,
    }
}
