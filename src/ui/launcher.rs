//! Login screen that decides which tool to start. Launching itself happens in
//! `main` once the terminal has been restored.

use std::mem;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use tracing::{info, warn};

use crate::session::Role;

use super::forms::PasswordInput;
use super::helpers::{
    centered_rect, draw_footer, key_hints, split_footer, StatusKind, StatusMessage,
};
use super::terminal::TuiApp;

const LOGO: [&str; 5] = [
    r"  ____                              ____                      _ _ ",
    r" / ___|__ _ _ __ ___  ___ _ __     / ___|___  _   _ _ __   ___(_) |",
    r"| |   / _` | '__/ _ \/ _ \ '__|   | |   / _ \| | | | '_ \ / __| | |",
    r"| |__| (_| | | |  __/  __/ |      | |__| (_) | |_| | | | | (__| | |",
    r" \____\__,_|_|  \___|\___|_|       \____\___/ \__,_|_| |_|\___|_|_|",
];

const MENU_ITEMS: [(Role, &str); 2] = [
    (Role::Admin, "Administrator Access"),
    (Role::Student, "Student Access"),
];

enum Page {
    Menu { selected: usize },
    AdminLogin(PasswordInput),
}

pub struct LauncherApp {
    page: Page,
    status: Option<StatusMessage>,
    outcome: Option<Role>,
}

impl Default for LauncherApp {
    fn default() -> Self {
        Self::new()
    }
}

impl LauncherApp {
    pub fn new() -> Self {
        Self {
            page: Page::Menu { selected: 0 },
            status: None,
            outcome: None,
        }
    }

    /// Tool picked by the user, if the launcher closed because of a login.
    pub fn outcome(&self) -> Option<Role> {
        self.outcome
    }

    fn handle_menu_key(&mut self, code: KeyCode, selected: usize, exit: &mut bool) -> Page {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
                Page::Menu { selected }
            }
            KeyCode::Up | KeyCode::BackTab => Page::Menu {
                selected: selected.saturating_sub(1),
            },
            KeyCode::Down | KeyCode::Tab => Page::Menu {
                selected: (selected + 1).min(MENU_ITEMS.len() - 1),
            },
            KeyCode::Char('a') => self.choose(Role::Admin, selected, exit),
            KeyCode::Char('s') => self.choose(Role::Student, selected, exit),
            KeyCode::Enter => match MENU_ITEMS.get(selected) {
                Some((role, _)) => self.choose(*role, selected, exit),
                None => Page::Menu { selected },
            },
            _ => Page::Menu { selected },
        }
    }

    fn choose(&mut self, role: Role, selected: usize, exit: &mut bool) -> Page {
        match role {
            Role::Admin => {
                self.status = None;
                Page::AdminLogin(PasswordInput::default())
            }
            Role::Student => {
                info!("student access selected");
                self.outcome = Some(Role::Student);
                *exit = true;
                Page::Menu { selected }
            }
        }
    }

    fn handle_login_key(
        &mut self,
        code: KeyCode,
        mut input: PasswordInput,
        exit: &mut bool,
    ) -> Page {
        match code {
            KeyCode::Esc => {
                self.status = None;
                return Page::Menu { selected: 0 };
            }
            KeyCode::Tab => input.toggle_visibility(),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Enter => {
                if input.verify() {
                    info!("administrator login accepted");
                    self.set_status("Access granted", StatusKind::Info);
                    self.outcome = Some(Role::Admin);
                    *exit = true;
                } else {
                    warn!("administrator login rejected");
                    self.set_status("Access denied - Invalid credentials", StatusKind::Error);
                    input.clear();
                }
            }
            KeyCode::Char(ch) => {
                input.push_char(ch);
            }
            _ => {}
        }
        Page::AdminLogin(input)
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn draw_banner(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = LOGO
            .iter()
            .map(|row| Line::from(Span::styled(*row, Style::default().fg(Color::Cyan))))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Career Council",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            "Your path to success starts here",
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect, selected: usize) {
        let mut lines = vec![
            Line::from(Span::styled(
                "Select your login type",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (idx, (_, label)) in MENU_ITEMS.iter().enumerate() {
            let style = if idx == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            lines.push(Line::from(Span::styled(format!("  {label}  "), style)));
            lines.push(Line::from(""));
        }
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect, input: &PasswordInput) {
        let popup = centered_rect(50, 40, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Administrator Login")
            .style(Style::default().fg(Color::White));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let visibility = if input.visible { "visible" } else { "hidden" };
        let lines = vec![
            Line::from("Enter the administrator password."),
            Line::from(""),
            Line::from(vec![
                Span::styled("Password: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(input.display()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("Password is {visibility}. Press Tab to toggle."),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        let offset = "Password: ".len() as u16 + input.display().chars().count() as u16;
        let cursor_x = (inner.x + offset).min(inner.right().saturating_sub(1));
        let cursor_y = inner.y + 2;
        if cursor_y < inner.bottom() {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn footer_instructions(&self) -> Line<'static> {
        match &self.page {
            Page::Menu { .. } => key_hints(&[
                ("↑↓", "Choose"),
                ("Enter", "Select"),
                ("a", "Admin"),
                ("s", "Student"),
                ("q", "Quit"),
            ]),
            Page::AdminLogin(_) => key_hints(&[
                ("Enter", "Login"),
                ("Tab", "Show/Hide"),
                ("Esc", "Back"),
            ]),
        }
    }
}

impl TuiApp for LauncherApp {
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut exit = false;
        let page = mem::replace(&mut self.page, Page::Menu { selected: 0 });

        self.page = match page {
            Page::Menu { selected } => self.handle_menu_key(key.code, selected, &mut exit),
            Page::AdminLogin(input) => self.handle_login_key(key.code, input, &mut exit),
        };

        Ok(exit)
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let (content_area, footer_area) = split_footer(area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(LOGO.len() as u16 + 3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(content_area);

        self.draw_banner(frame, chunks[1]);

        match &self.page {
            Page::Menu { selected } => self.draw_menu(frame, chunks[3], *selected),
            Page::AdminLogin(input) => self.draw_login(frame, content_area, input),
        }

        if let Some(footer_area) = footer_area {
            draw_footer(
                frame,
                footer_area,
                self.status.as_ref(),
                self.footer_instructions(),
            );
        }
    }
}
