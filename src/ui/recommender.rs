//! Student-facing recommender. Read-only: it only lists exams and runs the
//! recommendation search.

use std::mem;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, error, info};

use crate::db::{fetch_exam_names, search_colleges, Database};
use crate::models::Recommendation;

use super::forms::SearchForm;
use super::helpers::{
    card_details, card_title, draw_footer, draw_message_dialog, format_currency, key_hints,
    render_cards, split_footer, surface_error, StatusKind, StatusMessage,
};
use super::screens::ResultsScreen;
use super::terminal::TuiApp;

const RESULT_CARD_HEIGHT: u16 = 5;
const HEADER_HEIGHT: u16 = 3;
const FORM_HEIGHT: u16 = 7;
const FILTER_HEIGHT: u16 = 3;
const FILTER_PLACEHOLDER: &str = "Search colleges by name or location...";

enum Mode {
    Normal,
    Filtering,
    ShowingErrors { title: String, messages: Vec<String> },
}

pub struct RecommenderApp {
    db: Database,
    form: SearchForm,
    results: ResultsScreen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl RecommenderApp {
    pub fn new(db: Database, exams: Vec<String>) -> Self {
        let mut app = Self {
            db,
            form: SearchForm::new(exams),
            results: ResultsScreen::default(),
            mode: Mode::Normal,
            status: None,
        };
        app.revalidate();
        app
    }

    /// Build the app, showing an error dialog instead of failing when the exam
    /// list cannot be read.
    pub fn load(db: Database) -> Self {
        let exams = db.connect().and_then(|conn| fetch_exam_names(&conn));
        match exams {
            Ok(exams) => Self::new(db, exams),
            Err(err) => {
                let message = format!("Error loading exam types: {}", surface_error(&err));
                error!(error = %message, "could not load exams");
                let mut app = Self::new(db, Vec::new());
                app.mode = Mode::ShowingErrors {
                    title: "Database Error".to_string(),
                    messages: vec![message],
                };
                app
            }
        }
    }

    /// Re-run validation after an edit and mirror the outcome in the status
    /// line.
    fn revalidate(&mut self) {
        let errors = self.form.validation_errors();
        match errors.first() {
            Some(first) => self.set_status(first.clone(), StatusKind::Error),
            None => self.set_status("Ready to search", StatusKind::Info),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, exit: &mut bool) -> Mode {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('l') {
                self.clear_form();
            }
            return Mode::Normal;
        }

        match key.code {
            KeyCode::Esc => *exit = true,
            KeyCode::Tab => self.form.next_field(),
            KeyCode::BackTab => self.form.previous_field(),
            KeyCode::Left => {
                if self.form.cycle_option(-1) {
                    self.revalidate();
                }
            }
            KeyCode::Right => {
                if self.form.cycle_option(1) {
                    self.revalidate();
                }
            }
            KeyCode::Up => self.results.move_selection(-1),
            KeyCode::Down => self.results.move_selection(1),
            KeyCode::PageUp => self.results.move_selection(-5),
            KeyCode::PageDown => self.results.move_selection(5),
            KeyCode::Home => self.results.select_first(),
            KeyCode::End => self.results.select_last(),
            KeyCode::Backspace => {
                self.form.backspace();
                self.revalidate();
            }
            KeyCode::Enter => return self.search(),
            KeyCode::Char('/') => return Mode::Filtering,
            KeyCode::Char(ch) => {
                if self.form.push_char(ch) {
                    self.revalidate();
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_filter_key(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.results.set_filter(String::new());
                self.report_filter();
                Mode::Normal
            }
            KeyCode::Enter => Mode::Normal,
            KeyCode::Backspace => {
                let mut filter = self.results.filter.clone();
                filter.pop();
                self.results.set_filter(filter);
                self.report_filter();
                Mode::Filtering
            }
            KeyCode::Up => {
                self.results.move_selection(-1);
                Mode::Filtering
            }
            KeyCode::Down => {
                self.results.move_selection(1);
                Mode::Filtering
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                let mut filter = self.results.filter.clone();
                filter.push(ch);
                self.results.set_filter(filter);
                self.report_filter();
                Mode::Filtering
            }
            _ => Mode::Filtering,
        }
    }

    /// Validate, query, and swap in the new result list.
    fn search(&mut self) -> Mode {
        let query = match self.form.to_query() {
            Ok(query) => query,
            Err(messages) => {
                debug!(?messages, "search form invalid");
                return Mode::ShowingErrors {
                    title: "Input Error".to_string(),
                    messages,
                };
            }
        };

        let outcome = self
            .db
            .connect()
            .and_then(|conn| search_colleges(&conn, &query));

        match outcome {
            Ok(found) => {
                info!(found = found.len(), exam = %query.exam, "search finished");
                let message = if found.is_empty() {
                    "No colleges found".to_string()
                } else {
                    format!("Found {} matching colleges", found.len())
                };
                self.results.filter.clear();
                self.results.set_results(found);
                self.set_status(message, StatusKind::Info);
                Mode::Normal
            }
            Err(err) => {
                let message = format!(
                    "An error occurred while searching: {}",
                    surface_error(&err)
                );
                error!(error = %message, "search failed");
                self.results.clear();
                self.set_status("Search failed", StatusKind::Error);
                Mode::ShowingErrors {
                    title: "Error".to_string(),
                    messages: vec![message],
                }
            }
        }
    }

    fn clear_form(&mut self) {
        self.form.clear();
        self.results.clear();
        self.set_status("Form cleared", StatusKind::Info);
    }

    fn report_filter(&mut self) {
        if self.results.filter.trim().is_empty() {
            let total = self.results.results.len();
            self.set_status(format!("Found {total} matching colleges"), StatusKind::Info);
        } else {
            let message = format!(
                "Showing {} of {} colleges",
                self.results.filtered.len(),
                self.results.results.len()
            );
            self.set_status(message, StatusKind::Info);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "College Recommender",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Find colleges that match your exam score and budget",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Student Details");
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(self.form.lines()), inner);

        if matches!(self.mode, Mode::Normal) {
            if let Some(offset) = self.form.cursor_offset() {
                let cursor_y = inner.y + self.form.active.row();
                if cursor_y < inner.bottom() {
                    let cursor_x = (inner.x + offset).min(inner.right().saturating_sub(1));
                    frame.set_cursor_position((cursor_x, cursor_y));
                }
            }
        }
    }

    fn draw_filter(&self, frame: &mut Frame, area: Rect) {
        let editing = matches!(self.mode, Mode::Filtering);
        let mut block = Block::default().borders(Borders::ALL).title("Filter");
        if editing {
            block = block.style(Style::default().fg(Color::Yellow));
        }
        let inner = block.inner(area);

        let text = if self.results.filter.is_empty() && !editing {
            Span::styled(FILTER_PLACEHOLDER, Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.results.filter.clone())
        };
        let paragraph = Paragraph::new(Line::from(vec![Span::raw("/ "), text])).block(block);
        frame.render_widget(paragraph, area);

        if editing {
            let offset = 2 + self.results.filter.chars().count() as u16;
            let cursor_x = (inner.x + offset).min(inner.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let title = if self.results.searched {
            format!(
                "Recommended Colleges ({}/{})",
                self.results.filtered.len(),
                self.results.results.len()
            )
        } else {
            "Recommended Colleges".to_string()
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        if self.results.filtered.is_empty() {
            let text = if !self.results.searched {
                "Fill in your details and press Enter to search.".to_string()
            } else if self.results.results.is_empty() {
                "No colleges found matching your criteria.\nTry adjusting your score or budget criteria."
                    .to_string()
            } else {
                format!("No results match \"{}\".", self.results.filter)
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, inner);
            return;
        }

        let cards = self
            .results
            .filtered
            .iter()
            .enumerate()
            .map(|(idx, rec)| result_card(rec, idx == self.results.selected))
            .collect();
        render_cards(frame, inner, cards, self.results.selected, RESULT_CARD_HEIGHT);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match &self.mode {
            Mode::Normal => key_hints(&[
                ("Tab", "Next field"),
                ("←→", "Choose"),
                ("Enter", "Search"),
                ("↑↓", "Scroll"),
                ("/", "Filter"),
                ("Ctrl+L", "Clear"),
                ("Esc", "Quit"),
            ]),
            Mode::Filtering => key_hints(&[("Enter", "Done"), ("Esc", "Clear filter")]),
            Mode::ShowingErrors { .. } => key_hints(&[("Any key", "Dismiss")]),
        }
    }
}

fn result_card(rec: &Recommendation, selected: bool) -> Vec<Line<'static>> {
    vec![
        card_title(&rec.name, selected),
        card_details(&[
            ("Location", rec.location.clone()),
            ("Field", rec.field.to_string()),
        ]),
        card_details(&[
            ("Cutoff Score", format!("{:.2}", rec.cutoff_score)),
            ("Annual Tuition Fee", format_currency(rec.tuition_fee)),
        ]),
    ]
}

impl TuiApp for RecommenderApp {
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(key, &mut exit),
            Mode::Filtering => self.handle_filter_key(key.code),
            Mode::ShowingErrors { .. } => Mode::Normal,
        };

        Ok(exit)
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let (content_area, footer_area) = split_footer(area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Length(FORM_HEIGHT),
                Constraint::Length(FILTER_HEIGHT),
                Constraint::Min(0),
            ])
            .split(content_area);

        self.draw_header(frame, chunks[0]);
        self.draw_form(frame, chunks[1]);
        self.draw_filter(frame, chunks[2]);
        self.draw_results(frame, chunks[3]);

        if let Some(footer_area) = footer_area {
            draw_footer(
                frame,
                footer_area,
                self.status.as_ref(),
                self.footer_instructions(),
            );
        }

        if let Mode::ShowingErrors { title, messages } = &self.mode {
            draw_message_dialog(frame, area, title, messages);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_college;
    use crate::models::{Category, CollegeDetails, ExamCutoffs, Field};
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn status(app: &RecommenderApp) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    fn seeded_app() -> (TempDir, RecommenderApp) {
        let temp = TempDir::new().unwrap();
        let db = Database::open(temp.path().join("rec.db")).unwrap();
        let mut conn = db.connect().unwrap();
        for (name, location, fee, score) in [
            ("IIT Bombay", "Mumbai", 230000.0, 99.0),
            ("VJTI", "Mumbai", 85000.0, 96.0),
            ("COEP", "Pune", 90000.0, 94.0),
        ] {
            let details = CollegeDetails {
                name: name.into(),
                location: location.into(),
                field: Field::Engineering,
                tuition_fee: fee,
            };
            let cutoffs = ExamCutoffs::new("BITSAT").with(Category::General, score);
            create_college(&mut conn, &details, Some(&cutoffs)).unwrap();
        }
        drop(conn);
        (temp, RecommenderApp::load(db))
    }

    #[test]
    fn live_validation_updates_status() {
        let (_temp, mut app) = seeded_app();
        assert_eq!(status(&app), "Score is required");

        app.handle_key(key(KeyCode::BackTab)).unwrap();
        app.handle_key(key(KeyCode::BackTab)).unwrap();
        app.handle_key(key(KeyCode::Char('9'))).unwrap();
        assert_eq!(status(&app), "Ready to search");

        app.handle_key(key(KeyCode::Tab)).unwrap();
        app.handle_key(key(KeyCode::Char('-'))).unwrap();
        assert_eq!(status(&app), "Budget must be a valid number");
    }

    #[test]
    fn invalid_search_shows_all_errors() {
        let (_temp, mut app) = seeded_app();
        app.form.score = "x".into();
        app.form.budget = "-1".into();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        match &app.mode {
            Mode::ShowingErrors { title, messages } => {
                assert_eq!(title, "Input Error");
                assert_eq!(
                    messages,
                    &vec![
                        "Score must be a valid number".to_string(),
                        "Budget cannot be negative".to_string(),
                    ]
                );
            }
            _ => panic!("expected error dialog"),
        }
        app.handle_key(key(KeyCode::Char('z'))).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn search_filter_and_clear() {
        let (_temp, mut app) = seeded_app();
        assert_eq!(app.form.selected_exam(), Some("BITSAT"));
        app.form.score = "97".into();
        app.handle_key(key(KeyCode::Enter)).unwrap();

        let names: Vec<_> = app.results.filtered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["VJTI", "COEP"]);
        assert_eq!(status(&app), "Found 2 matching colleges");

        app.handle_key(key(KeyCode::Char('/'))).unwrap();
        for ch in "pune".chars() {
            app.handle_key(key(KeyCode::Char(ch))).unwrap();
        }
        assert_eq!(app.results.filtered.len(), 1);
        assert_eq!(status(&app), "Showing 1 of 2 colleges");
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.results.filtered.len(), 2);
        assert!(matches!(app.mode, Mode::Normal));

        app.form.budget = "50000".into();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.results.searched);
        assert!(app.results.results.is_empty());
        assert_eq!(status(&app), "No colleges found");

        app.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(!app.results.searched);
        assert!(app.form.score.is_empty());
        assert_eq!(status(&app), "Form cleared");

        assert!(app.handle_key(key(KeyCode::Esc)).unwrap());
    }
}
