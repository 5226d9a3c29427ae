//! Administrator tool: browse, add, edit and delete colleges along with their
//! cutoff scores.

use std::mem;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::db::{
    create_college, delete_college, fetch_colleges, fetch_cutoffs_for_college, fetch_exam_names,
    update_college, Database,
};
use crate::models::College;

use super::forms::{CollegeForm, ConfirmCollegeDelete};
use super::helpers::{
    card_details, card_title, centered_rect, draw_footer, format_currency, key_hints,
    render_cards, split_footer, surface_error, StatusKind, StatusMessage,
};
use super::screens::CollegeList;
use super::terminal::TuiApp;

/// Height allocation per college card.
const COLLEGE_CARD_HEIGHT: u16 = 4;
const HEADER_HEIGHT: u16 = 3;

/// Fine-grained modes layered over the college list.
enum Mode {
    Normal,
    AddingCollege(CollegeForm),
    EditingCollege { id: i64, form: CollegeForm },
    ConfirmDelete(ConfirmCollegeDelete),
}

pub struct AdminApp {
    db: Database,
    exams: Vec<String>,
    list: CollegeList,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl AdminApp {
    pub fn new(db: Database, exams: Vec<String>, colleges: Vec<College>) -> Self {
        Self {
            db,
            exams,
            list: CollegeList::new(colleges),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Read the exam list and existing colleges, then build the app. A list
    /// that fails to load starts out empty and the failure is shown in the
    /// status line.
    pub fn load(db: Database) -> Self {
        let exams = db.connect().and_then(|conn| fetch_exam_names(&conn));
        let colleges = db.connect().and_then(|conn| fetch_colleges(&conn));

        let mut app = Self::new(db, Vec::new(), Vec::new());
        match exams {
            Ok(exams) => app.exams = exams,
            Err(err) => app.report_error("Error loading exam types", &err),
        }
        match colleges {
            Ok(colleges) => app.list.replace(colleges, None),
            Err(err) => {
                if app.status.is_none() {
                    app.report_error("Error loading colleges", &err);
                } else {
                    warn!(error = %surface_error(&err), "could not load colleges");
                }
            }
        }
        app
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.list.move_selection(-1),
            KeyCode::Down => self.list.move_selection(1),
            KeyCode::PageUp => self.list.move_selection(-5),
            KeyCode::PageDown => self.list.move_selection(5),
            KeyCode::Home => self.list.select_first(),
            KeyCode::End => self.list.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Ok(Mode::AddingCollege(CollegeForm::new(self.exams.clone())));
            }
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(college) = self.list.current().cloned() {
                    self.clear_status();
                    match self.edit_form(&college) {
                        Ok(form) => {
                            return Ok(Mode::EditingCollege {
                                id: college.id,
                                form,
                            })
                        }
                        Err(err) => self.report_error("Error loading cutoff scores", &err),
                    }
                } else {
                    self.set_status("No college selected to edit.", StatusKind::Error);
                }
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Char('D') => {
                if let Some(college) = self.list.current() {
                    let confirm = ConfirmCollegeDelete::from(college);
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                } else {
                    self.set_status("No college selected to delete.", StatusKind::Error);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => match self.reload(None) {
                Ok(()) => self.set_status("Reloaded colleges.", StatusKind::Info),
                Err(err) => self.report_error("Error loading colleges", &err),
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    /// Shared key handling for the add and edit forms. Returns `Some(form)`
    /// while the form should stay open.
    fn handle_form_key(
        &mut self,
        code: KeyCode,
        mut form: CollegeForm,
        editing: Option<i64>,
    ) -> Option<CollegeForm> {
        match code {
            KeyCode::Esc => {
                let message = if editing.is_some() {
                    "Edit cancelled."
                } else {
                    "Add college cancelled."
                };
                self.set_status(message, StatusKind::Info);
                return None;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => {
                form.cycle_option(-1);
            }
            KeyCode::Right => {
                form.cycle_option(1);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let saved = match editing {
                    Some(id) => self.save_existing_college(id, &form),
                    None => self.save_new_college(&form),
                };
                match saved {
                    Ok(()) => return None,
                    Err(err) => {
                        let message = surface_error(&err);
                        warn!(error = %message, "college form rejected");
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Some(form)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmCollegeDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Mode::Normal,
                    Err(err) => {
                        self.report_error("Error deleting college", &err);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn edit_form(&self, college: &College) -> Result<CollegeForm> {
        let conn = self.db.connect()?;
        let existing = fetch_cutoffs_for_college(&conn, college.id)?;
        Ok(CollegeForm::from_college(college, self.exams.clone(), existing))
    }

    /// Errors returned here keep the form open; once the write has committed,
    /// a failed list refresh only shows up in the status line.
    fn save_new_college(&mut self, form: &CollegeForm) -> Result<()> {
        let (details, cutoffs) = form.parse_inputs()?;
        let mut conn = self.db.connect()?;
        let college = create_college(&mut conn, &details, cutoffs.as_ref())?;
        drop(conn);
        self.set_status("College added successfully!", StatusKind::Info);
        self.refresh(Some(college.id));
        Ok(())
    }

    fn save_existing_college(&mut self, id: i64, form: &CollegeForm) -> Result<()> {
        let (details, cutoffs) = form.parse_inputs()?;
        let mut conn = self.db.connect()?;
        update_college(&mut conn, id, &details, cutoffs.as_ref())?;
        drop(conn);
        self.set_status("College updated successfully!", StatusKind::Info);
        self.refresh(Some(id));
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmCollegeDelete) -> Result<()> {
        let mut conn = self.db.connect()?;
        delete_college(&mut conn, confirm.id)?;
        drop(conn);
        self.set_status("College deleted successfully!", StatusKind::Info);
        self.refresh(None);
        Ok(())
    }

    fn refresh(&mut self, focus_id: Option<i64>) {
        if let Err(err) = self.reload(focus_id) {
            self.report_error("Error loading colleges", &err);
        }
    }

    fn reload(&mut self, focus_id: Option<i64>) -> Result<()> {
        let conn = self.db.connect()?;
        let colleges = fetch_colleges(&conn)?;
        self.list.replace(colleges, focus_id);
        Ok(())
    }

    fn report_error(&mut self, context: &str, err: &anyhow::Error) {
        let message = format!("{context}: {}", surface_error(err));
        warn!(error = %message, "admin action failed");
        self.set_status(message, StatusKind::Error);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "College Database Manager",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Add, Update, or Delete College Information",
                Style::default().fg(Color::Gray),
            )),
        ];
        let header = Paragraph::new(lines).alignment(Alignment::Center);
        frame.render_widget(header, area);
    }

    fn draw_college_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Existing Colleges ({})", self.list.colleges.len()));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        if self.list.colleges.is_empty() {
            let message = Paragraph::new("No colleges yet. Press '+' to add one.")
                .alignment(Alignment::Center);
            frame.render_widget(message, inner);
            return;
        }

        let cards = self
            .list
            .colleges
            .iter()
            .enumerate()
            .map(|(idx, college)| {
                vec![
                    card_title(&college.name, idx == self.list.selected),
                    card_details(&[
                        ("Location", college.location.clone()),
                        ("Field", college.field.to_string()),
                        ("Tuition Fee", format_currency(college.tuition_fee)),
                    ]),
                ]
            })
            .collect();
        render_cards(frame, inner, cards, self.list.selected, COLLEGE_CARD_HEIGHT);
    }

    fn draw_college_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &CollegeForm) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("{title} - College Details"))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • ←/→ to choose • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);

        if let Some(offset) = form.cursor_offset() {
            let cursor_x = (inner.x + offset).min(inner.right().saturating_sub(1));
            let cursor_y = inner.y + form.active.row();
            if cursor_y < inner.bottom() {
                frame.set_cursor_position((cursor_x, cursor_y));
            }
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmCollegeDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Delete").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Are you sure you want to delete {} ({})?",
                confirm.name, confirm.location
            )),
            Line::from("Its cutoff scores will be removed as well."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match &self.mode {
            Mode::Normal => key_hints(&[
                ("↑↓", "Navigate"),
                ("+", "Add"),
                ("E", "Edit"),
                ("-", "Delete"),
                ("R", "Reload"),
                ("Q", "Quit"),
            ]),
            Mode::AddingCollege(_) | Mode::EditingCollege { .. } => key_hints(&[
                ("Tab", "Next field"),
                ("←→", "Choose"),
                ("Enter", "Save"),
                ("Esc", "Cancel"),
            ]),
            Mode::ConfirmDelete(_) => key_hints(&[("Y", "Delete"), ("N", "Keep")]),
        }
    }
}

impl TuiApp for AdminApp {
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(key.code, &mut exit)?,
            Mode::AddingCollege(form) => match self.handle_form_key(key.code, form, None) {
                Some(form) => Mode::AddingCollege(form),
                None => Mode::Normal,
            },
            Mode::EditingCollege { id, form } => {
                match self.handle_form_key(key.code, form, Some(id)) {
                    Some(form) => Mode::EditingCollege { id, form },
                    None => Mode::Normal,
                }
            }
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(key.code, confirm),
        };

        Ok(exit)
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let (content_area, footer_area) = split_footer(area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(content_area);
        self.draw_header(frame, chunks[0]);
        self.draw_college_list(frame, chunks[1]);

        if let Some(footer_area) = footer_area {
            draw_footer(
                frame,
                footer_area,
                self.status.as_ref(),
                self.footer_instructions(),
            );
        }

        match &self.mode {
            Mode::AddingCollege(form) => self.draw_college_form(frame, area, "Add College", form),
            Mode::EditingCollege { form, .. } => {
                self.draw_college_form(frame, area, "Update College", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut AdminApp, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch))).unwrap();
        }
    }

    fn app() -> (TempDir, AdminApp) {
        let temp = TempDir::new().unwrap();
        let db = Database::open(temp.path().join("admin.db")).unwrap();
        let app = AdminApp::load(db);
        (temp, app)
    }

    /// A row whose field is not one of the known values makes every
    /// `fetch_colleges` call fail while writes keep working.
    fn insert_unreadable_college(app: &AdminApp) {
        let conn = app.db.connect().unwrap();
        conn.execute(
            "INSERT INTO colleges (name, location, field, tuition_fee)
             VALUES ('Broken', 'Nowhere', 'Law', 1.0)",
            [],
        )
        .unwrap();
    }

    fn status(app: &AdminApp) -> Option<(&str, StatusKind)> {
        app.status.as_ref().map(|s| (s.text.as_str(), s.kind))
    }

    #[test]
    fn load_failure_is_reported_not_fatal() {
        let (temp, app) = app();
        insert_unreadable_college(&app);
        let db = Database::open(temp.path().join("admin.db")).unwrap();

        let app = AdminApp::load(db);
        assert!(app.list.colleges.is_empty());
        assert_eq!(app.exams.len(), 4);
        let (text, kind) = status(&app).unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(text.starts_with("Error loading colleges: "), "{text}");
    }

    #[test]
    fn committed_insert_closes_form_even_if_refresh_fails() {
        let (_temp, mut app) = app();
        insert_unreadable_college(&app);

        app.handle_key(key(KeyCode::Char('+'))).unwrap();
        type_text(&mut app, "BITS Pilani");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "Pilani");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "500000");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let (text, kind) = status(&app).unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(text.starts_with("Error loading colleges: "), "{text}");

        let conn = app.db.connect().unwrap();
        let saved: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM colleges WHERE name = 'BITS Pilani'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(saved, 1);
    }

    #[test]
    fn add_edit_and_delete_through_keys() {
        let (_temp, mut app) = app();
        assert!(app.list.colleges.is_empty());

        app.handle_key(key(KeyCode::Char('+'))).unwrap();
        type_text(&mut app, "NIT Warangal");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "Warangal");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "125000");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        // Exam selector: first Right picks the first exam alphabetically.
        app.handle_key(key(KeyCode::Right)).unwrap();
        app.handle_key(key(KeyCode::Right)).unwrap();
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "88");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.list.colleges.len(), 1);
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("College added successfully!")
        );
        let id = app.list.colleges[0].id;
        let conn = app.db.connect().unwrap();
        let cutoffs = fetch_cutoffs_for_college(&conn, id).unwrap();
        assert_eq!(cutoffs.len(), 1);
        assert_eq!(cutoffs[0].exam, "JEE Advanced");
        assert_eq!(cutoffs[0].score, 88.0);
        drop(conn);

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        match &app.mode {
            Mode::EditingCollege { form, .. } => {
                assert_eq!(form.selected_exam(), Some("JEE Advanced"));
                assert_eq!(form.cutoffs[0], "88");
            }
            _ => panic!("expected edit mode"),
        }
        app.handle_key(key(KeyCode::Backspace)).unwrap();
        type_text(&mut app, "l");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.list.colleges[0].name, "NIT Warangal");

        app.handle_key(key(KeyCode::Char('-'))).unwrap();
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.list.colleges.len(), 1);

        app.handle_key(key(KeyCode::Char('-'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert!(app.list.colleges.is_empty());
        let conn = app.db.connect().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM cutoffs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn invalid_form_stays_open_with_error() {
        let (_temp, mut app) = app();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "Only a name");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        match &app.mode {
            Mode::AddingCollege(form) => {
                assert_eq!(form.error.as_deref(), Some("Please fill all college details."));
            }
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));

        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert!(!app.handle_key(key(KeyCode::Down)).unwrap());
        assert!(app.handle_key(key(KeyCode::Char('q'))).unwrap());
    }
}
