use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{
    parse_amount, parse_non_negative, Category, College, CollegeDetails, Cutoff, ExamCutoffs,
    Field, RecommendationQuery,
};
use crate::session::check_password;

const MISSING_DETAILS: &str = "Please fill all college details.";
const INVALID_NUMBERS: &str = "Please enter valid numbers for fee and cutoff scores.";

/// Shared rendering for a `Label: value` form line. Selectors are drawn with
/// arrows so users know Left/Right changes them.
fn form_line(label: &str, value: &str, placeholder: &str, active: bool, selector: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else if selector {
        format!("◀ {value} ▶")
    } else {
        value.to_string()
    };

    let style = if active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Amount fields accept digits and a decimal point; anything else is ignored
/// before it reaches the parser.
fn accepts_amount_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

/// Fields of the admin college form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum CollegeField {
    #[default]
    Name,
    Location,
    Field,
    Fee,
    Exam,
    Cutoff(Category),
}

impl CollegeField {
    const ORDER: [CollegeField; 9] = [
        CollegeField::Name,
        CollegeField::Location,
        CollegeField::Field,
        CollegeField::Fee,
        CollegeField::Exam,
        CollegeField::Cutoff(Category::General),
        CollegeField::Cutoff(Category::Obc),
        CollegeField::Cutoff(Category::Sc),
        CollegeField::Cutoff(Category::St),
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    fn step(self, offset: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        Self::ORDER[(self.position() as isize + offset).rem_euclid(len) as usize]
    }

    /// Row on which the field is drawn inside the form body. The cutoff block
    /// sits below a heading line.
    pub(crate) fn row(self) -> u16 {
        match self {
            CollegeField::Cutoff(_) => self.position() as u16 + 1,
            _ => self.position() as u16,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            CollegeField::Name => "College Name",
            CollegeField::Location => "Location",
            CollegeField::Field => "Field",
            CollegeField::Fee => "Tuition Fee (₹)",
            CollegeField::Exam => "Exam",
            CollegeField::Cutoff(category) => category.as_str(),
        }
    }
}

/// Admin form for adding or editing a college together with one exam's worth
/// of cutoff scores.
#[derive(Clone, Debug)]
pub(crate) struct CollegeForm {
    pub(crate) name: String,
    pub(crate) location: String,
    pub(crate) field: Field,
    pub(crate) fee: String,
    pub(crate) exams: Vec<String>,
    /// Index into `exams`; `None` means cutoffs are left alone.
    pub(crate) exam: Option<usize>,
    pub(crate) cutoffs: [String; 4],
    /// Cutoffs already stored for the college being edited, used to refill the
    /// score inputs when the exam selection changes.
    pub(crate) existing: Vec<Cutoff>,
    pub(crate) active: CollegeField,
    pub(crate) error: Option<String>,
}

impl CollegeForm {
    pub(crate) fn new(exams: Vec<String>) -> Self {
        Self {
            name: String::new(),
            location: String::new(),
            field: Field::default(),
            fee: String::new(),
            exams,
            exam: None,
            cutoffs: Default::default(),
            existing: Vec::new(),
            active: CollegeField::Name,
            error: None,
        }
    }

    /// Populate the form from an existing college. The first exam that has
    /// stored cutoffs is preselected.
    pub(crate) fn from_college(college: &College, exams: Vec<String>, existing: Vec<Cutoff>) -> Self {
        let mut form = Self::new(exams);
        form.name = college.name.clone();
        form.location = college.location.clone();
        form.field = college.field;
        form.fee = trim_float(college.tuition_fee);
        form.existing = existing;
        if let Some(first) = form.existing.first() {
            form.exam = form.exams.iter().position(|exam| *exam == first.exam);
        }
        form.load_existing_scores();
        form
    }

    pub(crate) fn selected_exam(&self) -> Option<&str> {
        self.exam
            .and_then(|idx| self.exams.get(idx))
            .map(String::as_str)
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.step(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.step(-1);
    }

    /// Left/Right on a selector. Returns `true` when something changed.
    pub(crate) fn cycle_option(&mut self, offset: isize) -> bool {
        match self.active {
            CollegeField::Field => {
                self.field = self.field.cycle(offset);
                true
            }
            CollegeField::Exam => {
                // Positions: 0 = no exam, 1..=len = exams[pos - 1].
                let slots = self.exams.len() as isize + 1;
                let current = self.exam.map(|idx| idx as isize + 1).unwrap_or(0);
                let next = (current + offset).rem_euclid(slots);
                self.exam = if next == 0 {
                    None
                } else {
                    Some(next as usize - 1)
                };
                self.load_existing_scores();
                true
            }
            _ => false,
        }
    }

    fn load_existing_scores(&mut self) {
        let exam = self.selected_exam().map(str::to_string);
        let mut scores: [String; 4] = Default::default();
        if let Some(exam) = exam {
            for cutoff in self.existing.iter().filter(|cutoff| cutoff.exam == exam) {
                scores[cutoff.category.index()] = trim_float(cutoff.score);
            }
        }
        self.cutoffs = scores;
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            CollegeField::Name => self.name.push(ch),
            CollegeField::Location => self.location.push(ch),
            CollegeField::Fee if accepts_amount_char(ch) => self.fee.push(ch),
            CollegeField::Cutoff(category) if accepts_amount_char(ch) => {
                self.cutoffs[category.index()].push(ch)
            }
            _ => return false,
        }
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            CollegeField::Name => {
                self.name.pop();
            }
            CollegeField::Location => {
                self.location.pop();
            }
            CollegeField::Fee => {
                self.fee.pop();
            }
            CollegeField::Cutoff(category) => {
                self.cutoffs[category.index()].pop();
            }
            CollegeField::Field | CollegeField::Exam => {}
        }
    }

    /// Validate the inputs and return typed values ready for persistence.
    /// Cutoffs are only returned when an exam is selected.
    pub(crate) fn parse_inputs(&self) -> Result<(CollegeDetails, Option<ExamCutoffs>)> {
        let name = self.name.trim();
        let location = self.location.trim();
        let fee_raw = self.fee.trim();
        if name.is_empty() || location.is_empty() || fee_raw.is_empty() {
            return Err(anyhow!(MISSING_DETAILS));
        }

        let tuition_fee = parse_amount(fee_raw, "Tuition fee").map_err(|_| anyhow!(INVALID_NUMBERS))?;

        let cutoffs = match self.selected_exam() {
            Some(exam) => {
                let mut cutoffs = ExamCutoffs::new(exam);
                for category in Category::ALL {
                    let raw = self.cutoffs[category.index()].trim();
                    if raw.is_empty() {
                        continue;
                    }
                    let score =
                        parse_amount(raw, "Cutoff score").map_err(|_| anyhow!(INVALID_NUMBERS))?;
                    cutoffs = cutoffs.with(category, score);
                }
                Some(cutoffs)
            }
            None => None,
        };

        Ok((
            CollegeDetails {
                name: name.to_string(),
                location: location.to_string(),
                field: self.field,
                tuition_fee,
            },
            cutoffs,
        ))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: CollegeField) -> Line<'static> {
        let active = self.active == field;
        match field {
            CollegeField::Name => form_line(field.label(), &self.name, "<required>", active, false),
            CollegeField::Location => {
                form_line(field.label(), &self.location, "<required>", active, false)
            }
            CollegeField::Field => form_line(field.label(), self.field.as_str(), "", active, true),
            CollegeField::Fee => form_line(field.label(), &self.fee, "<required>", active, false),
            CollegeField::Exam => form_line(
                field.label(),
                self.selected_exam().unwrap_or(""),
                "◀ no exam (cutoffs unchanged) ▶",
                active,
                true,
            ),
            CollegeField::Cutoff(category) => form_line(
                &format!("  {}", field.label()),
                &self.cutoffs[category.index()],
                "<optional>",
                active,
                false,
            ),
        }
    }

    /// All lines of the form body in drawing order.
    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(CollegeField::ORDER.len() + 1);
        for field in CollegeField::ORDER {
            if field == CollegeField::Cutoff(Category::General) {
                lines.push(Line::from(Span::styled(
                    "Cutoff Scores",
                    Style::default().fg(Color::Cyan),
                )));
            }
            lines.push(self.build_line(field));
        }
        lines
    }

    /// Cursor column offset for text fields; selectors have no cursor.
    pub(crate) fn cursor_offset(&self) -> Option<u16> {
        let value_len = match self.active {
            CollegeField::Name => self.name.chars().count(),
            CollegeField::Location => self.location.chars().count(),
            CollegeField::Fee => self.fee.chars().count(),
            CollegeField::Cutoff(category) => self.cutoffs[category.index()].chars().count(),
            CollegeField::Field | CollegeField::Exam => return None,
        };
        let prefix = match self.active {
            CollegeField::Cutoff(_) => self.active.label().chars().count() + 4,
            _ => self.active.label().chars().count() + 2,
        };
        Some((prefix + value_len) as u16)
    }
}

/// Render floats without a trailing `.0` so edit forms look like what the
/// user typed.
fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmCollegeDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) location: String,
}

impl ConfirmCollegeDelete {
    /// Build the confirmation state from the college being considered.
    pub(crate) fn from(college: &College) -> Self {
        Self {
            id: college.id,
            name: college.name.clone(),
            location: college.location.clone(),
        }
    }
}

/// Fields of the recommender search form.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum SearchField {
    #[default]
    Exam,
    Field,
    Category,
    Score,
    Budget,
}

impl SearchField {
    const ORDER: [SearchField; 5] = [
        SearchField::Exam,
        SearchField::Field,
        SearchField::Category,
        SearchField::Score,
        SearchField::Budget,
    ];

    fn step(self, offset: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let position = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(position + offset).rem_euclid(len) as usize]
    }

    pub(crate) fn row(self) -> u16 {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as u16
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SearchField::Exam => "Exam",
            SearchField::Field => "Field",
            SearchField::Category => "Category",
            SearchField::Score => "Your Score",
            SearchField::Budget => "Max Budget (₹)",
        }
    }
}

/// Student search criteria. Exam, field and category are selectors; score and
/// budget are free text validated on every edit.
#[derive(Clone, Debug, Default)]
pub(crate) struct SearchForm {
    pub(crate) exams: Vec<String>,
    pub(crate) exam: Option<usize>,
    pub(crate) field: Field,
    pub(crate) category: Category,
    pub(crate) score: String,
    pub(crate) budget: String,
    pub(crate) active: SearchField,
}

impl SearchForm {
    /// The first exam is preselected when any exist.
    pub(crate) fn new(exams: Vec<String>) -> Self {
        let exam = if exams.is_empty() { None } else { Some(0) };
        Self {
            exams,
            exam,
            ..Self::default()
        }
    }

    pub(crate) fn selected_exam(&self) -> Option<&str> {
        self.exam
            .and_then(|idx| self.exams.get(idx))
            .map(String::as_str)
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.step(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.step(-1);
    }

    pub(crate) fn cycle_option(&mut self, offset: isize) -> bool {
        match self.active {
            SearchField::Exam => {
                if self.exams.is_empty() {
                    return false;
                }
                let len = self.exams.len() as isize;
                let current = self.exam.unwrap_or(0) as isize;
                self.exam = Some((current + offset).rem_euclid(len) as usize);
                true
            }
            SearchField::Field => {
                self.field = self.field.cycle(offset);
                true
            }
            SearchField::Category => {
                self.category = self.category.cycle(offset);
                true
            }
            SearchField::Score | SearchField::Budget => false,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !accepts_amount_char(ch) && ch != '-' {
            return false;
        }
        match self.active {
            SearchField::Score => self.score.push(ch),
            SearchField::Budget => self.budget.push(ch),
            _ => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SearchField::Score => {
                self.score.pop();
            }
            SearchField::Budget => {
                self.budget.pop();
            }
            _ => {}
        }
    }

    /// Reset score, budget, field and category. The exam choice is kept.
    pub(crate) fn clear(&mut self) {
        self.score.clear();
        self.budget.clear();
        self.field = Field::default();
        self.category = Category::default();
        self.active = SearchField::Score;
    }

    /// Every problem with the current input, in display order.
    pub(crate) fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.selected_exam().is_none() {
            errors.push("Please select an exam".to_string());
        }

        if self.score.trim().is_empty() {
            errors.push("Score is required".to_string());
        } else if let Err(err) = parse_non_negative(&self.score, "Score") {
            errors.push(err.to_string());
        }

        if !self.budget.trim().is_empty() {
            if let Err(err) = parse_non_negative(&self.budget, "Budget") {
                errors.push(err.to_string());
            }
        }

        errors
    }

    /// Typed query, or the full list of validation messages.
    pub(crate) fn to_query(&self) -> Result<RecommendationQuery, Vec<String>> {
        let errors = self.validation_errors();
        if !errors.is_empty() {
            return Err(errors);
        }

        let exam = self
            .selected_exam()
            .map(str::to_string)
            .ok_or_else(|| vec!["Please select an exam".to_string()])?;
        let score = parse_non_negative(&self.score, "Score").map_err(|err| vec![err.to_string()])?;
        // A zero budget means no budget, same as leaving the field empty.
        let budget = if self.budget.trim().is_empty() {
            None
        } else {
            let budget =
                parse_non_negative(&self.budget, "Budget").map_err(|err| vec![err.to_string()])?;
            (budget > 0.0).then_some(budget)
        };

        Ok(RecommendationQuery {
            exam,
            field: self.field,
            category: self.category,
            score,
            budget,
        })
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        SearchField::ORDER
            .iter()
            .map(|field| {
                let active = self.active == *field;
                match field {
                    SearchField::Exam => form_line(
                        field.label(),
                        self.selected_exam().unwrap_or(""),
                        "<no exams available>",
                        active,
                        true,
                    ),
                    SearchField::Field => {
                        form_line(field.label(), self.field.as_str(), "", active, true)
                    }
                    SearchField::Category => {
                        form_line(field.label(), self.category.as_str(), "", active, true)
                    }
                    SearchField::Score => {
                        form_line(field.label(), &self.score, "<required>", active, false)
                    }
                    SearchField::Budget => {
                        form_line(field.label(), &self.budget, "<optional>", active, false)
                    }
                }
            })
            .collect()
    }

    pub(crate) fn cursor_offset(&self) -> Option<u16> {
        let value_len = match self.active {
            SearchField::Score => self.score.chars().count(),
            SearchField::Budget => self.budget.chars().count(),
            _ => return None,
        };
        Some((self.active.label().chars().count() + 2 + value_len) as u16)
    }
}

/// Masked password entry for the administrator login page.
#[derive(Clone, Debug, Default)]
pub(crate) struct PasswordInput {
    pub(crate) value: String,
    pub(crate) visible: bool,
}

impl PasswordInput {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    pub(crate) fn clear(&mut self) {
        self.value.clear();
    }

    pub(crate) fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub(crate) fn verify(&self) -> bool {
        check_password(&self.value)
    }

    /// Text as it should appear on screen.
    pub(crate) fn display(&self) -> String {
        if self.visible {
            self.value.clone()
        } else {
            "•".repeat(self.value.chars().count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exams() -> Vec<String> {
        vec!["BITSAT".into(), "JEE Main".into(), "NEET".into()]
    }

    fn type_into(form: &mut CollegeForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn college_form_requires_details() {
        let mut form = CollegeForm::new(exams());
        type_into(&mut form, "IIT Madras");
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Please fill all college details.");
    }

    #[test]
    fn college_form_parses_cutoffs_for_selected_exam() {
        let mut form = CollegeForm::new(exams());
        type_into(&mut form, "IIT Madras");
        form.next_field();
        type_into(&mut form, "Chennai");
        form.next_field();
        assert!(form.cycle_option(1));
        form.next_field();
        type_into(&mut form, "2x00000");
        form.next_field();
        form.cycle_option(2);
        form.next_field();
        type_into(&mut form, "91.5");
        form.next_field();
        form.next_field();
        type_into(&mut form, "70");

        let (details, cutoffs) = form.parse_inputs().unwrap();
        assert_eq!(details.name, "IIT Madras");
        assert_eq!(details.field, Field::Medicine);
        // Letters are rejected at input time.
        assert_eq!(details.tuition_fee, 200000.0);
        let cutoffs = cutoffs.unwrap();
        assert_eq!(cutoffs.exam, "JEE Main");
        let entries: Vec<_> = cutoffs.entries().collect();
        assert_eq!(entries, vec![(Category::General, 91.5), (Category::Sc, 70.0)]);
    }

    #[test]
    fn college_form_rejects_malformed_numbers() {
        let mut form = CollegeForm::new(exams());
        form.name = "A".into();
        form.location = "B".into();
        form.fee = "1.2.3".into();
        assert_eq!(
            form.parse_inputs().unwrap_err().to_string(),
            "Please enter valid numbers for fee and cutoff scores."
        );

        form.fee = "100".into();
        form.exam = Some(0);
        form.cutoffs[Category::Obc.index()] = "..".into();
        assert!(form.parse_inputs().is_err());

        form.exam = None;
        let (_, cutoffs) = form.parse_inputs().unwrap();
        assert!(cutoffs.is_none());
    }

    #[test]
    fn editing_refills_scores_when_exam_changes() {
        let college = College {
            id: 7,
            name: "VIT".into(),
            location: "Vellore".into(),
            field: Field::Engineering,
            tuition_fee: 198000.0,
        };
        let existing = vec![
            Cutoff {
                college_id: 7,
                exam: "JEE Main".into(),
                category: Category::General,
                score: 80.0,
            },
            Cutoff {
                college_id: 7,
                exam: "NEET".into(),
                category: Category::St,
                score: 410.5,
            },
        ];
        let mut form = CollegeForm::from_college(&college, exams(), existing);
        assert_eq!(form.fee, "198000");
        assert_eq!(form.selected_exam(), Some("JEE Main"));
        assert_eq!(form.cutoffs[Category::General.index()], "80");

        form.active = CollegeField::Exam;
        form.cycle_option(1);
        assert_eq!(form.selected_exam(), Some("NEET"));
        assert_eq!(form.cutoffs[Category::General.index()], "");
        assert_eq!(form.cutoffs[Category::St.index()], "410.5");

        form.cycle_option(1);
        assert_eq!(form.selected_exam(), None);
        assert!(form.cutoffs.iter().all(String::is_empty));
    }

    #[test]
    fn tab_order_wraps() {
        let mut form = CollegeForm::new(exams());
        form.previous_field();
        assert_eq!(form.active, CollegeField::Cutoff(Category::St));
        form.next_field();
        assert_eq!(form.active, CollegeField::Name);
        assert_eq!(CollegeField::Cutoff(Category::General).row(), 6);
    }

    #[test]
    fn search_form_collects_every_error() {
        let mut form = SearchForm::new(Vec::new());
        form.budget = "-5".into();
        assert_eq!(
            form.validation_errors(),
            vec![
                "Please select an exam",
                "Score is required",
                "Budget cannot be negative",
            ]
        );

        let mut form = SearchForm::new(exams());
        form.score = "abc".into();
        form.budget = "1e".into();
        assert_eq!(
            form.validation_errors(),
            vec!["Score must be a valid number", "Budget must be a valid number"]
        );
        assert!(form.to_query().is_err());
    }

    #[test]
    fn search_form_builds_query() {
        let mut form = SearchForm::new(exams());
        form.active = SearchField::Exam;
        form.cycle_option(-1);
        form.active = SearchField::Category;
        form.cycle_option(1);
        form.active = SearchField::Score;
        for ch in "97.25".chars() {
            assert!(form.push_char(ch));
        }
        assert!(!form.push_char('x'));

        let query = form.to_query().unwrap();
        assert_eq!(query.exam, "NEET");
        assert_eq!(query.category, Category::Obc);
        assert_eq!(query.field, Field::Engineering);
        assert_eq!(query.score, 97.25);
        assert_eq!(query.budget, None);

        form.budget = "0".into();
        assert_eq!(form.to_query().unwrap().budget, None);
        form.budget = "0.00".into();
        assert_eq!(form.to_query().unwrap().budget, None);
        form.budget = "150000".into();
        assert_eq!(form.to_query().unwrap().budget, Some(150000.0));

        form.clear();
        assert!(form.score.is_empty());
        assert_eq!(form.selected_exam(), Some("NEET"));
        assert_eq!(form.category, Category::General);
    }

    #[test]
    fn password_input_masks_and_verifies() {
        let mut input = PasswordInput::default();
        for ch in "admin12".chars() {
            input.push_char(ch);
        }
        assert_eq!(input.display(), "•••••••");
        assert!(!input.verify());
        input.push_char('3');
        assert!(input.verify());
        input.toggle_visibility();
        assert_eq!(input.display(), "admin123");
        input.clear();
        assert!(input.value.is_empty());
    }
}
