//! Domain models that mirror the SQLite schema and get passed between the data
//! layer and the three terminal front-ends. They stay plain data holders; the
//! only behaviour here is converting the closed `Field`/`Category` sets to and
//! from the text stored in the database.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Typed failures raised while turning user or database text into domain
/// values.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("{label} must be a valid number")]
    NotANumber { label: &'static str },
    #[error("{label} cannot be negative")]
    Negative { label: &'static str },
}

/// Parse a user-entered amount. Blank input is the caller's concern; here we
/// only care that the text is a finite number.
pub fn parse_amount(raw: &str, label: &'static str) -> Result<f64, InputError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| InputError::NotANumber { label })?;
    if !value.is_finite() {
        return Err(InputError::NotANumber { label });
    }
    Ok(value)
}

/// Like [`parse_amount`] but rejects values below zero.
pub fn parse_non_negative(raw: &str, label: &'static str) -> Result<f64, InputError> {
    let value = parse_amount(raw, label)?;
    if value < 0.0 {
        Err(InputError::Negative { label })
    } else {
        Ok(value)
    }
}

/// Academic stream a college admits students into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Engineering,
    Medicine,
    Architecture,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Engineering, Field::Medicine, Field::Architecture];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Engineering => "Engineering",
            Field::Medicine => "Medicine",
            Field::Architecture => "Architecture",
        }
    }

    /// Step through [`Field::ALL`], wrapping at both ends. Used by selector
    /// widgets that cycle with the arrow keys.
    pub fn cycle(self, offset: isize) -> Self {
        cycle_in(&Self::ALL, self, offset)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InputError::UnknownField(s.to_string()))
    }
}

/// Admissions reservation class. Cutoffs are recorded per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    General,
    Obc,
    Sc,
    St,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::General, Category::Obc, Category::Sc, Category::St];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Obc => "OBC",
            Category::Sc => "SC",
            Category::St => "ST",
        }
    }

    /// Position inside [`Category::ALL`]; forms keep one input per category in
    /// this order.
    pub fn index(self) -> usize {
        match self {
            Category::General => 0,
            Category::Obc => 1,
            Category::Sc => 2,
            Category::St => 3,
        }
    }

    pub fn cycle(self, offset: isize) -> Self {
        cycle_in(&Self::ALL, self, offset)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InputError::UnknownCategory(s.to_string()))
    }
}

fn cycle_in<T: Copy + PartialEq>(all: &[T], current: T, offset: isize) -> T {
    let len = all.len() as isize;
    let position = all.iter().position(|item| *item == current).unwrap_or(0) as isize;
    all[(position + offset).rem_euclid(len) as usize]
}

#[derive(Debug, Clone, PartialEq)]
/// A college row as shown in the admin list.
pub struct College {
    /// Primary key; edit and delete flows hand it back to the data layer.
    pub id: i64,
    pub name: String,
    pub location: String,
    pub field: Field,
    pub tuition_fee: f64,
}

/// Editable college attributes, shared by the create and update paths.
#[derive(Debug, Clone, PartialEq)]
pub struct CollegeDetails {
    pub name: String,
    pub location: String,
    pub field: Field,
    pub tuition_fee: f64,
}

/// Cutoff scores for one exam, one optional score per category. Categories
/// left as `None` are simply not written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExamCutoffs {
    pub exam: String,
    pub scores: [Option<f64>; 4],
}

impl ExamCutoffs {
    pub fn new(exam: impl Into<String>) -> Self {
        Self {
            exam: exam.into(),
            scores: [None; 4],
        }
    }

    pub fn with(mut self, category: Category, score: f64) -> Self {
        self.scores[category.index()] = Some(score);
        self
    }

    /// Iterate over the categories that actually carry a score.
    pub fn entries(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL
            .into_iter()
            .filter_map(|category| self.scores[category.index()].map(|score| (category, score)))
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One stored cutoff, with the exam resolved to its name.
pub struct Cutoff {
    pub college_id: i64,
    pub exam: String,
    pub category: Category,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// A college a student qualifies for, together with the cutoff that matched.
pub struct Recommendation {
    pub name: String,
    pub location: String,
    pub cutoff_score: f64,
    pub field: Field,
    pub tuition_fee: f64,
}

impl Recommendation {
    /// Case-insensitive substring match on name or location, used by the
    /// recommender's live result filter.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
    }
}

/// Parameters for a recommendation search.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub exam: String,
    pub field: Field,
    pub category: Category,
    pub score: f64,
    pub budget: Option<f64>,
}
