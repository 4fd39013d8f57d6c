use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::DraftError;

/// Identifier issued by the remote API. Depending on the backend it arrives
/// as a JSON number or a string, so it is kept in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct Id(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for Id {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => Id(text),
            RawId::Number(number) => Id(number.to_string()),
        }
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_owned())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id(value)
    }
}

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional label of one of the four options of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The label after this one, `None` after `D`.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = DraftError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            _ => Err(DraftError::InvalidLabel(s.trim().to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: Id,
    text: String,
    options: [String; 4],
    correct: Option<OptionLabel>,
    explanation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: Id,
    title: String,
    description: String,
    questions: Vec<Question>,
    published: bool,
    owner: Option<Id>,
    time_limit: Option<u32>,
}

/// Score returned by the scoring collaborator for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub score: u32,
    pub total: u32,
}

impl Score {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.score) * 100.0 / f64::from(self.total)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.score, self.total)
    }
}

/// A scored attempt as stored by the remote API. The client only displays it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub id: Option<Id>,
    pub quiz_id: Id,
    pub quiz_title: Option<String>,
    pub quiz_domain: Option<String>,
    pub user_id: Option<Id>,
    pub score: Score,
    pub submitted_at: Option<NaiveDateTime>,
}

impl fmt::Display for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        writeln!(
            f,
            "\nQuestions: {}{}",
            self.questions.len(),
            if self.published { " · published" } else { "" }
        )?;
        for (i, question) in self.questions.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, question)?;
        }
        Ok(())
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)?;
        for label in OptionLabel::ALL {
            let mark = if self.correct == Some(label) { " ✔" } else { "" };
            writeln!(f, "   {}. {}{}", label, self.option(label), mark)?;
        }
        Ok(())
    }
}

impl Quiz {
    pub fn new(
        id: Id,
        title: String,
        description: String,
        questions: Vec<Question>,
        published: bool,
        owner: Option<Id>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            questions,
            published,
            owner,
            time_limit: None,
        }
    }

    /// Time limit in minutes.
    pub fn with_time_limit(mut self, minutes: Option<u32>) -> Self {
        self.time_limit = minutes.filter(|m| *m > 0);
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    pub fn owner(&self) -> Option<&Id> {
        self.owner.as_ref()
    }

    pub fn time_limit(&self) -> Option<u32> {
        self.time_limit
    }
}

impl Question {
    pub fn new(
        id: Id,
        text: String,
        options: [String; 4],
        correct: Option<OptionLabel>,
        explanation: String,
    ) -> Self {
        Self {
            id,
            text,
            options,
            correct,
            explanation,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; 4] {
        &self.options
    }

    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn correct(&self) -> Option<OptionLabel> {
        self.correct
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}
