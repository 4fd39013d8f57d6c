use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use uuid::Uuid;

use crate::{
    error::FlowError,
    quiz::{Id, OptionLabel, Question, Quiz, Score},
};

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    quiz: Quiz,
    attempted: bool,
}

impl CatalogEntry {
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Attempted quizzes are listed but cannot be started again.
    pub fn is_attempted(&self) -> bool {
        self.attempted
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(quizzes: Vec<Quiz>, attempted: &HashSet<Id>) -> Self {
        let entries = quizzes
            .into_iter()
            .map(|quiz| CatalogEntry {
                attempted: attempted.contains(quiz.id()),
                quiz,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u32),
    Expired,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn tick(&mut self) -> Tick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining)
        }
    }
}

pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Claimed by whichever path submits first: the participant or the timer.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard(Arc<AtomicBool>);

impl SubmitGuard {
    pub fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub attempt_id: Uuid,
    pub quiz_id: Id,
    pub answers: BTreeMap<Id, String>,
}

#[derive(Debug, Clone)]
pub struct Attempt {
    id: Uuid,
    quiz: Quiz,
    current: usize,
    answers: HashMap<Id, OptionLabel>,
    time_limit: Option<u32>,
    guard: SubmitGuard,
}

impl Attempt {
    /// `time_limit` is in seconds; `None` means untimed.
    pub fn new(quiz: Quiz, time_limit: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz,
            current: 0,
            answers: HashMap::new(),
            time_limit,
            guard: SubmitGuard::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn time_limit(&self) -> Option<u32> {
        self.time_limit
    }

    pub fn guard(&self) -> &SubmitGuard {
        &self.guard
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions().len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions().get(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.question_count()
    }

    pub fn next(&mut self) {
        if self.current + 1 < self.question_count() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn choose(&mut self, label: OptionLabel) -> Result<(), FlowError> {
        let id = self
            .current_question()
            .map(|question| question.id().clone())
            .ok_or(FlowError::NoQuestions)?;
        self.answers.insert(id, label);
        Ok(())
    }

    pub fn chosen(&self, question: &Id) -> Option<OptionLabel> {
        self.answers.get(question).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.quiz
            .questions()
            .iter()
            .filter(|question| self.answers.contains_key(question.id()))
            .count()
    }

    /// One entry per question; unanswered questions map to an empty string.
    pub fn answer_map(&self) -> BTreeMap<Id, String> {
        self.quiz
            .questions()
            .iter()
            .map(|question| {
                let answer = self
                    .chosen(question.id())
                    .map(|label| label.as_str().to_owned())
                    .unwrap_or_default();
                (question.id().clone(), answer)
            })
            .collect()
    }

    /// Claims the submit guard and builds the payload. A second call fails
    /// until [`Attempt::submission_failed`] releases the guard.
    pub fn begin_submission(&self) -> Result<Submission, FlowError> {
        if self.question_count() == 0 {
            return Err(FlowError::NoQuestions);
        }
        if !self.guard.try_claim() {
            return Err(FlowError::AlreadySubmitting);
        }
        Ok(Submission {
            attempt_id: self.id,
            quiz_id: self.quiz.id().clone(),
            answers: self.answer_map(),
        })
    }

    pub fn submission_failed(&self) {
        self.guard.release();
    }
}

#[derive(Debug, Clone, Default)]
pub enum TakingFlow {
    #[default]
    Start,
    Browsing(Catalog),
    Active(Attempt),
    Completed { quiz_id: Id, score: Score },
}

impl TakingFlow {
    pub fn browse(&mut self, catalog: Catalog) -> Result<(), FlowError> {
        match self {
            TakingFlow::Active(_) => Err(FlowError::InvalidTransition),
            _ => {
                *self = TakingFlow::Browsing(catalog);
                Ok(())
            }
        }
    }

    pub fn select(&mut self, index: usize, time_limit: Option<u32>) -> Result<&Attempt, FlowError> {
        let TakingFlow::Browsing(catalog) = self else {
            return Err(FlowError::InvalidTransition);
        };
        let entry = catalog.get(index).ok_or(FlowError::UnknownQuiz)?;
        if entry.is_attempted() {
            return Err(FlowError::AlreadyAttempted);
        }
        let quiz = entry.quiz().clone();
        let limit = quiz
            .time_limit()
            .map(|minutes| minutes.saturating_mul(60))
            .or(time_limit);

        *self = TakingFlow::Active(Attempt::new(quiz, limit));
        match self {
            TakingFlow::Active(attempt) => Ok(attempt),
            _ => unreachable!(),
        }
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        match self {
            TakingFlow::Active(attempt) => Some(attempt),
            _ => None,
        }
    }

    pub fn attempt_mut(&mut self) -> Option<&mut Attempt> {
        match self {
            TakingFlow::Active(attempt) => Some(attempt),
            _ => None,
        }
    }

    pub fn complete(&mut self, score: Score) -> Result<(), FlowError> {
        let TakingFlow::Active(attempt) = self else {
            return Err(FlowError::InvalidTransition);
        };
        let quiz_id = attempt.quiz().id().clone();
        *self = TakingFlow::Completed { quiz_id, score };
        Ok(())
    }

    pub fn abandon(&mut self) {
        *self = TakingFlow::Start;
    }
}
