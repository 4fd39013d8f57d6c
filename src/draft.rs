//! The one draft the authoring wizard and the manual form both write to.

use std::{fmt, sync::Arc};

use tokio::sync::watch;

use crate::{
    error::DraftError,
    quiz::{OptionLabel, Quiz},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormStep {
    Details = 1,
    Questions = 2,
    Review = 3,
    Saved = 4,
}

impl FormStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(FormStep::Details),
            2 => Some(FormStep::Questions),
            3 => Some(FormStep::Review),
            4 => Some(FormStep::Saved),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FormStep::Details => "Quiz details",
            FormStep::Questions => "Questions",
            FormStep::Review => "Review & save",
            FormStep::Saved => "Saved",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: [String; 4],
    pub answer: Option<OptionLabel>,
    pub explanation: String,
    /// Captured for the form, never enforced.
    pub required: bool,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            options: Default::default(),
            answer: None,
            explanation: String::new(),
            required: true,
        }
    }
}

impl QuestionDraft {
    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn set_option(&mut self, label: OptionLabel, text: impl Into<String>) {
        self.options[label.index()] = text.into();
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty() && self.options.iter().all(String::is_empty) && self.answer.is_none()
    }

    fn validate(&self) -> Result<(), DraftError> {
        if self.text.trim().is_empty() {
            return Err(DraftError::MissingQuestionText);
        }
        if self.answer.is_none() {
            return Err(DraftError::MissingCorrectOption);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionDraft>,
    pub pending: QuestionDraft,
}

impl QuizDraft {
    pub fn from_quiz(quiz: &Quiz) -> Self {
        let questions = quiz
            .questions()
            .iter()
            .map(|question| QuestionDraft {
                text: question.text().to_owned(),
                options: question.options().clone(),
                answer: question.correct(),
                explanation: question.explanation().to_owned(),
                required: true,
            })
            .collect();

        Self {
            title: quiz.title().to_owned(),
            description: quiz.description().to_owned(),
            questions,
            pending: QuestionDraft::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Validates the pending question and stores it, either replacing the
    /// question being edited or appending a new one.
    pub fn commit_pending(&mut self, editing: Option<usize>) -> Result<usize, DraftError> {
        self.pending.validate()?;
        let question = std::mem::take(&mut self.pending);
        match editing {
            Some(index) if index < self.questions.len() => {
                self.questions[index] = question;
                Ok(index)
            }
            Some(index) => {
                self.pending = question;
                Err(DraftError::NoSuchQuestion(index + 1))
            }
            None => {
                self.questions.push(question);
                Ok(self.questions.len() - 1)
            }
        }
    }

    pub fn load_for_edit(&mut self, index: usize) -> Result<(), DraftError> {
        let question = self
            .questions
            .get(index)
            .cloned()
            .ok_or(DraftError::NoSuchQuestion(index + 1))?;
        self.pending = question;
        Ok(())
    }

    pub fn remove_question(&mut self, index: usize) -> Result<QuestionDraft, DraftError> {
        if index >= self.questions.len() {
            return Err(DraftError::NoSuchQuestion(index + 1));
        }
        Ok(self.questions.remove(index))
    }

    pub fn validate_for_save(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        Ok(())
    }
}

impl fmt::Display for QuizDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.title.is_empty() { "(untitled)" } else { &self.title };
        writeln!(f, "Title: {}", title)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "\nQuestions ({}):", self.questions.len())?;
        for (i, question) in self.questions.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, question.text)?;
            for label in OptionLabel::ALL {
                let mark = if question.answer == Some(label) { " ✔" } else { "" };
                writeln!(f, "   {}. {}{}", label, question.option(label), mark)?;
            }
        }
        if !self.pending.is_blank() {
            writeln!(f, "\nIn progress: {}", self.pending.text)?;
            for label in OptionLabel::ALL {
                let mark = if self.pending.answer == Some(label) { " ✔" } else { "" };
                writeln!(f, "   {}. {}{}", label, self.pending.option(label), mark)?;
            }
        }
        Ok(())
    }
}

/// Owner handle of the single draft. Cloning the handle shares the draft.
#[derive(Debug, Clone)]
pub struct DraftHandle {
    tx: Arc<watch::Sender<QuizDraft>>,
}

impl Default for DraftHandle {
    fn default() -> Self {
        Self::new(QuizDraft::default())
    }
}

impl DraftHandle {
    pub fn new(draft: QuizDraft) -> Self {
        let (tx, _) = watch::channel(draft);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<QuizDraft> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> QuizDraft {
        self.tx.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&QuizDraft) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut QuizDraft) -> R) -> R {
        let mut out = None;
        self.tx.send_modify(|draft| out = Some(f(draft)));
        out.expect("send_modify runs the closure exactly once")
    }

    /// Applies a fallible edit. Subscribers are only notified on success.
    pub fn try_update<R, E>(
        &self,
        f: impl FnOnce(&mut QuizDraft) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut out = None;
        self.tx.send_if_modified(|draft| {
            let result = f(draft);
            let modified = result.is_ok();
            out = Some(result);
            modified
        });
        out.expect("send_if_modified runs the closure exactly once")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_pending(draft: &mut QuizDraft, text: &str) {
        draft.pending.text = text.into();
        for (label, option) in OptionLabel::ALL.into_iter().zip(["1", "2", "3", "4"]) {
            draft.pending.set_option(label, option);
        }
        draft.pending.answer = Some(OptionLabel::B);
    }

    #[test]
    fn commit_requires_text_and_answer() {
        let mut draft = QuizDraft::default();
        assert_eq!(draft.commit_pending(None), Err(DraftError::MissingQuestionText));

        draft.pending.text = "2 + 2?".into();
        assert_eq!(draft.commit_pending(None), Err(DraftError::MissingCorrectOption));
        assert_eq!(draft.pending.text, "2 + 2?");
        assert!(draft.questions.is_empty());

        draft.pending.answer = Some(OptionLabel::C);
        assert_eq!(draft.commit_pending(None), Ok(0));
        assert!(draft.pending.is_blank());
        assert!(draft.pending.required);
    }

    #[test]
    fn editing_replaces_in_place() {
        let mut draft = QuizDraft::default();
        complete_pending(&mut draft, "first");
        draft.commit_pending(None).unwrap();
        complete_pending(&mut draft, "second");
        draft.commit_pending(None).unwrap();

        draft.load_for_edit(0).unwrap();
        draft.pending.text = "first, revised".into();
        assert_eq!(draft.commit_pending(Some(0)), Ok(0));

        let texts: Vec<_> = draft.questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["first, revised", "second"]);
    }

    #[test]
    fn out_of_range_indices_are_refused() {
        let mut draft = QuizDraft::default();
        assert_eq!(draft.load_for_edit(0), Err(DraftError::NoSuchQuestion(1)));
        assert_eq!(draft.remove_question(3), Err(DraftError::NoSuchQuestion(4)));

        complete_pending(&mut draft, "orphan edit");
        assert_eq!(draft.commit_pending(Some(5)), Err(DraftError::NoSuchQuestion(6)));
        assert_eq!(draft.pending.text, "orphan edit");
    }

    #[test]
    fn save_needs_a_title() {
        let mut draft = QuizDraft::default();
        assert_eq!(draft.validate_for_save(), Err(DraftError::MissingTitle));
        draft.title = "  ".into();
        assert_eq!(draft.validate_for_save(), Err(DraftError::MissingTitle));
        draft.title = "Capitals".into();
        assert_eq!(draft.validate_for_save(), Ok(()));
    }

    #[test]
    fn writes_through_one_handle_are_seen_by_clones_and_subscribers() {
        let handle = DraftHandle::default();
        let other_writer = handle.clone();
        let mut observer = handle.subscribe();

        other_writer.update(|draft| draft.title = "Capitals Quiz".into());

        assert!(observer.has_changed().unwrap());
        assert_eq!(observer.borrow_and_update().title, "Capitals Quiz");
        assert_eq!(handle.read(|draft| draft.title.clone()), "Capitals Quiz");
    }

    #[tokio::test]
    async fn waiting_reader_wakes_on_form_edit() {
        let handle = DraftHandle::default();
        let mut observer = handle.subscribe();

        let reader = tokio::spawn(async move {
            observer.changed().await.unwrap();
            let draft = observer.borrow_and_update();
            (draft.title.clone(), draft.pending.answer)
        });

        handle.update(|draft| {
            draft.title = "Rivers".into();
            draft.pending.answer = Some(OptionLabel::D);
        });

        assert_eq!(reader.await.unwrap(), ("Rivers".to_owned(), Some(OptionLabel::D)));
    }

    #[test]
    fn failed_edits_do_not_notify() {
        let handle = DraftHandle::default();
        let mut observer = handle.subscribe();

        let result = handle.try_update(|draft| draft.commit_pending(None));
        assert_eq!(result, Err(DraftError::MissingQuestionText));
        assert!(!observer.has_changed().unwrap());
    }
}
