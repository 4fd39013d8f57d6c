use crate::{
    draft::{DraftHandle, FormStep, QuizDraft},
    error::DraftError,
    quiz::{Id, OptionLabel, Quiz},
    wizard::{Outcome, Turn, Wizard, WizardState, GREETING},
};

#[derive(Debug, Clone)]
pub struct AuthoringSession {
    draft: DraftHandle,
    wizard: Wizard,
    step: FormStep,
    /// Index of the stored question loaded into the pending slot.
    editing: Option<usize>,
    quiz_id: Option<Id>,
}

impl Default for AuthoringSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthoringSession {
    pub fn new() -> Self {
        Self {
            draft: DraftHandle::default(),
            wizard: Wizard::new(),
            step: FormStep::Details,
            editing: None,
            quiz_id: None,
        }
    }

    pub fn editing(quiz: &Quiz) -> Self {
        Self {
            draft: DraftHandle::new(QuizDraft::from_quiz(quiz)),
            wizard: Wizard::at(WizardState::Idle),
            step: FormStep::Questions,
            editing: None,
            quiz_id: Some(quiz.id().clone()),
        }
    }

    pub fn greeting(&self) -> &'static str {
        if self.quiz_id.is_some() {
            "Editing your quiz. Use the form commands or say 'add question' to add more."
        } else {
            GREETING
        }
    }

    pub fn draft(&self) -> &DraftHandle {
        &self.draft
    }

    pub fn snapshot(&self) -> QuizDraft {
        self.draft.snapshot()
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn wizard_state(&self) -> WizardState {
        self.wizard.state()
    }

    pub fn quiz_id(&self) -> Option<&Id> {
        self.quiz_id.as_ref()
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing
    }

    pub fn chat(&mut self, input: &str) -> Turn {
        let turn = self.wizard.handle_editing(&self.draft, self.editing, input);
        if let Outcome::Restarted | Outcome::QuestionAdded(_) = turn.outcome {
            self.editing = None;
        }
        if let Some(step) = turn.step {
            self.step = step;
        }
        turn
    }

    pub fn set_title(&self, title: &str) {
        self.draft.update(|d| d.title = title.trim().to_owned());
    }

    pub fn set_description(&self, description: &str) {
        self.draft.update(|d| d.description = description.trim().to_owned());
    }

    pub fn set_question_text(&self, text: &str) {
        self.draft.update(|d| d.pending.text = text.trim().to_owned());
    }

    pub fn set_option(&self, label: OptionLabel, text: &str) {
        self.draft.update(|d| d.pending.set_option(label, text.trim()));
    }

    pub fn clear_option(&self, label: OptionLabel) {
        self.draft.update(|d| d.pending.set_option(label, ""));
    }

    pub fn mark_correct(&self, label: OptionLabel) {
        self.draft.update(|d| d.pending.answer = Some(label));
    }

    pub fn set_explanation(&self, text: &str) {
        self.draft.update(|d| d.pending.explanation = text.trim().to_owned());
    }

    /// Returns the new value of the flag.
    pub fn toggle_required(&self) -> bool {
        self.draft.update(|d| {
            d.pending.required = !d.pending.required;
            d.pending.required
        })
    }

    /// Stores the pending question, replacing the one being edited if any.
    /// Returns the 0-based index of the stored question.
    pub fn add_question(&mut self) -> Result<usize, DraftError> {
        let editing = self.editing;
        let index = self.draft.try_update(|d| d.commit_pending(editing))?;
        self.editing = None;
        Ok(index)
    }

    /// Loads a stored question (1-based, as displayed) into the form.
    /// Refused while the wizard holds a half-built question in the pending slot.
    pub fn start_edit(&mut self, number: usize) -> Result<(), DraftError> {
        let index = number.checked_sub(1).ok_or(DraftError::NoSuchQuestion(number))?;
        let capturing = matches!(
            self.wizard.state(),
            WizardState::GetQuestionText | WizardState::GetOption(_) | WizardState::GetAnswer
        );
        if capturing && self.editing.is_none() && !self.draft.read(|d| d.pending.is_blank()) {
            return Err(DraftError::QuestionInProgress);
        }
        self.draft.try_update(|d| d.load_for_edit(index))?;
        self.editing = Some(index);
        self.step = FormStep::Questions;
        Ok(())
    }

    /// Deletes a stored question (1-based).
    pub fn delete_question(&mut self, number: usize) -> Result<(), DraftError> {
        let index = number.checked_sub(1).ok_or(DraftError::NoSuchQuestion(number))?;
        self.draft.try_update(|d| d.remove_question(index))?;
        self.editing = match self.editing {
            Some(editing) if editing == index => None,
            Some(editing) if editing > index => Some(editing - 1),
            other => other,
        };
        Ok(())
    }

    pub fn go_to(&mut self, step: FormStep) -> Result<FormStep, DraftError> {
        if step == FormStep::Review && self.draft.read(|d| d.questions.is_empty()) {
            return Err(DraftError::NoQuestions);
        }
        self.step = step;
        Ok(step)
    }

    pub fn mark_saved(&mut self, id: Id) {
        self.quiz_id = Some(id);
        self.step = FormStep::Saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Question;

    #[test]
    fn wizard_step_changes_reach_the_form() {
        let mut session = AuthoringSession::new();
        assert_eq!(session.step(), FormStep::Details);
        session.chat("Capitals Quiz");
        session.chat("Geo trivia");
        assert_eq!(session.step(), FormStep::Questions);
    }

    #[test]
    fn form_and_wizard_share_one_draft() {
        let mut session = AuthoringSession::new();
        session.chat("Capitals Quiz");

        session.set_title("Capitals of Europe");
        session.chat("Geo trivia");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.title, "Capitals of Europe");
        assert_eq!(snapshot.description, "Geo trivia");
    }

    #[test]
    fn manual_question_needs_text_and_answer() {
        let mut session = AuthoringSession::new();
        session.set_question_text("What is 2 + 2?");
        assert_eq!(session.add_question(), Err(DraftError::MissingCorrectOption));

        session.set_option(OptionLabel::A, "3");
        session.set_option(OptionLabel::B, "4");
        session.mark_correct(OptionLabel::B);
        assert_eq!(session.add_question(), Ok(0));

        let question = &session.snapshot().questions[0];
        assert_eq!(question.options, ["3", "4", "", ""]);
        assert_eq!(question.answer, Some(OptionLabel::B));
    }

    #[test]
    fn edit_then_add_replaces_and_clears_edit_mode() {
        let mut session = AuthoringSession::new();
        for text in ["one", "two"] {
            session.set_question_text(text);
            session.mark_correct(OptionLabel::A);
            session.add_question().unwrap();
        }

        session.start_edit(2).unwrap();
        assert_eq!(session.editing_index(), Some(1));
        assert_eq!(session.snapshot().pending.text, "two");

        session.set_question_text("two, revised");
        assert_eq!(session.add_question(), Ok(1));
        assert_eq!(session.editing_index(), None);
        assert_eq!(session.snapshot().questions.len(), 2);
    }

    #[test]
    fn deleting_shifts_the_edited_index() {
        let mut session = AuthoringSession::new();
        for text in ["one", "two", "three"] {
            session.set_question_text(text);
            session.mark_correct(OptionLabel::A);
            session.add_question().unwrap();
        }
        session.start_edit(3).unwrap();
        session.delete_question(1).unwrap();
        assert_eq!(session.editing_index(), Some(1));

        assert_eq!(session.delete_question(0), Err(DraftError::NoSuchQuestion(0)));
        assert_eq!(session.start_edit(9), Err(DraftError::NoSuchQuestion(9)));
    }

    fn wizard_question(session: &mut AuthoringSession, text: &str) {
        for input in [text, "1", "2", "3", "4", "a"] {
            session.chat(input);
        }
    }

    #[test]
    fn restart_drops_the_edited_index() {
        let mut session = AuthoringSession::new();
        session.chat("Capitals");
        session.chat("Geo");
        wizard_question(&mut session, "Q1");
        session.start_edit(1).unwrap();

        assert_eq!(session.chat("restart").outcome, Outcome::Restarted);
        assert_eq!(session.editing_index(), None);

        session.set_question_text("fresh");
        session.mark_correct(OptionLabel::A);
        assert_eq!(session.add_question(), Ok(0));
        assert_eq!(session.snapshot().questions[0].text, "fresh");
    }

    #[test]
    fn edit_waits_for_the_wizard_question_in_progress() {
        let mut session = AuthoringSession::new();
        session.chat("Capitals");
        session.chat("Geo");
        wizard_question(&mut session, "Q1");
        for input in ["yes", "Q2", "1", "2", "3", "4"] {
            session.chat(input);
        }
        assert_eq!(session.wizard_state(), WizardState::GetAnswer);

        assert_eq!(session.start_edit(1), Err(DraftError::QuestionInProgress));
        assert_eq!(session.editing_index(), None);

        assert_eq!(session.chat("B").outcome, Outcome::QuestionAdded(1));
        let texts: Vec<_> = session
            .snapshot()
            .questions
            .into_iter()
            .map(|q| q.text)
            .collect();
        assert_eq!(texts, ["Q1", "Q2"]);
    }

    #[test]
    fn wizard_answer_replaces_the_edited_question() {
        let mut session = AuthoringSession::new();
        session.chat("Capitals");
        session.chat("Geo");
        wizard_question(&mut session, "Q1");
        session.chat("yes");

        session.start_edit(1).unwrap();
        wizard_question(&mut session, "Q1, revised");

        assert_eq!(session.editing_index(), None);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.questions.len(), 1);
        assert_eq!(snapshot.questions[0].text, "Q1, revised");
    }

    #[test]
    fn review_requires_a_question() {
        let mut session = AuthoringSession::new();
        assert_eq!(session.go_to(FormStep::Review), Err(DraftError::NoQuestions));
        assert_eq!(session.step(), FormStep::Details);

        session.set_question_text("q");
        session.mark_correct(OptionLabel::C);
        session.add_question().unwrap();
        assert_eq!(session.go_to(FormStep::Review), Ok(FormStep::Review));
    }

    #[test]
    fn toggling_required() {
        let session = AuthoringSession::new();
        assert!(!session.toggle_required());
        assert!(session.toggle_required());
    }

    #[test]
    fn editing_an_existing_quiz_seeds_the_draft() {
        let question = Question::new(
            Id::from("q1"),
            "Largest ocean?".into(),
            ["Pacific".into(), "Atlantic".into(), "Indian".into(), "Arctic".into()],
            Some(OptionLabel::A),
            String::new(),
        );
        let quiz = Quiz::new(
            Id::from("42"),
            "Oceans".into(),
            "Water".into(),
            vec![question],
            true,
            Some(Id::from("7")),
        );

        let mut session = AuthoringSession::editing(&quiz);
        assert_eq!(session.quiz_id(), Some(&Id::from("42")));
        assert_eq!(session.step(), FormStep::Questions);
        assert_eq!(session.snapshot().questions[0].answer, Some(OptionLabel::A));

        session.chat("add question");
        assert_eq!(session.wizard_state(), WizardState::GetQuestionText);
    }
}
