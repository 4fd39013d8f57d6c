pub mod command;

use tracing::debug;

use crate::{
    draft::{DraftHandle, FormStep, QuestionDraft},
    quiz::OptionLabel,
};

pub use command::{Command, Field};

pub const GREETING: &str =
    "Hi! I'm your quiz assistant and I can help you build this quiz. What is the title of your quiz?";

const HELP: &str =
    "I'm listening. Say 'add question' to add more, or change existing questions with the form commands (/help).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardState {
    #[default]
    GetTitle,
    GetDescription,
    GetQuestionText,
    GetOption(OptionLabel),
    GetAnswer,
    ConfirmNext,
    /// Authoring finished, waiting for a resume phrase.
    Idle,
}

impl WizardState {
    fn prompt(self) -> String {
        match self {
            WizardState::GetTitle => "What is the title of your quiz?".into(),
            WizardState::GetDescription => "Give me a short description for the quiz.".into(),
            WizardState::GetQuestionText => "What is the question text?".into(),
            WizardState::GetOption(label) => format!("What is option {}?", label),
            WizardState::GetAnswer => "Which option is correct? (A, B, C, or D)".into(),
            WizardState::ConfirmNext => {
                "Do you want to add another question? (Type 'yes' or the next question text, or 'no' to finish)".into()
            }
            WizardState::Idle => HELP.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Advanced,
    Restarted,
    FieldUpdated(Field),
    QuestionAdded(usize),
    Reprompted,
    ReadyForReview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    pub step: Option<FormStep>,
    pub outcome: Outcome,
}

impl Turn {
    fn new(reply: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            reply: reply.into(),
            step: None,
            outcome,
        }
    }

    fn with_step(mut self, step: FormStep) -> Self {
        self.step = Some(step);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Wizard {
    state: WizardState,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(state: WizardState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn handle(&mut self, draft: &DraftHandle, input: &str) -> Turn {
        self.handle_editing(draft, None, input)
    }

    /// Interrupts never change the state. A finished question replaces the
    /// stored one at `editing` instead of being appended.
    pub fn handle_editing(
        &mut self,
        draft: &DraftHandle,
        editing: Option<usize>,
        input: &str,
    ) -> Turn {
        if input.trim().is_empty() {
            return Turn::new(self.state.prompt(), Outcome::Reprompted);
        }

        let command = Command::parse(input);
        debug!(state = ?self.state, ?command, "wizard turn");

        match command {
            Command::Restart => {
                draft.update(|d| d.reset());
                self.state = WizardState::GetTitle;
                Turn::new(
                    "Okay, let's start over. What is the title of your quiz?",
                    Outcome::Restarted,
                )
            }
            Command::SetField(field, value) => {
                let reply = match field {
                    Field::Title => {
                        draft.update(|d| d.title = value.clone());
                        format!("Updated title to: \"{}\"", value)
                    }
                    Field::Description => {
                        draft.update(|d| d.description = value.clone());
                        format!("Updated description to: \"{}\"", value)
                    }
                    Field::Question => {
                        draft.update(|d| d.pending.text = value.clone());
                        format!("Updated question text to: \"{}\". Continue with options?", value)
                    }
                };
                Turn::new(reply, Outcome::FieldUpdated(field))
            }
            command => {
                let (next, turn) = transition(self.state, command, input.trim(), draft, editing);
                self.state = next;
                turn
            }
        }
    }
}

fn transition(
    state: WizardState,
    command: Command,
    text: &str,
    draft: &DraftHandle,
    editing: Option<usize>,
) -> (WizardState, Turn) {
    match (state, command) {
        (WizardState::GetTitle, _) => {
            draft.update(|d| d.title = text.to_owned());
            (
                WizardState::GetDescription,
                Turn::new(
                    "Great! Now, give me a short description for the quiz.",
                    Outcome::Advanced,
                ),
            )
        }
        (WizardState::GetDescription, _) => {
            draft.update(|d| d.description = text.to_owned());
            (
                WizardState::GetQuestionText,
                Turn::new(
                    "Awesome. Let's add the first question. What is the question text?",
                    Outcome::Advanced,
                )
                .with_step(FormStep::Questions),
            )
        }
        (WizardState::GetQuestionText, _) => start_question(text, draft),
        (WizardState::GetOption(label), _) => {
            draft.update(|d| d.pending.set_option(label, text));
            let next = match label.next() {
                Some(next_label) => WizardState::GetOption(next_label),
                None => WizardState::GetAnswer,
            };
            (next, Turn::new(next.prompt(), Outcome::Advanced))
        }
        (WizardState::GetAnswer, _) => match text.parse::<OptionLabel>() {
            Ok(answer) => match draft.try_update(|d| {
                d.pending.answer = Some(answer);
                d.commit_pending(editing)
            }) {
                Ok(index) => (
                    WizardState::ConfirmNext,
                    Turn::new(
                        format!("Question added! {}", WizardState::ConfirmNext.prompt()),
                        Outcome::QuestionAdded(index),
                    ),
                ),
                Err(e) => (
                    WizardState::GetAnswer,
                    Turn::new(format!("Sorry, {}.", e), Outcome::Reprompted),
                ),
            },
            Err(_) => (
                WizardState::GetAnswer,
                Turn::new("Please enter a valid option: A, B, C, or D.", Outcome::Reprompted),
            ),
        },
        (WizardState::ConfirmNext, Command::Confirm(false)) => (
            WizardState::Idle,
            Turn::new(
                "Quiz creation complete! Please review your quiz and /save it.",
                Outcome::ReadyForReview,
            )
            .with_step(FormStep::Review),
        ),
        (WizardState::ConfirmNext, Command::Confirm(true)) => (
            WizardState::GetQuestionText,
            Turn::new("Okay, what is the next question text?", Outcome::Advanced),
        ),
        // Anything else is taken as the next question's text.
        (WizardState::ConfirmNext, _) => start_question(text, draft),
        (WizardState::Idle, Command::AddQuestion) => (
            WizardState::GetQuestionText,
            Turn::new("Okay, what is the question text?", Outcome::Advanced)
                .with_step(FormStep::Questions),
        ),
        (WizardState::Idle, _) => (WizardState::Idle, Turn::new(HELP, Outcome::Reprompted)),
    }
}

fn start_question(text: &str, draft: &DraftHandle) -> (WizardState, Turn) {
    draft.update(|d| {
        d.pending = QuestionDraft {
            text: text.to_owned(),
            ..std::mem::take(&mut d.pending)
        }
    });
    let next = WizardState::GetOption(OptionLabel::A);
    (next, Turn::new(format!("Okay. {}", next.prompt()), Outcome::Advanced))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(wizard: &mut Wizard, draft: &DraftHandle, inputs: &[&str]) -> Vec<Turn> {
        inputs.iter().map(|input| wizard.handle(draft, input)).collect()
    }

    const CAPITALS: &[&str] = &[
        "Capitals Quiz",
        "Geo trivia",
        "What is the capital of France?",
        "Paris",
        "London",
        "Berlin",
        "Madrid",
        "A",
    ];

    #[test]
    fn happy_path_builds_one_question_and_ends_ready_for_review() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();

        let mut inputs = CAPITALS.to_vec();
        inputs.push("no");
        let turns = run(&mut wizard, &draft, &inputs);

        let last = turns.last().unwrap();
        assert_eq!(last.outcome, Outcome::ReadyForReview);
        assert_eq!(last.step, Some(FormStep::Review));
        assert_eq!(wizard.state(), WizardState::Idle);

        let snapshot = draft.snapshot();
        assert_eq!(snapshot.title, "Capitals Quiz");
        assert_eq!(snapshot.description, "Geo trivia");
        assert_eq!(snapshot.questions.len(), 1);
        let question = &snapshot.questions[0];
        assert_eq!(question.text, "What is the capital of France?");
        assert_eq!(question.options, ["Paris", "London", "Berlin", "Madrid"]);
        assert_eq!(question.answer, Some(OptionLabel::A));
        assert!(snapshot.pending.is_blank());
    }

    #[test]
    fn description_moves_view_to_questions_step() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        let turns = run(&mut wizard, &draft, &["Title", "Desc"]);
        assert_eq!(turns[0].step, None);
        assert_eq!(turns[1].step, Some(FormStep::Questions));
        assert_eq!(wizard.state(), WizardState::GetQuestionText);
    }

    #[test]
    fn change_title_keeps_state_everywhere() {
        let prefixes: &[&[&str]] = &[
            &[],
            &["T"],
            &["T", "D"],
            &["T", "D", "Q"],
            &["T", "D", "Q", "1", "2", "3", "4"],
            &["T", "D", "Q", "1", "2", "3", "4", "B"],
        ];

        for prefix in prefixes {
            let draft = DraftHandle::default();
            let mut wizard = Wizard::new();
            run(&mut wizard, &draft, prefix);
            let before_state = wizard.state();
            let before = draft.snapshot();

            let turn = wizard.handle(&draft, "change title to New Name");

            assert_eq!(turn.outcome, Outcome::FieldUpdated(Field::Title));
            assert_eq!(wizard.state(), before_state);
            let after = draft.snapshot();
            assert_eq!(after.title, "New Name");
            assert_eq!(after.description, before.description);
            assert_eq!(after.questions, before.questions);
            assert_eq!(after.pending, before.pending);
        }
    }

    #[test]
    fn change_question_edits_the_pending_question() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, &["T", "D", "Wrong text", "1"]);

        wizard.handle(&draft, "change question to Right text");

        assert_eq!(wizard.state(), WizardState::GetOption(OptionLabel::B));
        let snapshot = draft.snapshot();
        assert_eq!(snapshot.pending.text, "Right text");
        assert_eq!(snapshot.pending.option(OptionLabel::A), "1");
    }

    #[test]
    fn invalid_answer_reprompts_and_lowercase_is_normalized() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, &CAPITALS[..7]);
        assert_eq!(wizard.state(), WizardState::GetAnswer);

        let turn = wizard.handle(&draft, "E");
        assert_eq!(turn.outcome, Outcome::Reprompted);
        assert_eq!(wizard.state(), WizardState::GetAnswer);
        assert!(draft.snapshot().questions.is_empty());

        let turn = wizard.handle(&draft, "a");
        assert_eq!(turn.outcome, Outcome::QuestionAdded(0));
        assert_eq!(wizard.state(), WizardState::ConfirmNext);
        assert_eq!(draft.snapshot().questions[0].answer, Some(OptionLabel::A));
    }

    #[test]
    fn confirm_next_yes_asks_for_the_next_question() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, CAPITALS);

        wizard.handle(&draft, "yes");
        assert_eq!(wizard.state(), WizardState::GetQuestionText);
    }

    #[test]
    fn confirm_next_other_text_is_the_next_question() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, CAPITALS);

        wizard.handle(&draft, "What is the capital of Spain?");
        assert_eq!(wizard.state(), WizardState::GetOption(OptionLabel::A));
        assert_eq!(draft.snapshot().pending.text, "What is the capital of Spain?");
        assert_eq!(draft.snapshot().questions.len(), 1);
    }

    #[test]
    fn restart_clears_everything() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, CAPITALS);
        run(&mut wizard, &draft, &["Next question", "x"]);

        let turn = wizard.handle(&draft, "start over");

        assert_eq!(turn.outcome, Outcome::Restarted);
        assert_eq!(wizard.state(), WizardState::GetTitle);
        assert_eq!(draft.snapshot(), Default::default());
    }

    #[test]
    fn idle_resumes_only_on_add_question() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, CAPITALS);
        wizard.handle(&draft, "done");

        let turn = wizard.handle(&draft, "what now?");
        assert_eq!(turn.outcome, Outcome::Reprompted);
        assert_eq!(wizard.state(), WizardState::Idle);

        let turn = wizard.handle(&draft, "add question");
        assert_eq!(turn.step, Some(FormStep::Questions));
        assert_eq!(wizard.state(), WizardState::GetQuestionText);
    }

    #[test]
    fn blank_input_changes_nothing() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        let turn = wizard.handle(&draft, "   ");
        assert_eq!(turn.outcome, Outcome::Reprompted);
        assert_eq!(wizard.state(), WizardState::GetTitle);
        assert_eq!(draft.snapshot(), Default::default());
    }

    #[test]
    fn finished_question_replaces_the_one_being_edited() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, CAPITALS);
        wizard.handle(&draft, "yes");
        draft.update(|d| d.load_for_edit(0)).unwrap();

        for input in ["Capital of Spain?", "Madrid", "Rome", "Paris", "Lisbon"] {
            wizard.handle_editing(&draft, Some(0), input);
        }
        let turn = wizard.handle_editing(&draft, Some(0), "a");

        assert_eq!(turn.outcome, Outcome::QuestionAdded(0));
        let snapshot = draft.snapshot();
        assert_eq!(snapshot.questions.len(), 1);
        assert_eq!(snapshot.questions[0].text, "Capital of Spain?");
    }

    #[test]
    fn form_edits_are_continued_by_the_wizard() {
        let draft = DraftHandle::default();
        let mut wizard = Wizard::new();
        run(&mut wizard, &draft, &["T", "D", "Q", "1"]);

        // The form fills option B and C directly.
        draft.update(|d| {
            d.pending.set_option(OptionLabel::B, "two");
            d.pending.set_option(OptionLabel::C, "three");
        });

        // The wizard still asks for B; answering overwrites the form's value.
        run(&mut wizard, &draft, &["2", "3", "4", "d"]);
        let snapshot = draft.snapshot();
        assert_eq!(snapshot.questions[0].options, ["1", "2", "3", "4"]);
        assert_eq!(snapshot.questions[0].answer, Some(OptionLabel::D));
    }
}
