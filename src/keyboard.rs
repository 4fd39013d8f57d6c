use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::attempt::{Attempt, Catalog};
use crate::quiz::{OptionLabel, Quiz};
use crate::session::Session;

pub(crate) const TAKE_QUIZ: &str = "Take a quiz📝";
pub(crate) const MY_RESULTS: &str = "My results📊";
pub(crate) const CREATE_QUIZ: &str = "Create a new quiz🏗️";
pub(crate) const MY_QUIZZES: &str = "My quizzes🗂️";
pub(crate) const STATISTICS: &str = "Statistics📈";
pub(crate) const LOG_IN: &str = "Log in🔑";
pub(crate) const SIGN_UP: &str = "Sign up✍️";
pub(crate) const BACK: &str = "⬅️ Back";

pub(crate) const TOGGLE_PUBLISH: &str = "Toggle publish";
pub(crate) const EDIT_QUIZ: &str = "Edit quiz✏️";
pub(crate) const QUIZ_RESULTS: &str = "Quiz results📊";
pub(crate) const DELETE_QUIZ: &str = "Delete quiz🗑️";

pub(crate) const CALLBACK_PREVIOUS: &str = "prev";
pub(crate) const CALLBACK_NEXT: &str = "next";
pub(crate) const CALLBACK_SUBMIT: &str = "submit";
pub(crate) const CALLBACK_LEAVE: &str = "leave";
pub(crate) const CALLBACK_CHOOSE: &str = "choose:";

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new("Yes✔️"),
        KeyboardButton::new("No❌"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn welcome_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(LOG_IN), KeyboardButton::new(SIGN_UP)]])
}

pub(crate) fn role_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("Creator🏗️"),
        KeyboardButton::new("Participant📝"),
    ]])
}

pub(crate) fn action_keyboard(session: &Session) -> KeyboardMarkup {
    let mut keyboard = vec![vec![KeyboardButton::new(TAKE_QUIZ), KeyboardButton::new(MY_RESULTS)]];

    if session.is_creator() {
        keyboard.push(vec![KeyboardButton::new(CREATE_QUIZ), KeyboardButton::new(MY_QUIZZES)]);
        keyboard.push(vec![KeyboardButton::new(STATISTICS)]);
    }

    KeyboardMarkup::new(keyboard)
}

/// One button per catalog entry, numbered so titles may repeat.
pub(crate) fn catalog_keyboard(catalog: &Catalog) -> KeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let label = if entry.is_attempted() {
                format!("{}. 🔒 {} (already attempted)", i + 1, entry.quiz().title())
            } else {
                format!("{}. {}", i + 1, entry.quiz().title())
            };
            vec![KeyboardButton::new(label)]
        })
        .collect();
    keyboard.push(vec![KeyboardButton::new(BACK)]);

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn my_quizzes_keyboard(quizzes: &[Quiz]) -> KeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = quizzes
        .iter()
        .enumerate()
        .map(|(i, quiz)| {
            let status = if quiz.is_published() { "✅" } else { "⏸" };
            vec![KeyboardButton::new(format!("{}. {} {}", i + 1, status, quiz.title()))]
        })
        .collect();
    keyboard.push(vec![KeyboardButton::new(BACK)]);

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn handle_quiz_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(TOGGLE_PUBLISH), KeyboardButton::new(EDIT_QUIZ)],
        vec![KeyboardButton::new(QUIZ_RESULTS), KeyboardButton::new(DELETE_QUIZ)],
        vec![KeyboardButton::new(BACK)],
    ];

    KeyboardMarkup::new(keyboard)
}

/// Option buttons for the current question plus navigation.
pub(crate) fn question_keyboard(attempt: &Attempt) -> InlineKeyboardMarkup {
    let Some(question) = attempt.current_question() else {
        return InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            BACK,
            CALLBACK_LEAVE,
        )]]);
    };
    let chosen = attempt.chosen(question.id());

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = OptionLabel::ALL
        .into_iter()
        .map(|label| {
            let mark = if chosen == Some(label) { "✅ " } else { "" };
            vec![InlineKeyboardButton::callback(
                format!("{}{}. {}", mark, label, question.option(label)),
                format!("{}{}", CALLBACK_CHOOSE, label),
            )]
        })
        .collect();

    let mut navigation = Vec::new();
    if attempt.current_index() > 0 {
        navigation.push(InlineKeyboardButton::callback("◀️ Previous", CALLBACK_PREVIOUS));
    }
    if attempt.is_last() {
        navigation.push(InlineKeyboardButton::callback("Submit ✅", CALLBACK_SUBMIT));
    } else {
        navigation.push(InlineKeyboardButton::callback("Next ▶️", CALLBACK_NEXT));
    }
    keyboard.push(navigation);

    InlineKeyboardMarkup::new(keyboard)
}

/// Reads the `n.` prefix of a numbered button back into a 0-based index.
pub(crate) fn numbered_choice(text: &str) -> Option<usize> {
    let (number, _) = text.split_once('.')?;
    number.trim().parse::<usize>().ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_buttons_round_trip() {
        assert_eq!(numbered_choice("1. Capitals"), Some(0));
        assert_eq!(numbered_choice("12. 🔒 Rivers (already attempted)"), Some(11));
        assert_eq!(numbered_choice("0. nothing"), None);
        assert_eq!(numbered_choice("Capitals"), None);
    }
}
