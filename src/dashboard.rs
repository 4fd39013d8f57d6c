//! Results and creator views. Text only; charts stay out of the chat.

use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, Message},
    Bot,
};
use tracing::instrument;

use crate::{
    api::{DeleteQuiz, EditQuiz, RetrieveQuiz, RetrieveResults},
    authoring::AuthoringSession,
    constructor,
    keyboard::{
        action_keyboard, handle_quiz_keyboard, my_quizzes_keyboard, numbered_choice,
        yes_no_keyboard, BACK, DELETE_QUIZ, EDIT_QUIZ, QUIZ_RESULTS, TOGGLE_PUBLISH,
    },
    quiz::{Quiz, QuizResult},
    session::Session,
    state::QuizState,
    stats::{creator_overview, participants, summarize, CreatorOverview, Summary},
    wizard::Command,
    HandlerResult, UserDialogue,
};

pub(crate) async fn my_results<Api: RetrieveResults>(
    bot: Bot,
    msg: Message,
    session: Session,
    api: Arc<Api>,
) -> HandlerResult {
    send_results(&bot, msg.chat.id, &session, api.as_ref()).await
}

/// Sends the participant's results with a summary on top.
pub(crate) async fn send_results<Api: RetrieveResults>(
    bot: &Bot,
    chat_id: ChatId,
    session: &Session,
    api: &Api,
) -> HandlerResult {
    match api.retrieve_user_results(&session.user_id).await {
        Ok(results) if results.is_empty() => {
            bot.send_message(chat_id, "You have not taken any quizzes yet.")
                .await?;
        }
        Ok(results) => {
            let text = format!(
                "📊 Your results\n\n{}\n\n{}",
                summary_text(&summarize(&results)),
                results_text(&results)
            );
            bot.send_message(chat_id, text).await?;
        }
        Err(e) => {
            log::error!("Failed to load results of {}: {}", session.username, e);
            bot.send_message(chat_id, format!("Failed to load your results: {}", e))
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, api), fields(user = %session.username))]
pub(crate) async fn my_quizzes<Api: RetrieveQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    session: Session,
    api: Arc<Api>,
) -> HandlerResult {
    if !session.is_creator() {
        bot.send_message(msg.chat.id, "Only creators have quizzes to manage.")
            .await?;
        return Ok(());
    }

    match api.retrieve_owned_quizzes(&session.user_id).await {
        Ok(quizzes) if quizzes.is_empty() => {
            bot.send_message(msg.chat.id, "You have not created any quizzes yet.")
                .await?;
        }
        Ok(quizzes) => {
            bot.send_message(msg.chat.id, "Select a quiz.")
                .reply_markup(my_quizzes_keyboard(&quizzes))
                .await?;
            dialogue
                .update(QuizState::MyQuizzes { session, quizzes })
                .await?;
        }
        Err(e) => {
            log::error!("Failed to load quizzes of {}: {}", session.username, e);
            bot.send_message(msg.chat.id, format!("Failed to load your quizzes: {}", e))
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn select_quiz(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (session, quizzes): (Session, Vec<Quiz>),
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == BACK {
        return back_to_menu(&bot, msg.chat.id, &dialogue, session).await;
    }

    match numbered_choice(text).and_then(|index| quizzes.get(index)) {
        Some(quiz) => {
            bot.send_message(msg.chat.id, quiz.to_string())
                .reply_markup(handle_quiz_keyboard())
                .await?;
            dialogue
                .update(QuizState::HandleQuiz {
                    session,
                    quiz: quiz.clone(),
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please, select a quiz from the list.")
                .reply_markup(my_quizzes_keyboard(&quizzes))
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, api))]
pub(crate) async fn handle_quiz<Api: EditQuiz + RetrieveQuiz + RetrieveResults>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (session, mut quiz): (Session, Quiz),
    api: Arc<Api>,
) -> HandlerResult {
    match msg.text() {
        Some(TOGGLE_PUBLISH) => {
            let published = !quiz.is_published();
            match api.set_published(quiz.id(), published).await {
                Ok(_) => {
                    quiz.set_published(published);
                    log::info!("{} set '{}' published={}", session.username, quiz.title(), published);
                    let status = if published { "published" } else { "unpublished" };
                    bot.send_message(msg.chat.id, format!("Quiz {} successfully.", status))
                        .reply_markup(handle_quiz_keyboard())
                        .await?;
                    dialogue
                        .update(QuizState::HandleQuiz { session, quiz })
                        .await?;
                }
                Err(e) => {
                    log::error!("Failed to toggle '{}': {}", quiz.title(), e);
                    bot.send_message(msg.chat.id, format!("Failed to change status: {}", e))
                        .await?;
                }
            }
        }
        Some(EDIT_QUIZ) => {
            // Listings may omit questions; edit the stored quiz in full.
            let stored = match api.retrieve_quiz(quiz.id()).await {
                Ok(stored) => stored,
                Err(e) => {
                    log::error!("Failed to load '{}' for editing: {}", quiz.title(), e);
                    bot.send_message(msg.chat.id, format!("Failed to load the quiz: {}", e))
                        .await?;
                    return Ok(());
                }
            };
            let authoring = AuthoringSession::editing(&stored);
            constructor::start_authoring(bot, dialogue, msg, session, authoring).await?;
        }
        Some(QUIZ_RESULTS) => match api.retrieve_quiz_results(quiz.id()).await {
            Ok(results) if results.is_empty() => {
                bot.send_message(msg.chat.id, "Nobody has taken this quiz yet.")
                    .await?;
            }
            Ok(results) => {
                let text = format!(
                    "📊 {}\nParticipants: {}\n{}\n\n{}",
                    quiz.title(),
                    participants(&results),
                    summary_text(&summarize(&results)),
                    results_text(&results)
                );
                bot.send_message(msg.chat.id, text).await?;
            }
            Err(e) => {
                log::error!("Failed to load results of '{}': {}", quiz.title(), e);
                bot.send_message(msg.chat.id, format!("Failed to load results: {}", e))
                    .await?;
            }
        },
        Some(DELETE_QUIZ) => {
            bot.send_message(
                msg.chat.id,
                format!("Delete \"{}\"? This cannot be undone.", quiz.title()),
            )
            .reply_markup(yes_no_keyboard())
            .await?;
            dialogue
                .update(QuizState::ConfirmDelete { session, quiz })
                .await?;
        }
        Some(BACK) => back_to_menu(&bot, msg.chat.id, &dialogue, session).await?,
        _ => {
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(handle_quiz_keyboard())
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, api))]
pub(crate) async fn confirm_delete<Api: DeleteQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (session, quiz): (Session, Quiz),
    api: Arc<Api>,
) -> HandlerResult {
    let confirmed = match msg.text().map(Command::parse) {
        Some(Command::Confirm(confirmed)) => confirmed,
        _ => {
            bot.send_message(msg.chat.id, "Please, answer yes or no.")
                .reply_markup(yes_no_keyboard())
                .await?;
            return Ok(());
        }
    };

    if !confirmed {
        bot.send_message(msg.chat.id, "Deletion cancelled.")
            .reply_markup(handle_quiz_keyboard())
            .await?;
        dialogue
            .update(QuizState::HandleQuiz { session, quiz })
            .await?;
        return Ok(());
    }

    match api.delete_quiz(quiz.id()).await {
        Ok(()) => {
            log::info!("{} deleted quiz '{}' ({})", session.username, quiz.title(), quiz.id());
            bot.send_message(msg.chat.id, "Quiz deleted successfully.")
                .reply_markup(action_keyboard(&session))
                .await?;
            dialogue.update(QuizState::Menu { session }).await?;
        }
        Err(e) => {
            log::error!("Failed to delete '{}': {}", quiz.title(), e);
            bot.send_message(msg.chat.id, format!("Failed to delete quiz: {}", e))
                .reply_markup(handle_quiz_keyboard())
                .await?;
            dialogue
                .update(QuizState::HandleQuiz { session, quiz })
                .await?;
        }
    }
    Ok(())
}

/// Overview across all of the creator's quizzes.
#[instrument(level = "info", skip(bot, msg, api), fields(user = %session.username))]
pub(crate) async fn statistics<Api: RetrieveQuiz + RetrieveResults>(
    bot: Bot,
    msg: Message,
    session: Session,
    api: Arc<Api>,
) -> HandlerResult {
    if !session.is_creator() {
        bot.send_message(msg.chat.id, "Statistics are available to creators only.")
            .await?;
        return Ok(());
    }

    let quizzes = match api.retrieve_owned_quizzes(&session.user_id).await {
        Ok(quizzes) => quizzes,
        Err(e) => {
            log::error!("Failed to load quizzes of {}: {}", session.username, e);
            bot.send_message(msg.chat.id, format!("Failed to load statistics: {}", e))
                .await?;
            return Ok(());
        }
    };

    let mut per_quiz = Vec::with_capacity(quizzes.len());
    for quiz in quizzes {
        let results = match api.retrieve_quiz_results(quiz.id()).await {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Skipping results of '{}': {}", quiz.title(), e);
                Vec::new()
            }
        };
        per_quiz.push((quiz, results));
    }

    bot.send_message(msg.chat.id, overview_text(&creator_overview(&per_quiz)))
        .await?;
    Ok(())
}

async fn back_to_menu(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &UserDialogue,
    session: Session,
) -> HandlerResult {
    bot.send_message(chat_id, "Please choose what to do:")
        .reply_markup(action_keyboard(&session))
        .await?;
    dialogue.update(QuizState::Menu { session }).await?;
    Ok(())
}

fn summary_text(summary: &Summary) -> String {
    let mut text = format!(
        "Attempts: {}\nTotal score: {}/{}\nAverage: {:.1}%",
        summary.attempts, summary.total_score, summary.total_possible, summary.average_percent
    );
    if let Some(best) = summary.best {
        text.push_str(&format!("\nBest: {} ({:.0}%)", best, best.percent()));
    }
    text
}

fn results_text(results: &[QuizResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let title = result
                .quiz_title
                .as_deref()
                .unwrap_or_else(|| result.quiz_id.as_str());
            let mut line = format!(
                "{}. {} · {} ({:.0}%)",
                i + 1,
                title,
                result.score,
                result.score.percent()
            );
            if let Some(domain) = &result.quiz_domain {
                line.push_str(&format!(" · {}", domain));
            }
            if let Some(at) = result.submitted_at {
                line.push_str(&format!(" · {}", at.format("%Y-%m-%d %H:%M")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn overview_text(overview: &CreatorOverview) -> String {
    let mut text = format!(
        "📈 Statistics\n\nQuizzes: {} ({} published)\nParticipants: {}\nAttempts: {}",
        overview.total_quizzes,
        overview.published_quizzes,
        overview.total_participants,
        overview.total_attempts
    );
    match &overview.top_quiz {
        Some((title, average)) => {
            text.push_str(&format!("\nTop quiz: {} ({:.1}% average)", title, average))
        }
        None => text.push_str("\nNo attempts yet."),
    }
    text
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::quiz::{Id, Score};

    fn result(title: Option<&str>, score: u32, total: u32) -> QuizResult {
        QuizResult {
            id: None,
            quiz_id: Id::from("42"),
            quiz_title: title.map(str::to_owned),
            quiz_domain: None,
            user_id: Some(Id::from("u1")),
            score: Score { score, total },
            submitted_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0)),
        }
    }

    #[test]
    fn results_are_listed_one_per_line() {
        let text = results_text(&[result(Some("Capitals"), 3, 4), result(None, 1, 2)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1. Capitals · 3/4 (75%) · 2024-05-01 09:30");
        assert_eq!(lines[1], "2. 42 · 1/2 (50%) · 2024-05-01 09:30");
    }

    #[test]
    fn summary_mentions_best_score() {
        let summary = summarize(&[result(None, 3, 4), result(None, 1, 2)]);
        let text = summary_text(&summary);
        assert!(text.contains("Attempts: 2"));
        assert!(text.contains("Total score: 4/6"));
        assert!(text.contains("Best: 3/4 (75%)"));
    }

    #[test]
    fn overview_without_attempts() {
        let text = overview_text(&CreatorOverview::default());
        assert!(text.contains("Quizzes: 0 (0 published)"));
        assert!(text.ends_with("No attempts yet."));
    }
}
