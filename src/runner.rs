use std::{collections::HashSet, sync::Arc, time::Duration};

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    api::{RetrieveQuiz, RetrieveResults, SubmitAttempt},
    attempt::{format_time, Attempt, Catalog, Countdown, SubmitGuard, Tick, TakingFlow},
    config::Config,
    dashboard,
    error::FlowError,
    keyboard::{
        action_keyboard, catalog_keyboard, numbered_choice, question_keyboard, BACK,
        CALLBACK_CHOOSE, CALLBACK_LEAVE, CALLBACK_NEXT, CALLBACK_PREVIOUS, CALLBACK_SUBMIT,
    },
    quiz::{Id, OptionLabel},
    session::Session,
    state::QuizState,
    HandlerResult, UserDialogue,
};

/// Remaining seconds at which the participant gets a reminder.
const WARN_AT: [u32; 2] = [60, 10];

/// Loads the catalog and the participant's results side by side.
#[instrument(level = "info", skip(bot, dialogue, msg, api), fields(user = %session.username))]
pub(crate) async fn browse<Api: RetrieveQuiz + RetrieveResults>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    session: Session,
    api: Arc<Api>,
) -> HandlerResult {
    let (catalog, results) = tokio::join!(
        api.retrieve_catalog(),
        api.retrieve_user_results(&session.user_id)
    );

    let quizzes = match catalog {
        Ok(quizzes) => quizzes,
        Err(e) => {
            log::error!("Failed to load quizzes: {}", e);
            bot.send_message(msg.chat.id, format!("Failed to load quizzes: {}", e))
                .await?;
            return Ok(());
        }
    };

    let attempted: HashSet<Id> = match results {
        Ok(results) => results.into_iter().map(|r| r.quiz_id).collect(),
        Err(e) => {
            log::warn!("Failed to load results of {}: {}", session.username, e);
            bot.send_message(
                msg.chat.id,
                format!("Could not check your earlier attempts: {}", e),
            )
            .await?;
            HashSet::new()
        }
    };

    let catalog = Catalog::new(quizzes, &attempted);
    if catalog.is_empty() {
        bot.send_message(msg.chat.id, "No quizzes available yet.")
            .await?;
        return Ok(());
    }

    let mut flow = TakingFlow::default();
    flow.browse(catalog)?;
    let TakingFlow::Browsing(catalog) = &flow else {
        return Ok(());
    };

    log::info!(
        "{} browses {} quizzes, {} attempted",
        session.username,
        catalog.entries().len(),
        attempted.len()
    );
    bot.send_message(msg.chat.id, "Please, choose a quiz:")
        .reply_markup(catalog_keyboard(catalog))
        .await?;
    dialogue.update(QuizState::Taking { session, flow }).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, api, config))]
pub(crate) async fn selection<Api>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (session, mut flow): (Session, TakingFlow),
    api: Arc<Api>,
    config: Arc<Config>,
) -> HandlerResult
where
    Api: SubmitAttempt + RetrieveResults + Send + Sync + 'static,
{
    let text = msg.text().unwrap_or_default();
    if text == BACK {
        return leave(&bot, msg.chat.id, &dialogue, session).await;
    }

    match &flow {
        TakingFlow::Browsing(_) => {}
        TakingFlow::Active(_) => {
            bot.send_message(
                msg.chat.id,
                "Use the buttons under the question, or /cancel to leave the quiz.",
            )
            .await?;
            return Ok(());
        }
        TakingFlow::Start | TakingFlow::Completed { .. } => {
            return leave(&bot, msg.chat.id, &dialogue, session).await;
        }
    }

    let Some(index) = numbered_choice(text) else {
        bot.send_message(msg.chat.id, "Please, choose a quiz from the list.")
            .await?;
        return Ok(());
    };

    let attempt = match flow.select(index, config.default_time_limit) {
        Ok(attempt) => attempt.clone(),
        Err(e) => {
            log::info!("{} could not start quiz #{}: {}", session.username, index + 1, e);
            let reply = match e {
                FlowError::AlreadyAttempted => {
                    "You have already attempted this quiz. Please, choose another one.".to_owned()
                }
                other => format!("Sorry, {}.", other),
            };
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    log::info!(
        "{} starts '{}' (attempt {})",
        session.username,
        attempt.quiz().title(),
        attempt.id()
    );

    bot.send_message(msg.chat.id, introduction(&attempt))
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    bot.send_message(msg.chat.id, question_card(&attempt))
        .reply_markup(question_keyboard(&attempt))
        .await?;

    if let (Some(seconds), true) = (attempt.time_limit(), attempt.question_count() > 0) {
        spawn_countdown(
            bot.clone(),
            msg.chat.id,
            dialogue.clone(),
            api,
            attempt.id(),
            attempt.guard().clone(),
            seconds,
        );
    }

    dialogue.update(QuizState::Taking { session, flow }).await?;
    Ok(())
}

/// Inline buttons under the question card.
#[instrument(level = "info", skip(bot, dialogue, q, api))]
pub(crate) async fn take_answer<Api: SubmitAttempt + RetrieveResults + Sync>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    (session, mut flow): (Session, TakingFlow),
    api: Arc<Api>,
) -> HandlerResult {
    let Some(chat_id) = q.chat_id() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let data = q.data.as_deref().unwrap_or_default();

    if data == CALLBACK_LEAVE {
        bot.answer_callback_query(q.id.clone()).await?;
        log::info!("{} leaves the quiz", session.username);
        return leave(&bot, chat_id, &dialogue, session).await;
    }
    if data == CALLBACK_SUBMIT {
        bot.answer_callback_query(q.id.clone()).await?;
        return submit(bot, chat_id, dialogue, session, flow, api).await;
    }

    let Some(attempt) = flow.attempt_mut() else {
        bot.answer_callback_query(q.id.clone())
            .text("This quiz is no longer active.")
            .await?;
        return Ok(());
    };
    if attempt.guard().is_claimed() {
        bot.answer_callback_query(q.id.clone())
            .text("Your answers are being submitted, please wait.")
            .await?;
        return Ok(());
    }

    // Stored before any Telegram round-trip; the countdown may submit meanwhile.

    match data {
        CALLBACK_PREVIOUS => attempt.previous(),
        CALLBACK_NEXT => attempt.next(),
        other => match other.strip_prefix(CALLBACK_CHOOSE).map(str::parse::<OptionLabel>) {
            Some(Ok(label)) => attempt.choose(label)?,
            _ => {
                log::warn!("Unknown callback data {:?}", other);
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            }
        },
    }

    let card = question_card(attempt);
    let keyboard = question_keyboard(attempt);
    if !store_if_active(&dialogue, session, flow).await? {
        bot.answer_callback_query(q.id.clone())
            .text("This quiz is no longer active.")
            .await?;
        return Ok(());
    }
    bot.answer_callback_query(q.id.clone()).await?;

    if let Some(message) = &q.message {
        // Telegram refuses edits that change nothing, e.g. picking the same option twice.
        if let Err(e) = bot
            .edit_message_text(chat_id, message.id(), card)
            .reply_markup(keyboard)
            .await
        {
            log::debug!("Question card left as is: {}", e);
        }
    }
    Ok(())
}

/// Writes the flow back unless its attempt was submitted or left while the
/// update was being handled.
async fn store_if_active(
    dialogue: &UserDialogue,
    session: Session,
    flow: TakingFlow,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let Some(attempt) = flow.attempt() else {
        return Ok(false);
    };
    if attempt.guard().is_claimed() || active_attempt(dialogue, attempt.id()).await?.is_none() {
        log::info!("Dropping a late answer for attempt {}", attempt.id());
        return Ok(false);
    }
    dialogue.update(QuizState::Taking { session, flow }).await?;
    Ok(true)
}

/// Callbacks arriving after the attempt is over.
pub(crate) async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone())
        .text("This quiz is no longer active.")
        .await?;
    Ok(())
}

/// Shared by the Submit button and the expired countdown. Whoever claims the
/// attempt's guard first submits; the other returns quietly.
async fn submit<Api: SubmitAttempt + RetrieveResults + Sync>(
    bot: Bot,
    chat_id: ChatId,
    dialogue: UserDialogue,
    session: Session,
    mut flow: TakingFlow,
    api: Arc<Api>,
) -> HandlerResult {
    let Some(attempt) = flow.attempt() else {
        return Ok(());
    };

    let submission = match attempt.begin_submission() {
        Ok(submission) => submission,
        Err(FlowError::AlreadySubmitting) => {
            log::debug!("Attempt {} is already being submitted", attempt.id());
            return Ok(());
        }
        Err(e) => {
            bot.send_message(chat_id, format!("Cannot submit: {}.", e))
                .await?;
            return Ok(());
        }
    };

    log::info!(
        "{} submits attempt {} with {}/{} answers",
        session.username,
        submission.attempt_id,
        attempt.answered_count(),
        attempt.question_count()
    );

    match api.submit_attempt(&session.user_id, &submission).await {
        Ok(score) => {
            flow.complete(score)?;
            log::info!(
                "{} scored {} on quiz {}",
                session.username,
                score,
                submission.quiz_id
            );
            bot.send_message(
                chat_id,
                format!(
                    "Quiz submitted successfully! You scored {} out of {}.",
                    score.score, score.total
                ),
            )
            .reply_markup(action_keyboard(&session))
            .await?;
            dashboard::send_results(&bot, chat_id, &session, api.as_ref()).await?;
            dialogue.update(QuizState::Menu { session }).await?;
        }
        Err(e) => {
            attempt.submission_failed();
            log::error!("Failed to submit attempt {}: {}", submission.attempt_id, e);
            bot.send_message(
                chat_id,
                format!("Failed to submit quiz: {}. Press Submit to try again.", e),
            )
            .await?;
            dialogue.update(QuizState::Taking { session, flow }).await?;
        }
    }
    Ok(())
}

async fn leave(bot: &Bot, chat_id: ChatId, dialogue: &UserDialogue, session: Session) -> HandlerResult {
    bot.send_message(chat_id, "Please choose what to do:")
        .reply_markup(action_keyboard(&session))
        .await?;
    dialogue.update(QuizState::Menu { session }).await?;
    Ok(())
}

fn spawn_countdown<Api>(
    bot: Bot,
    chat_id: ChatId,
    dialogue: UserDialogue,
    api: Arc<Api>,
    attempt_id: Uuid,
    guard: SubmitGuard,
    seconds: u32,
) where
    Api: SubmitAttempt + RetrieveResults + Send + Sync + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = run_countdown(bot, chat_id, dialogue, api, attempt_id, guard, seconds).await {
            log::error!("Countdown of attempt {} failed: {}", attempt_id, e);
        }
    });
}

#[derive(Debug, PartialEq, Eq)]
enum CountdownStep {
    Quiet,
    Warn(u32),
    Submit,
}

/// While a submission is in flight the timer stays quiet; it takes over on
/// expiry once a failed submission has released the guard.
fn countdown_step(tick: Tick, submitting: bool) -> CountdownStep {
    match tick {
        _ if submitting => CountdownStep::Quiet,
        Tick::Remaining(left) if WARN_AT.contains(&left) => CountdownStep::Warn(left),
        Tick::Remaining(_) => CountdownStep::Quiet,
        Tick::Expired => CountdownStep::Submit,
    }
}

/// Ticks once per second until the attempt expires or stops being the
/// active one. On expiry the answers stored in the dialogue are submitted.
async fn run_countdown<Api>(
    bot: Bot,
    chat_id: ChatId,
    dialogue: UserDialogue,
    api: Arc<Api>,
    attempt_id: Uuid,
    guard: SubmitGuard,
    seconds: u32,
) -> HandlerResult
where
    Api: SubmitAttempt + RetrieveResults + Send + Sync + 'static,
{
    let mut countdown = Countdown::new(seconds);
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some((session, flow)) = active_attempt(&dialogue, attempt_id).await? else {
            log::debug!("Countdown of attempt {} stopped", attempt_id);
            return Ok(());
        };
        match countdown_step(countdown.tick(), guard.is_claimed()) {
            CountdownStep::Quiet => {}
            CountdownStep::Warn(left) => {
                bot.send_message(chat_id, format!("⏳ {} left!", format_time(left)))
                    .await?;
            }
            CountdownStep::Submit => {
                log::info!("Attempt {} of {} timed out", attempt_id, session.username);
                bot.send_message(chat_id, "⏰ Time's up! Submitting your answers...")
                    .await?;
                return submit(bot, chat_id, dialogue, session, flow, api).await;
            }
        }
    }
}

async fn active_attempt(
    dialogue: &UserDialogue,
    attempt_id: Uuid,
) -> Result<Option<(Session, TakingFlow)>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    match dialogue.get().await? {
        Some(QuizState::Taking { session, flow })
            if flow.attempt().is_some_and(|a| a.id() == attempt_id) =>
        {
            Ok(Some((session, flow)))
        }
        _ => Ok(None),
    }
}

fn introduction(attempt: &Attempt) -> String {
    let quiz = attempt.quiz();
    let mut text = format!("📝 {}", quiz.title());
    if !quiz.description().is_empty() {
        text.push_str(&format!("\n{}", quiz.description()));
    }
    text.push_str(&format!("\n\nQuestions: {}", attempt.question_count()));
    if let Some(seconds) = attempt.time_limit() {
        text.push_str(&format!("\n⏱ Time limit: {}", format_time(seconds)));
    }
    text
}

/// Progress strip, the current question and its options.
fn question_card(attempt: &Attempt) -> String {
    let Some(question) = attempt.current_question() else {
        return "No questions available for this quiz yet.".to_owned();
    };

    let progress: String = attempt
        .quiz()
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            if i == attempt.current_index() {
                "🔵"
            } else if attempt.chosen(q.id()).is_some() {
                "✓"
            } else {
                "⚪"
            }
        })
        .collect();

    let mut text = format!(
        "{}\n{}\n\nQuestion {} of {} · answered {}\n\n{}\n",
        attempt.quiz().title(),
        progress,
        attempt.current_index() + 1,
        attempt.question_count(),
        attempt.answered_count(),
        question.text()
    );
    for label in OptionLabel::ALL {
        text.push_str(&format!("\n{}. {}", label, question.option(label)));
    }
    text
}
