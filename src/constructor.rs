use std::sync::Arc;

use teloxide::types::ReplyMarkup;
use teloxide::utils::command::BotCommands;
use teloxide::{payloads::SendMessageSetters, prelude::Requester, types::Message, Bot};
use tracing::instrument;

use crate::api::model::QuizPayload;
use crate::api::{CreateQuiz, EditQuiz};
use crate::authoring::AuthoringSession;
use crate::draft::FormStep;
use crate::keyboard::{action_keyboard, yes_no_keyboard};
use crate::quiz::{OptionLabel, Quiz};
use crate::session::Session;
use crate::state::QuizState;
use crate::wizard::{Outcome, WizardState};
use crate::{HandlerResult, UserDialogue};

/// Direct edits of the draft, the chat counterpart of the authoring form.
#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum FormCommand {
    #[command(description = "set the quiz title.")]
    Title(String),
    #[command(description = "set the quiz description.")]
    Description(String),
    #[command(description = "set the text of the question being edited.")]
    Question(String),
    #[command(rename = "option", description = "set an option, e.g. /option B Berlin.")]
    SetOption(String),
    #[command(description = "clear an option, e.g. /clearoption C.")]
    ClearOption(String),
    #[command(description = "mark the correct option, e.g. /correct A.")]
    Correct(String),
    #[command(description = "set an explanation for the question.")]
    Explain(String),
    #[command(description = "toggle whether the question is required.")]
    Required,
    #[command(description = "add the question (or store the edited one).")]
    Add,
    #[command(description = "load question n into the form.")]
    Edit(String),
    #[command(description = "delete question n.")]
    Delete(String),
    #[command(description = "go to step 1, 2 or 3.")]
    Step(String),
    #[command(description = "review the quiz.")]
    Review,
    #[command(description = "show the current draft.")]
    Draft,
    #[command(description = "save the quiz.")]
    Save,
}

pub(crate) async fn start_authoring(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    session: Session,
    authoring: AuthoringSession,
) -> HandlerResult {
    if !session.is_creator() {
        bot.send_message(msg.chat.id, "Only creators can build quizzes.")
            .await?;
        return Ok(());
    }

    log::info!("{} starts authoring", session.username);
    bot.send_message(msg.chat.id, step_banner(authoring.step()))
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    bot.send_message(msg.chat.id, authoring.greeting()).await?;
    if authoring.quiz_id().is_some() {
        bot.send_message(msg.chat.id, authoring.snapshot().to_string())
            .await?;
    }
    dialogue
        .update(QuizState::Authoring { session, authoring })
        .await?;
    Ok(())
}

/// Free text goes to the wizard.
#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_chat(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (session, mut authoring): (Session, AuthoringSession),
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please, send text.").await?;
        return Ok(());
    };

    let turn = authoring.chat(text);
    log::info!(
        "{}: wizard {:?} -> {:?}",
        session.username,
        turn.outcome,
        authoring.wizard_state()
    );

    if let Some(step) = turn.step {
        bot.send_message(msg.chat.id, step_banner(step)).await?;
    }

    let reply = bot.send_message(msg.chat.id, turn.reply);
    if authoring.wizard_state() == WizardState::ConfirmNext {
        reply.reply_markup(yes_no_keyboard()).await?;
    } else {
        reply.reply_markup(ReplyMarkup::kb_remove()).await?;
    }

    if turn.outcome == Outcome::ReadyForReview {
        bot.send_message(msg.chat.id, authoring.snapshot().to_string())
            .await?;
    }

    dialogue
        .update(QuizState::Authoring { session, authoring })
        .await?;
    Ok(())
}

/// Slash commands edit the same draft directly.
#[instrument(level = "info", skip(bot, dialogue, api))]
pub(crate) async fn receive_form_command<Api: CreateQuiz + EditQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    command: FormCommand,
    (session, mut authoring): (Session, AuthoringSession),
    api: Arc<Api>,
) -> HandlerResult {
    let reply = match command {
        FormCommand::Title(title) => {
            authoring.set_title(&title);
            format!("Title set to \"{}\".", title.trim())
        }
        FormCommand::Description(description) => {
            authoring.set_description(&description);
            "Description updated.".to_owned()
        }
        FormCommand::Question(text) => {
            authoring.set_question_text(&text);
            format!("Question text set to \"{}\".", text.trim())
        }
        FormCommand::SetOption(args) => match args.trim().split_once(' ') {
            Some((label, text)) => match label.parse::<OptionLabel>() {
                Ok(label) => {
                    authoring.set_option(label, text);
                    format!("Option {} set to \"{}\".", label, text.trim())
                }
                Err(e) => e.to_string(),
            },
            None => "Usage: /option <A-D> <text>".to_owned(),
        },
        FormCommand::ClearOption(label) => match label.parse::<OptionLabel>() {
            Ok(label) => {
                authoring.clear_option(label);
                format!("Option {} cleared.", label)
            }
            Err(e) => e.to_string(),
        },
        FormCommand::Correct(label) => match label.parse::<OptionLabel>() {
            Ok(label) => {
                authoring.mark_correct(label);
                format!("Option {} marked as correct.", label)
            }
            Err(e) => e.to_string(),
        },
        FormCommand::Explain(text) => {
            authoring.set_explanation(&text);
            "Explanation updated.".to_owned()
        }
        FormCommand::Required => {
            if authoring.toggle_required() {
                "The question is now required.".to_owned()
            } else {
                "The question is now optional.".to_owned()
            }
        }
        FormCommand::Add => {
            let was_editing = authoring.editing_index().is_some();
            match authoring.add_question() {
                Ok(index) if was_editing => format!("Question #{} updated.", index + 1),
                Ok(index) => format!("Question #{} added.", index + 1),
                Err(e) => format!("Please fill the question and select the correct answer: {}", e),
            }
        }
        FormCommand::Edit(number) => match parse_number(&number) {
            Some(number) => match authoring.start_edit(number) {
                Ok(()) => format!(
                    "Editing question #{}. Change it and /add to store it.\n\n{}",
                    number,
                    authoring.snapshot()
                ),
                Err(e) => e.to_string(),
            },
            None => "Usage: /edit <n>".to_owned(),
        },
        FormCommand::Delete(number) => match parse_number(&number) {
            Some(number) => match authoring.delete_question(number) {
                Ok(()) => format!("Question #{} deleted.", number),
                Err(e) => e.to_string(),
            },
            None => "Usage: /delete <n>".to_owned(),
        },
        FormCommand::Step(number) => {
            match number.trim().parse::<u8>().ok().and_then(FormStep::from_number) {
                Some(step) if step != FormStep::Saved => match authoring.go_to(step) {
                    Ok(step) => step_banner(step),
                    Err(e) => e.to_string(),
                },
                _ => "Usage: /step <1-3>".to_owned(),
            }
        }
        FormCommand::Review => match authoring.go_to(FormStep::Review) {
            Ok(step) => format!("{}\n\n{}", step_banner(step), authoring.snapshot()),
            Err(e) => e.to_string(),
        },
        FormCommand::Draft => authoring.snapshot().to_string(),
        FormCommand::Save => {
            return save(bot, dialogue, msg, session, authoring, api).await;
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    dialogue
        .update(QuizState::Authoring { session, authoring })
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, authoring, api), fields(user = %session.username))]
async fn save<Api: CreateQuiz + EditQuiz>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    session: Session,
    mut authoring: AuthoringSession,
    api: Arc<Api>,
) -> HandlerResult {
    let draft = authoring.snapshot();
    if let Err(e) = draft.validate_for_save() {
        bot.send_message(msg.chat.id, e.to_string()).await?;
        return Ok(());
    }

    let payload = QuizPayload::from_draft(&draft, &session.user_id);
    log::debug!("Saving quiz '{}' with {} questions", payload.title, payload.questions.len());

    let saved: Result<Quiz, _> = match authoring.quiz_id() {
        Some(id) => api.update_quiz(id, &payload).await,
        None => api.create_quiz(&payload).await,
    };

    match saved {
        Ok(quiz) => {
            let verb = if authoring.quiz_id().is_some() { "updated" } else { "created" };
            log::info!("{} {} quiz '{}' ({})", session.username, verb, quiz.title(), quiz.id());
            authoring.mark_saved(quiz.id().clone());
            bot.send_message(msg.chat.id, step_banner(authoring.step())).await?;
            bot.send_message(
                msg.chat.id,
                format!("🎉 Quiz {} successfully!\nQuiz ID: {}\n\n{}", verb, quiz.id(), quiz),
            )
            .reply_markup(action_keyboard(&session))
            .await?;
            dialogue.update(QuizState::Menu { session }).await?;
        }
        Err(e) => {
            log::error!("Failed to save quiz '{}': {}", payload.title, e);
            bot.send_message(msg.chat.id, format!("Failed to save quiz: {}", e))
                .await?;
            dialogue
                .update(QuizState::Authoring { session, authoring })
                .await?;
        }
    }
    Ok(())
}

fn step_banner(step: FormStep) -> String {
    match step {
        FormStep::Saved => format!("Step {} · {}", step.number(), step.title()),
        _ => format!("Step {}/3 · {}", step.number(), step.title()),
    }
}

fn parse_number(text: &str) -> Option<usize> {
    text.trim().trim_start_matches('#').parse().ok()
}
