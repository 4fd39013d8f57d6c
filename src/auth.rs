use std::sync::Arc;

use teloxide::types::ReplyMarkup;
use teloxide::{payloads::SendMessageSetters, prelude::Requester, types::Message, Bot};
use tracing::instrument;

use crate::api::model::SignupRequest;
use crate::api::Authenticate;
use crate::keyboard::{action_keyboard, role_keyboard, welcome_keyboard, LOG_IN, SIGN_UP};
use crate::session::Role;
use crate::state::QuizState;
use crate::{HandlerResult, UserDialogue};

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn welcome(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    match msg.text() {
        Some(LOG_IN) => login(bot, dialogue, msg).await?,
        Some(SIGN_UP) => signup(bot, dialogue, msg).await?,
        _ => {
            bot.send_message(msg.chat.id, "You must be logged in. Log in or sign up to continue.")
                .reply_markup(welcome_keyboard())
                .await?;
        }
    }
    Ok(())
}

pub(crate) async fn login(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "What is your email?")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(QuizState::ReceiveEmail).await?;
    Ok(())
}

pub(crate) async fn signup(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Let's create your account. Choose a username.")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(QuizState::ReceiveUsername).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_email(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(email) if !email.is_empty() => {
            bot.send_message(msg.chat.id, "And your password?").await?;
            dialogue
                .update(QuizState::ReceivePassword {
                    email: email.to_owned(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, send your email.").await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, api))]
pub(crate) async fn receive_password<Api: Authenticate>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    email: String,
    api: Arc<Api>,
) -> HandlerResult {
    let Some(password) = msg.text().filter(|text| !text.is_empty()) else {
        bot.send_message(msg.chat.id, "Please, send your password.").await?;
        return Ok(());
    };

    match api.login(&email, password).await {
        Ok(session) => {
            log::info!("{} logged in as {}", session.username, session.role);
            bot.send_message(
                msg.chat.id,
                format!("Welcome back, {}! What do you want to do?", session.username),
            )
            .reply_markup(action_keyboard(&session))
            .await?;
            dialogue.update(QuizState::Menu { session }).await?;
        }
        Err(e) => {
            log::warn!("Login failed for {}: {}", email, e);
            bot.send_message(
                msg.chat.id,
                format!("Login failed: {}. What is your email?", e),
            )
            .await?;
            dialogue.update(QuizState::ReceiveEmail).await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_username(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(username) if !username.is_empty() => {
            bot.send_message(msg.chat.id, "Are you a creator or a participant?")
                .reply_markup(role_keyboard())
                .await?;
            dialogue
                .update(QuizState::ReceiveRole {
                    username: username.to_owned(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, send a username.").await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_role(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    username: String,
) -> HandlerResult {
    match msg.text().map(str::parse::<Role>) {
        Some(Ok(role)) => {
            bot.send_message(msg.chat.id, "What is your email?")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue
                .update(QuizState::ReceiveSignupEmail { username, role })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, choose Creator or Participant.")
                .reply_markup(role_keyboard())
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn receive_signup_email(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (username, role): (String, Role),
) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(email) if !email.is_empty() => {
            bot.send_message(msg.chat.id, "Choose a password.").await?;
            dialogue
                .update(QuizState::ReceiveSignupPassword {
                    username,
                    role,
                    email: email.to_owned(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, send your email.").await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, api))]
pub(crate) async fn receive_signup_password<Api: Authenticate>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (username, role, email): (String, Role, String),
    api: Arc<Api>,
) -> HandlerResult {
    let Some(password) = msg.text().filter(|text| !text.is_empty()) else {
        bot.send_message(msg.chat.id, "Please, choose a password.").await?;
        return Ok(());
    };

    let request = SignupRequest {
        username: username.clone(),
        role,
        email: email.clone(),
        password: password.to_owned(),
    };

    match api.signup(request).await {
        Ok(()) => {
            log::info!("Account created for {} ({})", username, role);
            bot.send_message(msg.chat.id, "Account created successfully! Please log in.")
                .reply_markup(welcome_keyboard())
                .await?;
            dialogue.update(QuizState::Start).await?;
        }
        Err(e) => {
            log::warn!("Signup failed for {}: {}", username, e);
            bot.send_message(
                msg.chat.id,
                format!("Error creating account: {}. Choose another password or /cancel.", e),
            )
            .await?;
            dialogue
                .update(QuizState::ReceiveSignupPassword { username, role, email })
                .await?;
        }
    }
    Ok(())
}
