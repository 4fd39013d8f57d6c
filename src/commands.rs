use teloxide::{
    payloads::SendMessageSetters, prelude::Requester, types::Message, utils::command::BotCommands,
    Bot,
};

use crate::{
    constructor::FormCommand,
    keyboard::{action_keyboard, welcome_keyboard},
    state::QuizState,
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "show the main menu.")]
    Start,
    #[command(description = "leave the current activity.")]
    Cancel,
    #[command(description = "log in to your account.")]
    Login,
    #[command(description = "create an account.")]
    Signup,
    #[command(description = "log out.")]
    Logout,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    let text = format!(
        "{}\n\nWhile building a quiz:\n{}",
        Command::descriptions(),
        FormCommand::descriptions()
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub(crate) async fn cancel(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Cancelling dialogue").await?;
    back_to_menu(bot, dialogue, msg).await
}

pub(crate) async fn start(bot: Bot, msg: Message, dialogue: UserDialogue) -> HandlerResult {
    back_to_menu(bot, dialogue, msg).await
}

pub(crate) async fn logout(bot: Bot, msg: Message, dialogue: UserDialogue) -> HandlerResult {
    dialogue.update(QuizState::Start).await?;
    bot.send_message(msg.chat.id, "You are logged out.")
        .reply_markup(welcome_keyboard())
        .await?;
    Ok(())
}

/// Keeps the session, if any, and shows the matching menu.
async fn back_to_menu(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    let session = dialogue
        .get()
        .await?
        .and_then(|state| state.session().cloned());

    match session {
        Some(session) => {
            bot.send_message(msg.chat.id, "Please choose what to do:")
                .reply_markup(action_keyboard(&session))
                .await?;
            dialogue.update(QuizState::Menu { session }).await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                "Welcome to QuizRise! Participate and gain knowledge here. Log in or sign up to begin.",
            )
            .reply_markup(welcome_keyboard())
            .await?;
            dialogue.update(QuizState::Start).await?;
        }
    }
    Ok(())
}
