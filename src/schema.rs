use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    payloads::SendMessageSetters,
    prelude::{DependencyMap, Requester},
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    api::{ApiClient, RetrieveQuiz, RetrieveResults},
    auth,
    authoring::AuthoringSession,
    commands::{cancel, help, logout, start, Command},
    constructor::{self, FormCommand},
    dashboard,
    keyboard::{
        action_keyboard, CREATE_QUIZ, MY_QUIZZES, MY_RESULTS, STATISTICS, TAKE_QUIZ,
    },
    runner,
    session::Session,
    state::QuizState,
    HandlerResult, UserDialogue,
};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel))
        .branch(case![Command::Login].endpoint(auth::login))
        .branch(case![Command::Signup].endpoint(auth::signup))
        .branch(case![Command::Logout].endpoint(logout));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(auth_scheme())
        .branch(case![QuizState::Menu { session }].endpoint(choose_what_to_do::<ApiClient>))
        .branch(constructor_scheme())
        .branch(running_scheme())
        .branch(dashboard_scheme())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

async fn choose_what_to_do<Api: RetrieveQuiz + RetrieveResults>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    session: Session,
    api: Arc<Api>,
) -> HandlerResult {
    match msg.text() {
        Some(TAKE_QUIZ) => {
            log::info!("{} chooses to take a quiz", session.username);
            runner::browse(bot, dialogue, msg, session, api).await?;
        }
        Some(MY_RESULTS) => {
            dashboard::my_results(bot, msg, session, api).await?;
        }
        Some(CREATE_QUIZ) => {
            log::info!("{} chooses to create a new quiz", session.username);
            constructor::start_authoring(bot, dialogue, msg, session, AuthoringSession::new())
                .await?;
        }
        Some(MY_QUIZZES) => {
            dashboard::my_quizzes(bot, dialogue, msg, session, api).await?;
        }
        Some(STATISTICS) => {
            dashboard::statistics(bot, msg, session, api).await?;
        }
        other => {
            log::info!("Invalid menu choice {:?} from {}", other, session.username);
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(action_keyboard(&session))
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "debug")]
fn auth_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    log::debug!("Building a dispatch tree for authentication");
    Update::filter_message()
        .branch(case![QuizState::Start].endpoint(auth::welcome))
        .branch(case![QuizState::ReceiveEmail].endpoint(auth::receive_email))
        .branch(
            case![QuizState::ReceivePassword { email }]
                .endpoint(auth::receive_password::<ApiClient>),
        )
        .branch(case![QuizState::ReceiveUsername].endpoint(auth::receive_username))
        .branch(case![QuizState::ReceiveRole { username }].endpoint(auth::receive_role))
        .branch(
            case![QuizState::ReceiveSignupEmail { username, role }]
                .endpoint(auth::receive_signup_email),
        )
        .branch(
            case![QuizState::ReceiveSignupPassword {
                username,
                role,
                email
            }]
            .endpoint(auth::receive_signup_password::<ApiClient>),
        )
}

#[instrument(level = "debug")]
fn constructor_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    log::debug!("Building a dispatch tree for the constructor");
    Update::filter_message().branch(
        case![QuizState::Authoring { session, authoring }]
            .branch(
                teloxide::filter_command::<FormCommand, _>()
                    .endpoint(constructor::receive_form_command::<ApiClient>),
            )
            .endpoint(constructor::receive_chat),
    )
}

#[instrument(level = "debug")]
fn running_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    log::debug!("Building a dispatch tree for the runner");
    Update::filter_message()
        .branch(case![QuizState::Taking { session, flow }].endpoint(runner::selection::<ApiClient>))
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    log::debug!("Building a dispatch tree for callback queries");
    Update::filter_callback_query()
        .branch(case![QuizState::Taking { session, flow }].endpoint(runner::take_answer::<ApiClient>))
        .endpoint(runner::stale_callback)
}

#[instrument(level = "debug")]
fn dashboard_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    log::debug!("Building a dispatch tree for the dashboard");
    Update::filter_message()
        .branch(case![QuizState::MyQuizzes { session, quizzes }].endpoint(dashboard::select_quiz))
        .branch(
            case![QuizState::HandleQuiz { session, quiz }]
                .endpoint(dashboard::handle_quiz::<ApiClient>),
        )
        .branch(
            case![QuizState::ConfirmDelete { session, quiz }]
                .endpoint(dashboard::confirm_delete::<ApiClient>),
        )
}

#[instrument(level = "info")]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    log::info!("{:?}: invalid input {:?}", msg.chat.username(), msg.text());
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
