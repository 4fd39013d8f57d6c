use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod api;
pub mod attempt;
pub mod auth;
pub mod authoring;
pub mod commands;
pub mod config;
pub mod constructor;
pub mod dashboard;
pub mod draft;
pub mod error;
pub mod keyboard;
pub mod quiz;
pub mod runner;
pub mod schema;
pub mod session;
pub mod state;
pub mod stats;
pub mod wizard;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
