use std::sync::Arc;

use quizrisebot::{api::ApiClient, config::Config, schema::schema, state::QuizState};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_level(config.log_level))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install the tracing subscriber: {}", e);
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to forward log records: {}", e);
    }

    let api = Arc::new(ApiClient::new(config.api_base_url.clone()));
    log::info!("Quiz API at {}", api.base());

    let bot = Bot::new(config.teloxide_token.clone());
    let webhook = config.webhook.clone();
    let config = Arc::new(config);
    log::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![InMemStorage::<QuizState>::new(), api, config])
        .enable_ctrlc_handler()
        .build();

    match webhook {
        Some((url, addr)) => match webhooks::axum(bot, Options::new(addr, url)).await {
            Ok(listener) => {
                dispatcher
                    .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
                    .await
            }
            Err(e) => log::error!("Failed to build a webhook listener: {}", e),
        },
        None => dispatcher.dispatch().await,
    }
}
