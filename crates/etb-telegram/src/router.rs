use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*,
    update_listeners::webhooks,
};

use etb_core::{
    config::Config, ingest::PhotoIngestor, ledger::Ledger, messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

/// Shared dependencies handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub ledger: Arc<Ledger>,
    pub ingestor: Option<Arc<PhotoIngestor>>,
}

/// Run the bot: long-polling by default, the webhook listener when
/// `WEBHOOK_URL` is configured.
pub async fn run(
    cfg: Arc<Config>,
    ledger: Arc<Ledger>,
    ingestor: Option<Arc<PhotoIngestor>>,
) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(cfg.http_timeout)
        .timeout(cfg.http_timeout)
        .build()?;
    let bot = Bot::with_client(cfg.telegram_bot_token.clone(), client);

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        tracing::info!("etb started: @{}", me.username());
    }
    if cfg.cloudinary.is_none() {
        tracing::warn!("Cloudinary credentials not configured; photo uploads disabled");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        messenger,
        ledger,
        ingestor,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .build();

    match &cfg.webhook_url {
        Some(raw) => {
            let url = raw.parse::<reqwest::Url>()?;
            let addr = ([0, 0, 0, 0], cfg.port).into();
            // One JSON update per POST; the listener acknowledges parsed
            // updates and rejects malformed envelopes on its own, so handler
            // failures never reach the transport.
            let listener = webhooks::axum(bot, webhooks::Options::new(addr, url)).await?;
            tracing::info!("webhook listener on port {}", cfg.port);
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook update failed"),
                )
                .await;
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}
