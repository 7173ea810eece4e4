mod compliments;
mod config;

use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;

use chrono::{TimeDelta, Utc};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;

use compliments::{
    AdminAuthority, AtomicFile, BotText, CommandRouter, ComplimentError, ComplimentStore, Inbound,
    Outcome, Session, TelegramGateway, TransportBackoff,
};
use config::{Config, TOKEN_ENV};

struct BotState {
    router: Mutex<CommandRouter>,
    gateway: TelegramGateway,
}

impl BotState {
    fn new(config: &Config, bot: &Bot) -> Result<Self, compliments::PersistError> {
        let store = ComplimentStore::load(Box::new(AtomicFile::new(config.queue_path())))?;
        let admin = AdminAuthority::load(Box::new(AtomicFile::new(config.admin_path())))?;
        let text = BotText {
            button: config.button_text.clone(),
            usage: config.usage_text.clone(),
        };
        let session = Session::new(text, TimeDelta::minutes(i64::from(config.cooldown_minutes)));

        Ok(Self {
            router: Mutex::new(CommandRouter::new(store, admin, session)),
            gateway: TelegramGateway::new(bot.clone()),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "lovebot.json".to_string());
    let config = match Config::load(&config_path, std::env::var(TOKEN_ENV).ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("lovebot.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting lovebot...");
    info!("Loaded config from {config_path}");
    info!("Cooldown: {} min, data dir: {:?}", config.cooldown_minutes, config.data_dir);

    let bot = Bot::new(&config.telegram_bot_token);
    let state = match BotState::new(&config, &bot) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            // Return so the log guard flushes.
            error!("Failed to load state: {e}");
            return ExitCode::FAILURE;
        }
    };

    {
        let router = state.router.lock().await;
        info!(
            "{} compliments in stock, admin: {:?}, trigger: {:?}",
            router.store().count(),
            router.admin().admin(),
            router.session().text.button
        );
    }

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    let listener = Polling::builder(bot.clone()).delete_webhook().await.build();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|update| async move {
            debug!("Ignoring update {}", update.id.0);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("Error in message handler"))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(listener, Arc::new(TransportBackoff))
        .await;

    info!("Stopped");
    ExitCode::SUCCESS
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    let inbound = Inbound {
        chat_id: msg.chat.id.0,
        text: text.to_string(),
    };

    // Classification, mutation and persistence happen under one lock. The
    // delivery turn is taken before it is released so replies leave in
    // mutation order.
    let (handled, turn) = {
        let mut router = state.router.lock().await;
        let handled = router.handle(&inbound, Utc::now());
        (handled, state.gateway.turn().await)
    };

    let chat_id = inbound.chat_id;
    match &handled.outcome {
        Outcome::Done => info!("{} from {chat_id}: ok", handled.command),
        Outcome::Blocked(remaining) => {
            info!("{} from {chat_id}: cooling down, {}s left", handled.command, remaining.num_seconds())
        }
        Outcome::Rejected(ComplimentError::Persistence(e)) => {
            error!("{} from {chat_id}: {e}", handled.command)
        }
        Outcome::Rejected(e) => info!("{} from {chat_id}: rejected, {e}", handled.command),
    }

    let failed = turn.deliver_all(&handled.replies).await;
    if failed > 0 {
        warn!("{failed} of {} replies for {chat_id} were not delivered", handled.replies.len());
    }

    Ok(())
}
