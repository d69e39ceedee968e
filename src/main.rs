//! PhaseBot Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{info, warn};

use phasebot::{
    commands::CommandRegistry,
    config::Settings,
    dispatch::{DispatchEngine, HintFallback},
    handlers::handle_message,
    messaging::{Messenger, OutboundMessage, TeloxideMessenger},
    state::ContextStore,
    utils::logging,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", phasebot::info());

    let bot = Bot::new(&settings.bot.token);
    let messenger: Arc<dyn Messenger> = Arc::new(TeloxideMessenger::new(bot.clone()));

    let mut registry = CommandRegistry::new();
    registry.register(feedback::command()?);
    info!(commands = registry.len(), "Commands registered");

    let store = match settings.engine.context_ttl()? {
        Some(ttl) => ContextStore::with_ttl(ttl),
        None => ContextStore::new(),
    };
    if store.ttl().is_some() {
        spawn_cleanup(store.clone(), Duration::from_secs(settings.engine.cleanup_interval_seconds));
    }

    let engine = Arc::new(
        DispatchEngine::new(
            Arc::new(registry),
            store,
            messenger,
            settings.messages.clone(),
        )
        .with_fallback(Arc::new(HintFallback::new(OutboundMessage::text(
            "Send /help to see what I can do.",
        )))),
    );
    let messages = Arc::new(settings.messages.clone());

    let handler = Update::filter_message().endpoint(handle_message);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine, messages])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Starting bot with polling mode...");
    dispatcher.dispatch().await;

    info!("PhaseBot has been shut down.");
    Ok(())
}

/// Periodically drop conversations that outlived their TTL
fn spawn_cleanup(store: ContextStore, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            store.cleanup_expired();
        }
    });
}

/// Sample two-phase command: a rating followed by a free-text comment
mod feedback {
    use async_trait::async_trait;
    use tracing::info;

    use phasebot::{
        commands::{CommandDefinition, Phase, PhaseDefinition, Scope, START_PHASE},
        dispatch::InboundMessage,
        messaging::OutboundMessage,
        state::ConversationContext,
        Result,
    };

    struct Rating;

    #[async_trait]
    impl Phase for Rating {
        async fn init(
            &self,
            ctx: &mut ConversationContext,
            _msg: &InboundMessage,
            _tokens: &[String],
        ) -> anyhow::Result<()> {
            let rows = vec![(1..=5).map(|n| n.to_string()).collect()];
            ctx.send_message(&OutboundMessage::keyboard("How would you rate me, 1 to 5?", rows))
                .await?;
            Ok(())
        }

        fn validate_input(
            &self,
            _ctx: &ConversationContext,
            _msg: &InboundMessage,
            tokens: &[String],
        ) -> bool {
            matches!(tokens.first().map(|t| t.parse::<u8>()), Some(Ok(1..=5)))
        }

        async fn on_valid_input(
            &self,
            ctx: &mut ConversationContext,
            _msg: &InboundMessage,
            tokens: &[String],
        ) -> anyhow::Result<()> {
            ctx.store_variable("rating", tokens[0].parse::<u8>()?)?;
            Ok(())
        }
    }

    struct Comment;

    #[async_trait]
    impl Phase for Comment {
        async fn on_valid_input(
            &self,
            ctx: &mut ConversationContext,
            msg: &InboundMessage,
            _tokens: &[String],
        ) -> anyhow::Result<()> {
            let rating = ctx.get_i64("rating").unwrap_or_default();
            info!(
                user_id = ctx.user_id(),
                rating = rating,
                comment = msg.text.as_deref().unwrap_or_default(),
                "Feedback received"
            );
            ctx.send_message(&OutboundMessage::text("Thanks for the feedback!"))
                .await?;
            Ok(())
        }
    }

    pub fn command() -> Result<CommandDefinition> {
        CommandDefinition::builder("/feedback")
            .help("Tell me how I'm doing")
            .scope(Scope::Private)
            .phase(
                START_PHASE,
                PhaseDefinition::new(Rating)
                    .next("comment")
                    .error_message(OutboundMessage::text(
                        "Please answer with a number from 1 to 5",
                    )),
            )
            .phase(
                "comment",
                PhaseDefinition::new(Comment)
                    .start_message(OutboundMessage::text("Anything you'd like to add?")),
            )
            .build()
    }
}
