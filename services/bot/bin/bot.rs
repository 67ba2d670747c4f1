//! Main Entrypoint for the Wanderlore Bot
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Constructing the capability clients and the session store.
//! 4. Starting Telegram long polling; ctrl-c stops the dispatcher.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use std::sync::Arc;
use teloxide::Bot;
use tracing::info;
use wanderlore_bot::{
    config::Config,
    telegram::{self, TelegramChat},
};
use wanderlore_core::{
    aggregate::CandidateAggregator,
    dispatch::{ChatPort, ResponseDispatcher},
    filter::InterestFilter,
    finder::NearbyFinder,
    llm::{LanguageModel, OpenAiChatModel},
    narrate::Narrator,
    pipeline::GuidePipeline,
    session::SessionStore,
    speech::{OpenAiSpeech, SpeechSynthesizer},
    suggest::{GeoSuggestClient, PlaceSuggest},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing capabilities...");

    // --- 3. Initialize Shared Capabilities ---
    let openai_config = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

    let model: Arc<dyn LanguageModel> = Arc::new(OpenAiChatModel::new(
        openai_config.clone(),
        config.chat_model.clone(),
    ));
    let speech: Option<Arc<dyn SpeechSynthesizer>> = if config.voice_replies {
        Some(Arc::new(OpenAiSpeech::new(openai_config, &config.voice))
            as Arc<dyn SpeechSynthesizer>)
    } else {
        None
    };
    let suggest: Arc<dyn PlaceSuggest> = Arc::new(GeoSuggestClient::new(
        config.geosuggest_base_url.clone(),
        config.geosuggest_api_key.clone(),
        config.suggest_lang.clone(),
    ));

    let sessions = SessionStore::new();
    let sweeper = sessions.spawn_sweeper();

    let bot = Bot::new(&config.telegram_token);
    let chat: Arc<dyn ChatPort> = Arc::new(TelegramChat::new(bot.clone()));

    let pipeline = Arc::new(GuidePipeline::new(
        sessions,
        CandidateAggregator::new(NearbyFinder::new(suggest)),
        InterestFilter::new(model.clone()),
        Narrator::new(model),
        ResponseDispatcher::new(chat.clone(), speech),
        chat,
    ));

    // --- 4. Start Long Polling ---
    info!(
        model = %config.chat_model,
        voice_replies = config.voice_replies,
        "Service configured. Starting long polling..."
    );
    telegram::run(bot, pipeline).await;

    sweeper.abort();
    info!("Bot has shut down.");
    Ok(())
}
