//! Telegram Transport
//!
//! Inbound side: long polling for location shares, live-location edits and
//! the two commands. Outbound side: `TelegramChat` implements the core's
//! `ChatPort` so the pipeline never sees teloxide types. Handler errors are
//! logged by the dispatcher's top-level error handler and never crash the
//! process.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Location,
};
use teloxide::utils::command::BotCommands;
use tracing::debug;
use url::Url;
use wanderlore_core::dispatch::ChatPort;
use wanderlore_core::pipeline::{GuidePipeline, LocationEventKind};
use wanderlore_core::place::Coordinate;
use wanderlore_core::session::UserId;

const WELCOME: &str = "Share your location — or turn on live location — and I'll tell you \
about the most interesting place within reach.";
const HELP: &str = "Send me a location (the paperclip → Location) and I'll find the closest \
place worth a story and tell it. With live location on, I'll keep an eye out as you walk. \
I pause for a minute between stories, and I won't repeat a place within an hour.";

/// `ChatPort` implementation over the Telegram Bot API.
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatPort for TelegramChat {
    async fn send_text(&self, user: UserId, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(user), text).await?;
        Ok(())
    }

    async fn send_text_with_link(
        &self,
        user: UserId,
        text: &str,
        label: &str,
        url: &str,
    ) -> Result<()> {
        let url = Url::parse(url)?;
        let keyboard = InlineKeyboardMarkup::new([[InlineKeyboardButton::url(label, url)]]);
        self.bot
            .send_message(ChatId(user), text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn send_voice(&self, user: UserId, audio: &Path) -> Result<()> {
        self.bot
            .send_voice(ChatId(user), InputFile::file(audio.to_path_buf()))
            .await?;
        Ok(())
    }

    async fn send_typing(&self, user: UserId) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(user), ChatAction::Typing)
            .await?;
        Ok(())
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    #[command(description = "what this bot does.")]
    Start,
    #[command(description = "how to use the guide.")]
    Help,
}

/// Runs the dispatcher until ctrl-c.
pub async fn run(bot: Bot, pipeline: Arc<GuidePipeline>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.location().is_some())
                .endpoint(on_location),
        )
        .branch(
            Update::filter_edited_message()
                .filter(|msg: Message| msg.location().is_some())
                .endpoint(on_live_update),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .default_handler(|update| async move {
            debug!(update_id = update.id.0, "ignoring unsupported update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Failed to handle update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_command(bot: Bot, msg: Message, command: Command) -> Result<()> {
    let text = match command {
        Command::Start => WELCOME,
        Command::Help => HELP,
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn on_location(msg: Message, pipeline: Arc<GuidePipeline>) -> Result<()> {
    handle(msg, pipeline, LocationEventKind::Shared).await
}

async fn on_live_update(msg: Message, pipeline: Arc<GuidePipeline>) -> Result<()> {
    handle(msg, pipeline, LocationEventKind::LiveUpdate).await
}

async fn handle(
    msg: Message,
    pipeline: Arc<GuidePipeline>,
    kind: LocationEventKind,
) -> Result<()> {
    let Some(location) = msg.location() else {
        return Ok(());
    };
    pipeline
        .handle_location(msg.chat.id.0, coordinate(location), kind)
        .await
}

fn coordinate(location: &Location) -> Coordinate {
    Coordinate::new(location.latitude, location.longitude)
}
