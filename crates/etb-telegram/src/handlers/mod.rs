//! Telegram update handlers.
//!
//! Each handler validates its input, calls into `etb-core`, and replies.
//! Business failures become reply messages; nothing here returns an error to
//! the dispatcher, so the transport acknowledgment is always well-formed.

use std::sync::Arc;

use teloxide::prelude::*;

use etb_core::domain::ChatId;

use crate::router::AppState;

mod commands;
mod photo;
mod text;

pub use commands::STATUS_BUTTON_LABEL;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(t) = msg.text() {
        if t.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
        // Reserved keyboard label: alias for /status.
        if t.trim() == STATUS_BUTTON_LABEL {
            let chat_id = ChatId(msg.chat.id.0);
            return commands::send_status(&state, chat_id).await;
        }
        return text::handle_text(msg, state).await;
    }

    if msg.photo().is_some() {
        return photo::handle_photo(bot, msg, state).await;
    }

    // Voice, stickers, documents: not part of the surface; ignore.
    tracing::debug!("ignoring unsupported message type in chat {}", msg.chat.id);
    Ok(())
}
