use std::sync::Arc;

use teloxide::prelude::*;

use etb_core::{
    clock::Stamp,
    domain::{author_display, ChatId, ExpenseEntry},
    formatting::escape_html,
    ledger::confirmation,
    parser::parse_expense_line,
};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    // User-input rejections get a corrective hint; nothing is written.
    let parsed = match parse_expense_line(text) {
        Ok(p) => p,
        Err(e) => {
            let _ = state.messenger.send_html(chat_id, e.user_message()).await;
            return Ok(());
        }
    };

    let author = author_display(
        user.username.as_deref(),
        &user.first_name,
        user.last_name.as_deref(),
        user.id.0,
    );
    let stamp = Stamp::now(state.cfg.timezone_offset_hours);
    let entry = ExpenseEntry::text(author, stamp, parsed.amount, parsed.category);

    match state.ledger.append(&entry).await {
        Ok(row) => {
            tracing::info!("expense appended at row {row} for {}", entry.author);
            let _ = state
                .messenger
                .send_html(chat_id, &escape_html(&confirmation(&entry)))
                .await;
        }
        Err(e) => {
            tracing::error!("append failed for {}: {e}", entry.author);
            let _ = state.messenger.send_html(chat_id, e.user_message()).await;
        }
    }

    Ok(())
}
