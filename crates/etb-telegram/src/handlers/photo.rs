use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use teloxide::{net::Download, prelude::*};

use etb_core::{
    clock::Stamp,
    domain::{author_display, ChatId, MessageRef, PhotoUpload},
    errors::Error,
    formatting::escape_html,
};

use crate::router::AppState;

static PHOTO_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Download the largest available size of the photo through the temp dir and
/// return its bytes.
async fn download_photo(
    bot: &Bot,
    state: &AppState,
    photos: &[teloxide::types::PhotoSize],
) -> anyhow::Result<Vec<u8>> {
    let best = photos
        .last()
        .ok_or_else(|| anyhow::anyhow!("no photo sizes"))?;
    let file = bot.get_file(best.file.id.clone()).await?;

    let n = PHOTO_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = state
        .cfg
        .temp_dir
        .join(format!("photo_{}_{n}.jpg", std::process::id()));

    let mut dst = tokio::fs::File::create(&path).await?;
    bot.download_file(&file.path, &mut dst).await?;
    drop(dst);

    let bytes = tokio::fs::read(&path).await?;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(bytes)
}

pub async fn handle_photo(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(photos) = msg.photo() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    let Some(ingestor) = state.ingestor.clone() else {
        let _ = state
            .messenger
            .send_html(chat_id, "❌ Загрузка фото не настроена")
            .await;
        return Ok(());
    };

    let status = state
        .messenger
        .send_html(chat_id, "⏳ Загрузка фото...")
        .await
        .ok();

    let bytes = match download_photo(&bot, &state, photos).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("photo download failed: {e}");
            report(&state, chat_id, status, "❌ Ошибка обработки фото").await;
            return Ok(());
        }
    };

    let upload = PhotoUpload {
        author: author_display(
            user.username.as_deref(),
            &user.first_name,
            user.last_name.as_deref(),
            user.id.0,
        ),
        stamp: Stamp::now(state.cfg.timezone_offset_hours),
        bytes,
    };

    match ingestor.ingest(upload).await {
        Ok(receipt) => {
            tracing::info!("photo stored at row {} ({})", receipt.row, receipt.url);
            let body = format!("✅ Фото сохранено!\n🔗 {}", escape_html(&receipt.url));
            report(&state, chat_id, status, &body).await;
        }
        Err(Error::UploadFailed(e)) => {
            tracing::error!("photo upload failed: {e}");
            report(&state, chat_id, status, "❌ Не удалось загрузить фото").await;
        }
        Err(e) => {
            // The blob is durable but the row write failed; it stays orphaned.
            tracing::error!("photo append failed: {e}");
            report(&state, chat_id, status, "❌ Фото в облаке, но ошибка записи в таблицу").await;
        }
    }

    Ok(())
}

/// Edit the status message with the outcome, falling back to a fresh send.
async fn report(state: &AppState, chat_id: ChatId, status: Option<MessageRef>, html: &str) {
    match status {
        Some(m) => {
            if state.messenger.edit_html(m, html).await.is_err() {
                let _ = state.messenger.send_html(chat_id, html).await;
            }
        }
        None => {
            let _ = state.messenger.send_html(chat_id, html).await;
        }
    }
}
