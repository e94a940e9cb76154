use std::sync::Arc;

use teloxide::prelude::*;

use etb_core::{
    clock::Stamp,
    domain::ChatId,
    formatting::escape_html,
    messaging::types::ReplyKeyboard,
};

use crate::router::AppState;

/// Reserved reply-keyboard label; routed as an alias for /status.
pub const STATUS_BUTTON_LABEL: &str = "📊 Статус";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    let (cmd, _arg) = parse_command(text);

    match cmd.as_str() {
        "start" => {
            let body = "📊 <b>Бот учёта расходов</b>\n\n\
Отправьте сообщение вида <code>150 Кофе</code> — запись попадёт в таблицу.\n\
Отправьте фото — оно сохранится в облаке и появится в таблице строкой с суммой 0.\n\n\
<b>Команды:</b>\n\
/start — это сообщение\n\
/help — справка по формату\n\
/status — состояние подключений";
            let _ = state
                .messenger
                .send_with_keyboard(chat_id, body, ReplyKeyboard::single(STATUS_BUTTON_LABEL))
                .await;
            Ok(())
        }

        "help" => {
            let body = "💡 <b>Как записать расход</b>\n\n\
Формат: <code>&lt;сумма&gt; &lt;категория&gt;</code>\n\
Примеры: <code>150 Кофе</code>, <code>99,90 такси</code>\n\n\
Сумма — положительное число (точка или запятая),\n\
категория — любой текст.\n\n\
Фото сохраняется с суммой 0 и категорией «фото».";
            let _ = state.messenger.send_html(chat_id, body).await;
            Ok(())
        }

        "status" => send_status(&state, chat_id).await,

        _ => {
            let reply = format!("Неизвестная команда: /{}", escape_html(&cmd));
            let _ = state.messenger.send_html(chat_id, &reply).await;
            Ok(())
        }
    }
}

/// Current local date/time plus connectivity probes for the two stores.
pub async fn send_status(state: &AppState, chat_id: ChatId) -> ResponseResult<()> {
    let stamp = Stamp::now(state.cfg.timezone_offset_hours);

    let sheets = match state.ledger.probe().await {
        Ok(()) => "✅",
        Err(e) => {
            tracing::warn!("sheets probe failed: {e}");
            "❌"
        }
    };

    let blob = match &state.ingestor {
        Some(ingestor) => match ingestor.probe().await {
            Ok(()) => "✅",
            Err(e) => {
                tracing::warn!("blob store probe failed: {e}");
                "❌"
            }
        },
        None => "⚠️ не настроено",
    };

    let body = format!(
        "📊 <b>Статус</b>\n🕒 {} {}\nТаблица: {sheets}\nОблако: {blob}",
        stamp.date_display(),
        stamp.time_display(),
    );
    let _ = state.messenger.send_html(chat_id, &body).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_slash_and_bot_mention() {
        assert_eq!(parse_command("/start"), ("start".into(), "".into()));
        assert_eq!(parse_command("/status@etb_bot"), ("status".into(), "".into()));
        assert_eq!(parse_command("/HELP extra args"), ("help".into(), "extra args".into()));
    }

    #[test]
    fn status_label_is_not_a_command() {
        // The label routes through the alias branch, never through the parser.
        assert!(!STATUS_BUTTON_LABEL.starts_with('/'));
    }
}
