use crate::clock::Stamp;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Category label written for photo rows; `amount = 0` is the matching
/// sentinel in the amount column.
pub const PHOTO_CATEGORY: &str = "фото";

/// One user-submitted financial record, mapped onto a single sheet row and
/// then discarded. The tabular store is the system of record.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseEntry {
    pub author: String,
    pub stamp: Stamp,
    pub amount: f64,
    pub category: String,
    pub attachment_url: Option<String>,
}

impl ExpenseEntry {
    pub fn text(author: String, stamp: Stamp, amount: f64, category: String) -> Self {
        Self {
            author,
            stamp,
            amount,
            category,
            attachment_url: None,
        }
    }

    pub fn photo(author: String, stamp: Stamp, url: String) -> Self {
        Self {
            author,
            stamp,
            amount: 0.0,
            category: PHOTO_CATEGORY.to_string(),
            attachment_url: Some(url),
        }
    }

    pub fn is_photo(&self) -> bool {
        self.attachment_url.is_some()
    }
}

/// Binary photo payload plus the metadata derived at receipt time. Consumed
/// exactly once by the blob store upload.
#[derive(Clone, Debug)]
pub struct PhotoUpload {
    pub author: String,
    pub stamp: Stamp,
    pub bytes: Vec<u8>,
}

/// Display identifier for a submitter: `@username`, else "first last",
/// else `id_<numeric id>`; the first non-empty wins.
pub fn author_display(
    username: Option<&str>,
    first_name: &str,
    last_name: Option<&str>,
    id: u64,
) -> String {
    if let Some(u) = username {
        if !u.trim().is_empty() {
            return format!("@{u}");
        }
    }

    let full = match last_name {
        Some(l) if !l.trim().is_empty() => format!("{first_name} {l}"),
        _ => first_name.to_string(),
    };
    let full = full.trim();
    if !full.is_empty() {
        return full.to_string();
    }

    format!("id_{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_wins_over_full_name() {
        assert_eq!(author_display(Some("vasya"), "Ivan", Some("Petrov"), 7), "@vasya");
    }

    #[test]
    fn full_name_when_no_username() {
        assert_eq!(author_display(None, "Ivan", Some("Petrov"), 7), "Ivan Petrov");
        assert_eq!(author_display(Some(""), "Ivan", None, 7), "Ivan");
    }

    #[test]
    fn synthetic_id_when_everything_is_empty() {
        assert_eq!(author_display(None, "", None, 12345), "id_12345");
        assert_eq!(author_display(None, "  ", Some(" "), 9), "id_9");
    }

    #[test]
    fn photo_entry_uses_zero_sentinel_and_fixed_label() {
        let stamp = Stamp::from_utc(
            chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            3,
        );
        let e = ExpenseEntry::photo("@u".into(), stamp, "https://cdn.example/x.jpg".into());
        assert_eq!(e.amount, 0.0);
        assert_eq!(e.category, PHOTO_CATEGORY);
        assert!(e.is_photo());
    }
}
