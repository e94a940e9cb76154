/// Core error type for the expense relay bot.
///
/// Adapter crates map their specific errors into this type so handlers can
/// decide in one place what the submitter sees vs. what is only logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Rejections caused by the submitter's own input.
    #[error("malformed input: expected \"<amount> <category>\"")]
    MalformedInput,

    #[error("amount is not a number")]
    NotANumber,

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("category is empty")]
    EmptyCategory,

    // Remote store failures.
    #[error("tabular store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("blob upload failed: {0}")]
    UploadFailed(String),

    /// Cosmetic cell styling failure; never shown to the submitter.
    #[error("cell formatting failed: {0}")]
    FormattingFailed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True for rejections the submitter can fix by rephrasing the message.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::MalformedInput | Error::NotANumber | Error::NonPositiveAmount | Error::EmptyCategory
        )
    }

    /// Reply text shown to the submitter for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::MalformedInput => "❌ Формат: <сумма> <категория>",
            Error::NotANumber => "❌ Сумма должна быть числом",
            Error::NonPositiveAmount => "❌ Сумма должна быть больше нуля",
            Error::EmptyCategory => "❌ Укажите категорию после суммы",
            Error::StoreUnavailable(_) => "❌ Ошибка подключения к таблице",
            Error::UploadFailed(_) => "❌ Не удалось загрузить фото",
            _ => "❌ Произошла ошибка при сохранении",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_input_errors_are_classified() {
        assert!(Error::MalformedInput.is_user_input());
        assert!(Error::NonPositiveAmount.is_user_input());
        assert!(!Error::StoreUnavailable("down".into()).is_user_input());
        assert!(!Error::UploadFailed("no url".into()).is_user_input());
    }

    #[test]
    fn every_user_facing_error_has_a_hint() {
        let errors = [
            Error::MalformedInput,
            Error::NotANumber,
            Error::NonPositiveAmount,
            Error::EmptyCategory,
            Error::StoreUnavailable("x".into()),
            Error::UploadFailed("x".into()),
        ];
        for e in errors {
            assert!(e.user_message().starts_with('❌'));
        }
    }
}
