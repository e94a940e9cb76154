/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub supports_edit: bool,
    pub supports_reply_keyboards: bool,
    pub max_message_len: usize,
}

/// A persistent reply keyboard: rows of plain-text button labels.
#[derive(Clone, Debug, Default)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    /// Convenience for a keyboard with a single button.
    pub fn single(label: &str) -> Self {
        Self {
            rows: vec![vec![label.to_string()]],
        }
    }
}
