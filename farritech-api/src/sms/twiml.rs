//! TwiML response rendering.

use crate::util::html::escape;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Render a `<Response>`; `None` (or an empty message) is the bare acknowledgement.
pub fn render(message: Option<&str>) -> String {
    match message.filter(|m| !m.is_empty()) {
        Some(text) => format!(
            "{XML_HEADER}<Response><Message>{}</Message></Response>",
            escape(text)
        ),
        None => format!("{XML_HEADER}<Response></Response>"),
    }
}
