//! Inbound SMS keyword classification.

/// Recognized reply keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Stop,
    Start,
    Confirm,
    Help,
    Unknown,
}

impl Keyword {
    /// Classify a message body. The whole trimmed body must equal a keyword,
    /// ignoring case; there is no partial or synonym matching.
    pub fn classify(body: &str) -> Self {
        let reply = body.trim();
        if reply.eq_ignore_ascii_case("STOP") {
            Keyword::Stop
        } else if reply.eq_ignore_ascii_case("START") {
            Keyword::Start
        } else if reply.eq_ignore_ascii_case("CONFIRM") {
            Keyword::Confirm
        } else if reply.eq_ignore_ascii_case("HELP") {
            Keyword::Help
        } else {
            Keyword::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Stop => "stop",
            Keyword::Start => "start",
            Keyword::Confirm => "confirm",
            Keyword::Help => "help",
            Keyword::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(Keyword::classify("stop"), Keyword::Stop);
        assert_eq!(Keyword::classify("  Start \n"), Keyword::Start);
        assert_eq!(Keyword::classify("CONFIRM"), Keyword::Confirm);
        assert_eq!(Keyword::classify("hElP"), Keyword::Help);
    }

    #[test]
    fn test_classify_requires_exact_match() {
        assert_eq!(Keyword::classify("confirm please"), Keyword::Unknown);
        assert_eq!(Keyword::classify("STOPP"), Keyword::Unknown);
        assert_eq!(Keyword::classify("yes"), Keyword::Unknown);
        assert_eq!(Keyword::classify(""), Keyword::Unknown);
    }
}
