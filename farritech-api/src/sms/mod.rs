//! Inbound SMS reply handling.
//!
//! ## Processing Flow
//!
//! ```text
//! From/Body → Keyword::classify + phone::candidates → process_reply() → Reply → twiml::render
//! ```

pub mod keyword;
pub mod phone;
pub mod reply;
pub mod twiml;

pub use keyword::Keyword;
pub use reply::{process_reply, Reply};
