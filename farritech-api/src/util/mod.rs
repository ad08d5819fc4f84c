//! Utility modules.

pub mod dates;
pub mod html;
#[cfg(test)]
pub mod stub;
