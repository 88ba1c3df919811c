//! Utility functions.

pub mod env;
pub mod format;
pub mod time;

pub use format::{format_cost, format_percent, format_tokens};
pub use time::{countdown_label, parse_rfc3339, period_label};
