//! Shared types for the anime notification relay
//!
//! This crate holds everything that crosses a process boundary: the
//! notifications published on NATS, the Telegram Bot API payloads the
//! relay sends, the inline keyboard model and the callback token format
//! that round-trips through button presses.

pub mod api;
pub mod commands;
pub mod errors;
pub mod keyboard;

// Re-export commonly used types
pub use api::*;
pub use commands::*;
pub use errors::{ErrorKind, RelayErrorEvent};
pub use keyboard::{CallbackAction, InlineKeyboardButton, InlineKeyboardMarkup, ParseCallbackError};
