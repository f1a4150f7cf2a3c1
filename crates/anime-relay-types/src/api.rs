//! Telegram Bot API request bodies sent by the relay

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keyboard::InlineKeyboardMarkup;

/// Bot API method the relay calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotMethod {
    SendMessage,
    SendPhoto,
    AnswerCallbackQuery,
    AnswerInlineQuery,
    EditMessageReplyMarkup,
    SetWebhook,
}

impl BotMethod {
    /// Method name as it appears in the endpoint URL
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage => "sendMessage",
            Self::SendPhoto => "sendPhoto",
            Self::AnswerCallbackQuery => "answerCallbackQuery",
            Self::AnswerInlineQuery => "answerInlineQuery",
            Self::EditMessageReplyMarkup => "editMessageReplyMarkup",
            Self::SetWebhook => "setWebhook",
        }
    }

    /// Suffix appended to `{base_url}{token}`
    pub fn path(&self) -> String {
        format!("/{}", self.name())
    }
}

impl fmt::Display for BotMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `sendMessage`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessage {
    /// Create a simple text message
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_markup: None,
        }
    }

    /// Add inline keyboard buttons
    pub fn with_buttons(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

/// `sendPhoto` with the photo given by URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendPhoto {
    pub chat_id: i64,
    pub photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// `answerCallbackQuery`; an empty acknowledgement unless `text` is set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `editMessageReplyMarkup`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditMessageReplyMarkup {
    pub chat_id: i64,
    pub message_id: i64,
    pub reply_markup: InlineKeyboardMarkup,
}

/// `answerInlineQuery`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<InlineQueryResult>,
    pub cache_time: u32,
}

/// Inline query result types the relay produces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineQueryResult {
    Article(InlineQueryResultArticle),
}

/// Inline query result article (text-based result)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineQueryResultArticle {
    pub id: String,
    pub title: String,
    pub input_message_content: InputMessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Input message content for inline results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputMessageContent {
    pub message_text: String,
}
