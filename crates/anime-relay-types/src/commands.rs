//! Notifications published to the relay via NATS
//!
//! The `type` field selects the variant; every other field is camelCase.
//! Tags the relay does not know decode into [`Notification::Unknown`].

use serde::{Deserialize, Serialize};

/// Anime descriptor attached to start, list and inline query notifications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineAnime {
    pub internal_id: i64,
    pub name: String,
    pub thumbnail_url: String,
    #[serde(default)]
    pub user_has_subscription: bool,
}

/// Greeting, optionally replaced by an anime card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartNotification {
    pub telegram_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_anime: Option<InlineAnime>,
}

/// Plain text echo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextNotification {
    pub telegram_id: i64,
    pub text: String,
}

/// Search results for an inline query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineQueryNotification {
    pub inline_query_id: String,
    #[serde(default)]
    pub inline_animes: Vec<InlineAnime>,
}

/// A subscribe/unsubscribe button was pressed on `message_id` in `telegram_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionNotification {
    pub telegram_id: i64,
    pub message_id: i64,
    pub callback_query_id: String,
    pub anime_id: i64,
}

/// Text followed by one keyboard row per anime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnimeListNotification {
    pub telegram_id: i64,
    pub text: String,
    #[serde(default)]
    pub inline_animes: Vec<InlineAnime>,
}

/// Inbound notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "startType")]
    Start(StartNotification),
    #[serde(rename = "defaultType")]
    Default(TextNotification),
    #[serde(rename = "answerInlineQueryType")]
    AnswerInlineQuery(InlineQueryNotification),
    #[serde(rename = "subscribeType")]
    Subscribe(SubscriptionNotification),
    #[serde(rename = "unsubscribeType")]
    Unsubscribe(SubscriptionNotification),
    #[serde(rename = "setWebhookType")]
    SetWebhook,
    #[serde(rename = "animesType")]
    Animes(AnimeListNotification),
    #[serde(rename = "subscriptionsType")]
    Subscriptions(AnimeListNotification),
    /// Any tag not listed above
    #[serde(other)]
    Unknown,
}

impl Notification {
    /// Decode a raw bus payload
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Default(_) => "default",
            Self::AnswerInlineQuery(_) => "answer_inline_query",
            Self::Subscribe(_) => "subscribe",
            Self::Unsubscribe(_) => "unsubscribe",
            Self::SetWebhook => "set_webhook",
            Self::Animes(_) => "animes",
            Self::Subscriptions(_) => "subscriptions",
            Self::Unknown => "unknown",
        }
    }
}
