//! Inline keyboards and the subscribe/unsubscribe callback token

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const SUBSCRIBE_VERB: &str = "sub";
const UNSUBSCRIBE_VERB: &str = "unsub";

/// Inline keyboard button.
///
/// Carries either a callback token or an external URL, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    /// Button that sends `data` back to the bot when pressed
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// Button that opens `url`
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// Inline keyboard markup: ordered rows of ordered buttons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Create a new inline keyboard with rows of buttons
    pub fn new(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    /// Keyboard with exactly one row holding exactly one button
    pub fn single(button: InlineKeyboardButton) -> Self {
        Self::new(vec![vec![button]])
    }
}

/// Action encoded in a subscribe/unsubscribe button's callback data.
///
/// Rendered as `"sub <id>"` or `"unsub <id>"`. The component that turns
/// callback queries back into notifications parses the same format, so
/// any change here is a breaking wire change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackAction {
    Subscribe(i64),
    Unsubscribe(i64),
}

impl CallbackAction {
    /// The action a user should be offered given their current state
    pub fn toggle_for(has_subscription: bool, anime_id: i64) -> Self {
        if has_subscription {
            Self::Unsubscribe(anime_id)
        } else {
            Self::Subscribe(anime_id)
        }
    }

    pub fn anime_id(&self) -> i64 {
        match self {
            Self::Subscribe(id) | Self::Unsubscribe(id) => *id,
        }
    }

    /// Button label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Self::Subscribe(_) => "subscribe",
            Self::Unsubscribe(_) => "unsubscribe",
        }
    }

    /// Labelled button carrying this action as its callback token
    pub fn button(&self) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(self.label(), self.to_string())
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe(id) => write!(f, "{SUBSCRIBE_VERB} {id}"),
            Self::Unsubscribe(id) => write!(f, "{UNSUBSCRIBE_VERB} {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCallbackError {
    MissingSeparator(String),
    UnknownVerb(String),
    InvalidId(String),
}

impl fmt::Display for ParseCallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator(raw) => write!(f, "callback token '{raw}' has no separator"),
            Self::UnknownVerb(verb) => write!(f, "unknown callback verb '{verb}'"),
            Self::InvalidId(id) => write!(f, "callback anime id '{id}' is not an integer"),
        }
    }
}

impl std::error::Error for ParseCallbackError {}

impl FromStr for CallbackAction {
    type Err = ParseCallbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, id) = s
            .split_once(' ')
            .ok_or_else(|| ParseCallbackError::MissingSeparator(s.to_string()))?;
        let anime_id = id
            .parse::<i64>()
            .map_err(|_| ParseCallbackError::InvalidId(id.to_string()))?;

        match verb {
            SUBSCRIBE_VERB => Ok(Self::Subscribe(anime_id)),
            UNSUBSCRIBE_VERB => Ok(Self::Unsubscribe(anime_id)),
            other => Err(ParseCallbackError::UnknownVerb(other.to_string())),
        }
    }
}
