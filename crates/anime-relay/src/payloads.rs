//! Pure builders turning notifications into Bot API request bodies

use std::path::Path;

use anime_relay_types::{
    AnswerCallbackQuery, AnswerInlineQuery, CallbackAction, EditMessageReplyMarkup, InlineAnime,
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle,
    InputMessageContent, SendMessage, SendPhoto,
};

use crate::config::DeepLinkTemplate;
use crate::gateway::MultipartForm;

const OPEN_LABEL: &str = "open";
const SUBSCRIBED_DESCRIPTION: &str = "You are subscribed";
const CERTIFICATE_FIELD: &str = "certificate";
const URL_FIELD: &str = "url";

pub fn plain_message(chat_id: i64, text: impl Into<String>) -> SendMessage {
    SendMessage::new(chat_id, text)
}

/// Photo card with a single subscribe/unsubscribe button
pub fn anime_photo(chat_id: i64, anime: &InlineAnime) -> SendPhoto {
    let action = CallbackAction::toggle_for(anime.user_has_subscription, anime.internal_id);

    SendPhoto {
        chat_id,
        photo: anime.thumbnail_url.clone(),
        caption: Some(anime.name.clone()),
        reply_markup: Some(InlineKeyboardMarkup::single(action.button())),
    }
}

/// Text message with one row per anime; each button is labelled with the
/// anime name and toggles its subscription
pub fn anime_list_message(
    chat_id: i64,
    text: impl Into<String>,
    animes: &[InlineAnime],
) -> SendMessage {
    let rows = animes
        .iter()
        .map(|anime| {
            let action = CallbackAction::toggle_for(anime.user_has_subscription, anime.internal_id);
            vec![InlineKeyboardButton::callback(
                anime.name.clone(),
                action.to_string(),
            )]
        })
        .collect();

    SendMessage::new(chat_id, text).with_buttons(InlineKeyboardMarkup::new(rows))
}

/// One article per candidate, ids are 0-based positions
pub fn inline_query_answer(
    inline_query_id: impl Into<String>,
    animes: &[InlineAnime],
    deep_link: &DeepLinkTemplate,
) -> AnswerInlineQuery {
    let results = animes
        .iter()
        .enumerate()
        .map(|(index, anime)| {
            InlineQueryResult::Article(InlineQueryResultArticle {
                id: index.to_string(),
                title: anime.name.clone(),
                input_message_content: InputMessageContent {
                    message_text: format!("{}\n{}", anime.name, anime.thumbnail_url),
                },
                reply_markup: Some(InlineKeyboardMarkup::single(InlineKeyboardButton::url(
                    OPEN_LABEL,
                    deep_link.expand(anime.internal_id),
                ))),
                description: anime
                    .user_has_subscription
                    .then(|| SUBSCRIBED_DESCRIPTION.to_string()),
                thumbnail_url: Some(anime.thumbnail_url.clone()),
            })
        })
        .collect();

    AnswerInlineQuery {
        inline_query_id: inline_query_id.into(),
        results,
        cache_time: 0,
    }
}

pub fn callback_ack(callback_query_id: impl Into<String>) -> AnswerCallbackQuery {
    AnswerCallbackQuery {
        callback_query_id: callback_query_id.into(),
        text: None,
    }
}

/// Replace the keyboard of `message_id` with a single button for `action`
pub fn toggled_markup(chat_id: i64, message_id: i64, action: CallbackAction) -> EditMessageReplyMarkup {
    EditMessageReplyMarkup {
        chat_id,
        message_id,
        reply_markup: InlineKeyboardMarkup::single(action.button()),
    }
}

/// `setWebhook` form: the certificate file plus the callback URL
pub fn webhook_form(public_key_path: &Path, certificate: Vec<u8>, webhook_url: &str) -> MultipartForm {
    let file_name = public_key_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| public_key_path.display().to_string());

    MultipartForm::new()
        .file(CERTIFICATE_FIELD, file_name, certificate)
        .text(URL_FIELD, webhook_url)
}
