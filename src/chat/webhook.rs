//! LINE webhook handling.
//!
//! Verifies the request, extracts text messages and computes the replies.
//! Sending the replies back through the LINE API is the caller's job.

use serde::{Deserialize, Serialize};

use crate::chat::reply::reply_for_message;
use crate::chat::signature::verify_webhook_signature;
use crate::config::ChatConfig;
use crate::error::{FloodWatchError, WebhookError};
use crate::pipeline::context::RequestContext;
use crate::pipeline::engine::ConsensusEngine;
use crate::storage::models::Report;
use crate::storage::repository::ReportRepository;

#[derive(Debug, Deserialize)]
struct WebhookBody {
    #[serde(default)]
    events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(rename = "replyToken")]
    reply_token: Option<String>,
    message: Option<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    #[serde(rename = "type")]
    message_type: String,
    text: Option<String>,
}

/// A text message that can be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub reply_token: String,
    pub text: String,
}

/// A reply for the caller to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply_token: String,
    pub text: String,
}

/// Extract text-message events. Other event types are skipped.
pub fn parse_text_messages(body: &str) -> Result<Vec<TextMessageEvent>, WebhookError> {
    let parsed: WebhookBody =
        serde_json::from_str(body).map_err(|e| WebhookError::MalformedBody(e.to_string()))?;

    Ok(parsed
        .events
        .into_iter()
        .filter(|event| event.event_type == "message")
        .filter_map(|event| {
            let message = event.message?;
            if message.message_type != "text" {
                return None;
            }
            Some(TextMessageEvent {
                reply_token: event.reply_token?,
                text: message.text?,
            })
        })
        .collect())
}

/// Handle one webhook request end to end.
pub fn handle_webhook<R: ReportRepository>(
    config: &ChatConfig,
    engine: &ConsensusEngine<R>,
    ctx: &RequestContext,
    body: &str,
    signature: Option<&str>,
) -> Result<Vec<ChatReply>, WebhookError> {
    let log_ctx = ctx.log_context();

    let secret = match config.channel_secret.as_deref() {
        Some(secret) => secret,
        None => {
            log::warn!("{} WEBHOOK_NOT_CONFIGURED", log_ctx);
            return Err(WebhookError::NotConfigured);
        }
    };

    let signature = signature.ok_or(WebhookError::MissingSignature)?;
    if !verify_webhook_signature(secret, body, signature, &log_ctx).verified {
        return Err(WebhookError::InvalidSignature);
    }

    let messages = parse_text_messages(body)?;
    log::debug!("{} WEBHOOK_RECEIVED text_messages={}", log_ctx, messages.len());
    if messages.is_empty() {
        return Ok(Vec::new());
    }

    let reports: Vec<Report> = engine
        .load_reports(ctx)
        .map_err(|e| match e {
            FloodWatchError::StorageUnavailable(e) => WebhookError::StorageUnavailable(e),
            FloodWatchError::InvalidReport(e) => WebhookError::MalformedBody(e.to_string()),
        })?
        .iter()
        .map(|s| s.report)
        .collect();

    let replies: Vec<ChatReply> = messages
        .into_iter()
        .filter_map(|message| {
            let text = reply_for_message(&message.text, &reports)?;
            log::info!("{} CHAT_REPLY reply_token={}", log_ctx, message.reply_token);
            Some(ChatReply {
                reply_token: message.reply_token,
                text,
            })
        })
        .collect();

    Ok(replies)
}
