use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::store::Message;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessage {
    pub receiver_id: Uuid,
    #[validate(length(min = 1, max = 2000, message = "message must be 1 to 2000 characters"))]
    pub message: String,
}

/// One inbox row per conversation partner.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub last_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_time: OffsetDateTime,
    pub unread_count: i64,
    /// Whether the caller sent the latest message.
    pub is_sender: bool,
}

#[derive(Debug, Serialize)]
pub struct ConversationThread {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub messages: Vec<Message>,
}
