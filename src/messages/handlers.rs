use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::dto::{ConversationSummary, ConversationThread, SendMessage};
use crate::{
    auth::guard::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
    store::{Message, NewMessage},
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/send", post(send_message))
        .route("/messages/conversations", get(list_conversations))
        .route("/messages/conversation/:partner_id", get(get_conversation))
}

async fn partner_name(state: &AppState, partner_id: Uuid) -> AppResult<String> {
    Ok(state
        .store
        .find_user(partner_id)
        .await?
        .map(|u| u.full_name)
        .unwrap_or_else(|| "Unknown".into()))
}

/// Groups `messages` (any order) by the other participant, newest conversation first.
/// Partner names are left empty for the caller to fill.
fn summarize(me: Uuid, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut by_partner: HashMap<Uuid, ConversationSummary> = HashMap::new();
    for m in messages {
        let partner_id = if m.sender_id == me { m.receiver_id } else { m.sender_id };
        let unread = i64::from(m.receiver_id == me && !m.is_read);
        by_partner
            .entry(partner_id)
            .and_modify(|c| {
                c.unread_count += unread;
                if m.created_at >= c.last_message_time {
                    c.last_message = m.message.clone();
                    c.last_message_time = m.created_at;
                    c.is_sender = m.sender_id == me;
                }
            })
            .or_insert_with(|| ConversationSummary {
                partner_id,
                partner_name: String::new(),
                last_message: m.message.clone(),
                last_message_time: m.created_at,
                unread_count: unread,
                is_sender: m.sender_id == me,
            });
    }

    let mut out: Vec<_> = by_partner.into_values().collect();
    out.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
    out
}

#[instrument(skip(state, user, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SendMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    payload.validate()?;
    if payload.message.trim().is_empty() {
        return Err(AppError::invalid("message", "message must not be blank"));
    }
    if payload.receiver_id == user.id() {
        return Err(AppError::BadRequest("Cannot send a message to yourself".into()));
    }
    if state.store.find_user(user.id()).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }
    if state.store.find_user(payload.receiver_id).await?.is_none() {
        return Err(AppError::NotFound("Recipient not found".into()));
    }

    let message = state
        .store
        .insert_message(NewMessage {
            sender_id: user.id(),
            receiver_id: payload.receiver_id,
            message: payload.message,
        })
        .await?;
    info!(message_id = %message.id, sender = %message.sender_id, receiver = %message.receiver_id, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

#[instrument(skip(state, user))]
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let messages = state.store.messages_for(user.id()).await?;
    let mut conversations = summarize(user.id(), &messages);
    for c in &mut conversations {
        c.partner_name = partner_name(&state, c.partner_id).await?;
    }
    Ok(Json(conversations))
}

#[instrument(skip(state, user))]
pub async fn get_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<ConversationThread>> {
    let marked = state.store.mark_read(partner_id, user.id()).await?;
    if marked > 0 {
        debug!(user_id = %user.id(), %partner_id, marked, "messages marked read");
    }
    let messages = state.store.messages_between(user.id(), partner_id).await?;
    Ok(Json(ConversationThread {
        partner_id,
        partner_name: partner_name(&state, partner_id).await?,
        messages,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use time::macros::datetime;
    use uuid::Uuid;

    use super::summarize;
    use crate::{store::Message, test_support::TestApp};

    fn msg(from: Uuid, to: Uuid, text: &str, at: time::OffsetDateTime, is_read: bool) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: from,
            receiver_id: to,
            message: text.into(),
            is_read,
            created_at: at,
        }
    }

    #[test]
    fn summarize_groups_by_partner_newest_first() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let messages = vec![
            msg(alice, me, "hi", datetime!(2024-01-01 10:00 UTC), false),
            msg(bob, me, "quote?", datetime!(2024-01-01 11:00 UTC), false),
            msg(alice, me, "still there?", datetime!(2024-01-01 12:00 UTC), false),
            msg(me, bob, "50/hr", datetime!(2024-01-01 13:00 UTC), false),
            msg(bob, me, "ok", datetime!(2024-01-01 09:00 UTC), true),
        ];

        let out = summarize(me, &messages);
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].partner_id, bob);
        assert_eq!(out[0].last_message, "50/hr");
        assert!(out[0].is_sender);
        assert_eq!(out[0].unread_count, 1);

        assert_eq!(out[1].partner_id, alice);
        assert_eq!(out[1].last_message, "still there?");
        assert!(!out[1].is_sender);
        assert_eq!(out[1].unread_count, 2);
    }

    #[tokio::test]
    async fn send_requires_existing_recipient() {
        let app = TestApp::new();
        let (_, token) = app.create_user("a@example.com", "password123").await;
        let (status, _) = app
            .send(
                Method::POST,
                "/messages/send",
                Some(&token),
                Some(json!({"receiver_id": Uuid::new_v4(), "message": "hello"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let app = TestApp::new();
        let (_, token) = app.create_user("a@example.com", "password123").await;
        let (bob, _) = app.create_user("b@example.com", "password123").await;
        for text in ["", "   "] {
            let (status, body) = app
                .send(
                    Method::POST,
                    "/messages/send",
                    Some(&token),
                    Some(json!({"receiver_id": bob.id, "message": text})),
                )
                .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body["error"]["details"]["message"].is_array());
        }
    }

    #[tokio::test]
    async fn opening_a_conversation_marks_it_read() {
        let app = TestApp::new();
        let (alice, alice_token) = app.create_user("alice@example.com", "password123").await;
        let (bob, bob_token) = app.create_user("bob@example.com", "password123").await;

        for text in ["first", "second"] {
            let (status, _) = app
                .send(
                    Method::POST,
                    "/messages/send",
                    Some(&alice_token),
                    Some(json!({"receiver_id": bob.id, "message": text})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, inbox) = app
            .send(Method::GET, "/messages/conversations", Some(&bob_token), None)
            .await;
        assert_eq!(inbox[0]["partner_id"], alice.id.to_string());
        assert_eq!(inbox[0]["partner_name"], alice.full_name);
        assert_eq!(inbox[0]["last_message"], "second");
        assert_eq!(inbox[0]["unread_count"], 2);
        assert_eq!(inbox[0]["is_sender"], false);

        let (status, thread) = app
            .send(
                Method::GET,
                &format!("/messages/conversation/{}", alice.id),
                Some(&bob_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let messages = thread["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["message"], "first");
        assert!(messages.iter().all(|m| m["is_read"] == true));

        let (_, inbox) = app
            .send(Method::GET, "/messages/conversations", Some(&bob_token), None)
            .await;
        assert_eq!(inbox[0]["unread_count"], 0);

        // the sender's own view does not mark anything on the receiver's side
        let (_, alice_inbox) = app
            .send(Method::GET, "/messages/conversations", Some(&alice_token), None)
            .await;
        assert_eq!(alice_inbox[0]["unread_count"], 0);
        assert_eq!(alice_inbox[0]["is_sender"], true);
    }

    #[tokio::test]
    async fn unknown_partner_is_named_unknown() {
        let app = TestApp::new();
        let (_, token) = app.create_user("a@example.com", "password123").await;
        let stranger = Uuid::new_v4();
        let (status, thread) = app
            .send(
                Method::GET,
                &format!("/messages/conversation/{stranger}"),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(thread["partner_name"], "Unknown");
        assert_eq!(thread["messages"], json!([]));
    }

    #[tokio::test]
    async fn deleted_sender_cannot_send() {
        let app = TestApp::new();
        let (gone, token) = app.create_user("gone@example.com", "password123").await;
        let (bob, _) = app.create_user("bob@example.com", "password123").await;
        assert!(app.state.store.delete_user(gone.id).await.unwrap());

        let (status, body) = app
            .send(
                Method::POST,
                "/messages/send",
                Some(&token),
                Some(json!({"receiver_id": bob.id, "message": "still here?"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "User not found");
        assert!(app.state.store.messages_for(bob.id).await.unwrap().is_empty());
    }
}
