use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use super::{run_blocking, AppState, Canonical, RecordId};
use crate::pipeline::{respond, Ctx};
use crate::records::conversations;
use crate::records::types::{ConversationFilter, ConversationUpdate, Deleted, NewConversation};

pub async fn list(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    filter: ConversationFilter,
) -> Response {
    let result = run_blocking(&state, move |conn| {
        conversations::list_conversations(conn, &filter)
    })
    .await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn create(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Canonical(input): Canonical<NewConversation>,
) -> Response {
    let result = run_blocking(&state, move |conn| {
        conversations::create_conversation(conn, &input)
    })
    .await;
    if let Ok(conversation) = &result {
        tracing::info!(
            id = %conversation.id,
            person_id = %conversation.person_id,
            "conversation recorded"
        );
    }
    respond(&ctx, StatusCode::CREATED, result)
}

pub async fn show(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| conversations::get_conversation(conn, id)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn update(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
    Canonical(input): Canonical<ConversationUpdate>,
) -> Response {
    let result = run_blocking(&state, move |conn| {
        conversations::update_conversation(conn, id, &input)
    })
    .await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn delete(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| conversations::delete_conversation(conn, id))
        .await
        .map(|()| Deleted {
            id,
            resource: "conversation",
        });
    respond(&ctx, StatusCode::OK, result)
}
