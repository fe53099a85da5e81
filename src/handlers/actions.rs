use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use super::{run_blocking, AppState, Canonical, RecordId};
use crate::pipeline::{respond, Ctx};
use crate::records::actions;
use crate::records::types::{ActionFilter, ActionUpdate, Deleted, NewAction};

/// `GET /actions?person_id=&valence=&theme_id=`, newest first.
pub async fn list(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    filter: ActionFilter,
) -> Response {
    let result = run_blocking(&state, move |conn| actions::list_actions(conn, &filter)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn create(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Canonical(input): Canonical<NewAction>,
) -> Response {
    let result = run_blocking(&state, move |conn| actions::create_action(conn, &input)).await;
    if let Ok(action) = &result {
        tracing::info!(
            id = %action.id,
            person_id = %action.person_id,
            valence = %action.valence,
            "action recorded"
        );
    }
    respond(&ctx, StatusCode::CREATED, result)
}

pub async fn show(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| actions::get_action(conn, id)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn update(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
    Canonical(input): Canonical<ActionUpdate>,
) -> Response {
    let result = run_blocking(&state, move |conn| actions::update_action(conn, id, &input)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn delete(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| actions::delete_action(conn, id))
        .await
        .map(|()| Deleted {
            id,
            resource: "action",
        });
    respond(&ctx, StatusCode::OK, result)
}
