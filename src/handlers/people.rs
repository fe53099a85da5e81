use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use super::{run_blocking, AppState, Canonical, RecordId};
use crate::pipeline::{respond, Ctx};
use crate::records::people;
use crate::records::types::{Deleted, NewPerson, PersonUpdate};

pub async fn list(State(state): State<AppState>, Ctx(ctx): Ctx) -> Response {
    let result = run_blocking(&state, |conn| people::list_people(conn)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn create(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Canonical(input): Canonical<NewPerson>,
) -> Response {
    let result = run_blocking(&state, move |conn| people::create_person(conn, &input)).await;
    if let Ok(person) = &result {
        tracing::info!(id = %person.id, "person recorded");
    }
    respond(&ctx, StatusCode::CREATED, result)
}

/// The person with their actions and conversations.
pub async fn show(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| people::person_detail(conn, id)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn update(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
    Canonical(input): Canonical<PersonUpdate>,
) -> Response {
    let result = run_blocking(&state, move |conn| people::update_person(conn, id, &input)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn delete(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| people::delete_person(conn, id))
        .await
        .map(|()| Deleted {
            id,
            resource: "person",
        });
    if result.is_ok() {
        tracing::info!(%id, "person deleted");
    }
    respond(&ctx, StatusCode::OK, result)
}
