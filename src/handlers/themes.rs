use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use super::{run_blocking, AppState, Canonical, RecordId};
use crate::pipeline::{respond, Ctx};
use crate::records::themes;
use crate::records::types::{Deleted, NewTheme, ThemeUpdate};

pub async fn list(State(state): State<AppState>, Ctx(ctx): Ctx) -> Response {
    let result = run_blocking(&state, |conn| themes::list_themes(conn)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn create(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Canonical(input): Canonical<NewTheme>,
) -> Response {
    let result = run_blocking(&state, move |conn| themes::create_theme(conn, &input)).await;
    respond(&ctx, StatusCode::CREATED, result)
}

pub async fn show(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| themes::get_theme(conn, id)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn update(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
    Canonical(input): Canonical<ThemeUpdate>,
) -> Response {
    let result = run_blocking(&state, move |conn| themes::update_theme(conn, id, &input)).await;
    respond(&ctx, StatusCode::OK, result)
}

pub async fn delete(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    RecordId(id): RecordId,
) -> Response {
    let result = run_blocking(&state, move |conn| themes::delete_theme(conn, id))
        .await
        .map(|()| Deleted {
            id,
            resource: "theme",
        });
    respond(&ctx, StatusCode::OK, result)
}
