//! Request deadline.
//!
//! The handler future is dropped when the deadline passes, which also drops
//! any pending storage call and interrupts its statement. The caller gets a
//! `timeout` error through the renderer like any other failure.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::context::RequestContext;
use super::render::error_response;
use crate::error::ApiError;

/// Middleware state.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub secs: u64,
}

/// Middleware: answer with a structured `timeout` error once the deadline passes.
pub async fn enforce_deadline(
    State(deadline): State<Deadline>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let ctx = RequestContext::from_parts(&parts);
    let run = next.run(Request::from_parts(parts, body));

    match tokio::time::timeout(Duration::from_secs(deadline.secs), run).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                request_id = ctx.request_id().unwrap_or(""),
                secs = deadline.secs,
                "request timed out"
            );
            error_response(&ctx, &ApiError::Timeout { secs: deadline.secs })
        }
    }
}
