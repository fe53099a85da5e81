//! Representation renderer.
//!
//! Turns a business result into a response body according to the negotiation
//! decision carried in the [`RequestContext`]. Types opt into markup by
//! implementing [`Fragment`]; a type without a template is always delivered
//! as JSON, so no result is ever dropped for lack of one.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use maud::Markup;
use serde::Serialize;

use super::context::RequestContext;
use super::negotiate::Negotiation;
use crate::error::{ApiError, ErrorCategory};

/// Headers the representation depends on.
pub const VARY: &str = "Accept, HX-Request";

const INTERNAL_BODY: &str = r#"{"message":"internal error","code":"internal"}"#;

/// A value that may have a markup template.
pub trait Fragment: Serialize {
    /// `None` means no template exists; the renderer then falls back to JSON.
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Html,
}

impl BodyKind {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

/// A rendered body and its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    pub kind: BodyKind,
    pub body: String,
}

impl Representation {
    /// Render `value` as the context asks, falling back to JSON when no
    /// template exists.
    pub fn of<T: Fragment + ?Sized>(ctx: &RequestContext, value: &T) -> serde_json::Result<Self> {
        if ctx.negotiation() == Negotiation::Rendered {
            if let Some(markup) = value.fragment(ctx) {
                return Ok(Self {
                    kind: BodyKind::Html,
                    body: markup.into_string(),
                });
            }
        }
        Self::structured(value)
    }

    pub fn structured<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            kind: BodyKind::Json,
            body: serde_json::to_string(value)?,
        })
    }

    /// Representation of an error. Only validation errors have a template.
    pub fn of_error(ctx: &RequestContext, err: &ApiError) -> serde_json::Result<Self> {
        let shape = err.structured();
        match err.category() {
            ErrorCategory::Validation => Self::of(ctx, &shape),
            ErrorCategory::NotFound | ErrorCategory::Internal => Self::structured(&shape),
        }
    }

    fn into_response(self, status: StatusCode) -> Response {
        (
            status,
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(self.kind.content_type()),
                ),
                (header::VARY, HeaderValue::from_static(VARY)),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Build the response for a business result.
pub fn respond<T: Fragment>(
    ctx: &RequestContext,
    status: StatusCode,
    result: Result<T, ApiError>,
) -> Response {
    match result {
        Ok(value) => match Representation::of(ctx, &value) {
            Ok(repr) => repr.into_response(status),
            Err(err) => serialization_failed(ctx, err),
        },
        Err(err) => error_response(ctx, &err),
    }
}

/// Build the response for an error.
pub fn error_response(ctx: &RequestContext, err: &ApiError) -> Response {
    match Representation::of_error(ctx, err) {
        Ok(repr) => repr.into_response(err.status()),
        Err(ser) => serialization_failed(ctx, ser),
    }
}

fn serialization_failed(ctx: &RequestContext, err: serde_json::Error) -> Response {
    tracing::error!(
        request_id = ctx.request_id().unwrap_or(""),
        error = %err,
        "response serialization failed"
    );
    Representation {
        kind: BodyKind::Json,
        body: INTERNAL_BODY.to_owned(),
    }
    .into_response(StatusCode::INTERNAL_SERVER_ERROR)
}
