//! HTTP business handlers.
//!
//! Every handler has the same shape: extract the typed input, run one storage
//! operation on the blocking pool, and hand the `Result` to the renderer.
//! Handlers never look at the negotiation decision themselves.

pub mod actions;
pub mod conversations;
pub mod people;
pub mod themes;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::Uri;
use axum::response::Response;
use rusqlite::{Connection, InterruptHandle};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ValidationError};
use crate::id::Id;
use crate::pipeline::context::context_of;
use crate::pipeline::{error_response, Ctx};
use crate::records::types::{
    ActionFilter, ActionUpdate, ConversationFilter, ConversationUpdate, NewAction,
    NewConversation, NewPerson, NewTheme, PersonUpdate, ThemeUpdate, Valence,
};
use crate::records::StoreResult;

/// State shared by every handler and MCP tool.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(conn: Connection, max_body_bytes: usize) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            db: Arc::new(Mutex::new(conn)),
            interrupt,
            max_body_bytes,
        }
    }
}

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const CANCELLED: u8 = 3;

/// Interrupts the in-flight statement if the awaiting future is dropped.
///
/// A request dropped before its operation takes the connection lock is
/// cancelled outright; one dropped while the operation runs interrupts it.
struct InterruptOnDrop {
    stage: Arc<AtomicU8>,
    handle: Arc<InterruptHandle>,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        match self
            .stage
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => tracing::debug!("request dropped before storage ran"),
            Err(RUNNING) => {
                tracing::debug!("request dropped mid-statement; interrupting");
                self.handle.interrupt();
            }
            Err(_) => {}
        }
    }
}

/// Run a storage operation on the blocking pool.
///
/// Internal failures are logged here, once, with their cause; callers only
/// see the structured `internal` error.
pub async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let stage = Arc::new(AtomicU8::new(PENDING));
    let _guard = InterruptOnDrop {
        stage: Arc::clone(&stage),
        handle: Arc::clone(&state.interrupt),
    };
    let db = Arc::clone(&state.db);

    let joined = tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("db lock poisoned: {e}")))?;
        if stage
            .compare_exchange(PENDING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ApiError::Internal(anyhow::anyhow!("request cancelled")));
        }
        let result = op(&mut conn);
        stage.store(DONE, Ordering::SeqCst);
        result.map_err(ApiError::from)
    })
    .await;

    let result = joined.unwrap_or_else(|e| {
        Err(ApiError::Internal(anyhow::anyhow!(
            "storage task failed: {e}"
        )))
    });
    if let Err(ApiError::Internal(cause)) = &result {
        tracing::error!(error = %cause, "storage operation failed");
    }
    result
}

// ── Input validation ──────────────────────────────────────────────────────────

/// Field checks that JSON deserialization alone cannot express. Form bodies
/// have already passed the normalizer's rules; JSON bodies are checked here.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::required(field))
    } else {
        Ok(())
    }
}

impl Validate for NewPerson {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

impl Validate for PersonUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

impl Validate for NewTheme {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

impl Validate for ThemeUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

impl Validate for NewAction {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("description", &self.description)
    }
}

impl Validate for ActionUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("description", &self.description)?;
        if self.valence == Valence::Neutral {
            return Err(ValidationError::invalid(
                "valence",
                self.valence.as_str(),
                Valence::UPDATE_VALUES,
            ));
        }
        Ok(())
    }
}

impl Validate for NewConversation {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("summary", &self.summary)
    }
}

impl Validate for ConversationUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("summary", &self.summary)
    }
}

// ── Extractors ────────────────────────────────────────────────────────────────

/// A canonical JSON body, deserialized and validated. Rejections are rendered
/// through the request context like any other error.
pub struct Canonical<T>(pub T);

impl<T> FromRequest<AppState> for Canonical<T>
where
    T: DeserializeOwned + Validate,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();
        let ctx = context_of(&parts);
        let limit = state.max_body_bytes;

        let bytes = to_bytes(body, limit)
            .await
            .map_err(|_| error_response(&ctx, &ApiError::PayloadTooLarge { limit }))?;
        let value: T = serde_json::from_slice(&bytes)
            .map_err(|e| error_response(&ctx, &ApiError::MalformedBody(e.to_string())))?;
        value
            .validate()
            .map_err(|e| error_response(&ctx, &ApiError::Validation(e)))?;
        Ok(Canonical(value))
    }
}

/// The `{id}` path segment, decoded.
pub struct RecordId(pub Id);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = context_of(parts);
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| error_response(&ctx, &ApiError::MalformedBody(e.body_text())))?;
        raw.parse::<Id>()
            .map(RecordId)
            .map_err(|cause| error_response(&ctx, &ApiError::bad_identifier("id", &raw, cause)))
    }
}

fn query_pairs(parts: &Parts) -> Vec<(String, String)> {
    parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn query_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn query_id(pairs: &[(String, String)], name: &str) -> Result<Option<Id>, ApiError> {
    query_value(pairs, name)
        .map(|raw| {
            raw.parse::<Id>()
                .map_err(|cause| ApiError::bad_identifier(name, raw, cause))
        })
        .transpose()
}

fn action_filter(pairs: &[(String, String)]) -> Result<ActionFilter, ApiError> {
    let valence = query_value(pairs, "valence")
        .map(|raw| {
            raw.parse::<Valence>().map_err(|_| {
                ApiError::from(ValidationError::invalid(
                    "valence",
                    raw,
                    Valence::CREATE_VALUES,
                ))
            })
        })
        .transpose()?;
    Ok(ActionFilter {
        person_id: query_id(pairs, "person_id")?,
        valence,
        theme_id: query_id(pairs, "theme_id")?,
    })
}

impl<S> FromRequestParts<S> for ActionFilter
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        action_filter(&query_pairs(parts)).map_err(|e| error_response(&context_of(parts), &e))
    }
}

impl<S> FromRequestParts<S> for ConversationFilter
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        query_id(&query_pairs(parts), "person_id")
            .map(|person_id| ConversationFilter { person_id })
            .map_err(|e| error_response(&context_of(parts), &e))
    }
}

/// Unknown routes answer with the structured not-found error.
pub async fn fallback(Ctx(ctx): Ctx, uri: Uri) -> Response {
    error_response(
        &ctx,
        &ApiError::NotFound {
            resource: "route",
            id: uri.path().to_owned(),
        },
    )
}
