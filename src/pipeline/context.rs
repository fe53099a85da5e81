//! Request-scoped context.
//!
//! Middleware builds a [`RequestContext`] once per request, after form bodies
//! have been normalized, and stores it in the request extensions. Handlers and
//! the renderer read it through the [`Ctx`] extractor. Nothing here is global:
//! code running outside a request (MCP tools, the CLI) uses
//! [`RequestContext::detached`].

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;

use super::negotiate::{negotiate, Negotiation};

/// Header carrying the per-request id.
pub const REQUEST_ID: &str = "x-request-id";

/// The inbound request as seen by the pipeline. Bodies are not carried.
#[derive(Debug)]
pub struct InboundRequest {
    pub request_id: Option<String>,
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Option<Arc<InboundRequest>>,
    negotiation: Negotiation,
}

impl RequestContext {
    /// Capture request metadata and settle the negotiation decision.
    pub fn from_parts(parts: &Parts) -> Self {
        let request_id = parts
            .headers
            .get(REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Self {
            negotiation: negotiate(&parts.headers),
            request: Some(Arc::new(InboundRequest {
                request_id,
                method: parts.method.clone(),
                path: parts.uri.path().to_owned(),
                query: parts.uri.query().map(str::to_owned),
                headers: parts.headers.clone(),
            })),
        }
    }

    /// A context with no inbound request. Always structured.
    pub fn detached() -> Self {
        Self {
            request: None,
            negotiation: Negotiation::Structured,
        }
    }

    pub fn negotiation(&self) -> Negotiation {
        self.negotiation
    }

    pub fn request(&self) -> Option<&InboundRequest> {
        self.request.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request()?.request_id.as_deref()
    }

    /// First value of a query-string parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.request()?.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Middleware: attach a fresh [`RequestContext`] to every request.
pub async fn attach_context(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let ctx = RequestContext::from_parts(&parts);
    tracing::trace!(
        request_id = ctx.request_id().unwrap_or(""),
        negotiation = ?ctx.negotiation(),
        "request context attached"
    );
    parts.extensions.insert(ctx);
    next.run(Request::from_parts(parts, body)).await
}

/// Extracts the request context, or a detached one when no middleware ran.
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Ctx(context_of(parts)))
    }
}

pub(crate) fn context_of(parts: &Parts) -> RequestContext {
    parts
        .extensions
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(RequestContext::detached)
}
