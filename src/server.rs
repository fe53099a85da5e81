//! Server wiring for the HTTP and MCP (stdio) entry points.
//!
//! Provides [`router`] for tests and embedding, plus the [`serve_http`] and
//! [`serve_stdio`] entry points that open the database and run until shutdown.

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use rmcp::ServiceExt;
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::config::{ServerConfig, TallyConfig};
use crate::db;
use crate::handlers::{self, actions, conversations, people, themes, AppState};
use crate::pipeline::context::REQUEST_ID;
use crate::pipeline::{attach_context, enforce_deadline, normalize_forms, Deadline, Normalizer};
use crate::tools::TallyTools;

/// Request ids for requests that arrive without one: UUID v7, so they sort by
/// arrival time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build the application router with every middleware layer.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let normalizer = Normalizer {
        max_body_bytes: config.max_body_bytes,
    };

    let routes = Router::new()
        .route("/people", get(people::list).post(people::create))
        .route(
            "/people/{id}",
            get(people::show)
                .put(people::update)
                .patch(people::update)
                .delete(people::delete),
        )
        .route("/themes", get(themes::list).post(themes::create))
        .route(
            "/themes/{id}",
            get(themes::show)
                .put(themes::update)
                .patch(themes::update)
                .delete(themes::delete),
        )
        .route("/actions", get(actions::list).post(actions::create))
        .route(
            "/actions/{id}",
            get(actions::show)
                .put(actions::update)
                .patch(actions::update)
                .delete(actions::delete),
        )
        .route(
            "/conversations",
            get(conversations::list).post(conversations::create),
        )
        .route(
            "/conversations/{id}",
            get(conversations::show)
                .put(conversations::update)
                .patch(conversations::update)
                .delete(conversations::delete),
        )
        .fallback(handlers::fallback)
        .with_state(state);

    // Outermost first: the id exists before the span opens, forms are
    // canonical before the context negotiates.
    routes.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn_with_state(
                Deadline {
                    secs: config.request_timeout_secs,
                },
                enforce_deadline,
            ))
            .layer(middleware::from_fn_with_state(normalizer, normalize_forms))
            .layer(middleware::from_fn(attach_context)),
    )
}

fn open_state(config: &TallyConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");
    Ok(AppState::new(conn, config.server.max_body_bytes))
}

/// Serve the HTTP interface until ctrl-c.
pub async fn serve_http(config: TallyConfig) -> Result<()> {
    let state = open_state(&config)?;
    let app = router(state, &config.server);

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "Tally listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: TallyConfig) -> Result<()> {
    tracing::info!("starting Tally MCP server on stdio");

    let tools = TallyTools::new(open_state(&config)?);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down HTTP server");
}
