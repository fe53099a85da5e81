//! Tally: a small record-keeping service for people, the actions they take,
//! the themes those actions touch, and the 1:1 conversations held with them.
//!
//! Every operation answers either with JSON or with an HTML fragment for an
//! htmx-style page, chosen per request from one code path.
//!
//! # Architecture
//!
//! - **Identifiers**: 12-byte, time-sortable ids with a 20-character
//!   base32hex text form ([`id`])
//! - **Pipeline**: form normalization, per-request context, content
//!   negotiation and rendering as axum middleware ([`pipeline`])
//! - **Storage**: SQLite via rusqlite, accessed on the blocking pool and
//!   interrupted when a request is dropped ([`db`], [`records`])
//! - **Transport**: HTTP (axum) and MCP over stdio (rmcp)
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema and migrations
//! - [`error`]: the error taxonomy every caller sees
//! - [`handlers`]: HTTP business handlers and shared state
//! - [`records`]: storage operations for each record type
//! - [`server`]: router and entry points
//! - [`tools`]: MCP tool handler

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod id;
pub mod pipeline;
pub mod records;
pub mod server;
pub mod tools;
