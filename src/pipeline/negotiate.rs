//! Content negotiation: structured data or a rendered markup fragment.

use axum::http::{header, HeaderMap};
use serde::Serialize;

/// How the response body should be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Negotiation {
    /// JSON.
    Structured,
    /// An HTML fragment for the interactive page.
    Rendered,
}

/// Header sent by the dynamic-markup client on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

const MARKUP_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Decide the representation from request headers.
///
/// An `Accept` naming a markup type wins, then a truthy `HX-Request`;
/// everything else is structured.
pub fn negotiate(headers: &HeaderMap) -> Negotiation {
    if accepts_markup(headers) || is_hx_request(headers) {
        Negotiation::Rendered
    } else {
        Negotiation::Structured
    }
}

fn accepts_markup(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|range| range.split(';').next().unwrap_or("").trim())
        .any(|essence| {
            MARKUP_TYPES
                .iter()
                .any(|markup| essence.eq_ignore_ascii_case(markup))
        })
}

fn is_hx_request(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.trim();
            ["true", "1", "yes"]
                .iter()
                .any(|truthy| value.eq_ignore_ascii_case(truthy))
        })
        .unwrap_or(false)
}
