//! Request normalizer.
//!
//! Browser forms post `application/x-www-form-urlencoded` or
//! `multipart/form-data`. Before any handler runs, those bodies are checked
//! against a static rule table and rewritten into the same canonical JSON a
//! machine client would send, so handlers only ever deserialize JSON.
//!
//! A form that fails a rule never reaches its handler: the first failing
//! field, in table order, is rendered straight back to the caller.

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use super::context::RequestContext;
use super::render::error_response;
use crate::error::{ApiError, ValidationError};
use crate::id;
use crate::records::types::Valence;

/// First path segment of a record route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    People,
    Themes,
    Actions,
    Conversations,
}

impl Resource {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "people" => Some(Self::People),
            "themes" => Some(Self::Themes),
            "actions" => Some(Self::Actions),
            "conversations" => Some(Self::Conversations),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Resolve the rule key for a request: `POST /{resource}` creates,
/// `PUT`/`PATCH /{resource}/{id}` updates.
pub fn route_key(method: &Method, path: &str) -> Option<(Resource, Operation)> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let resource = Resource::from_segment(segments.first()?)?;
    let operation = match (method, segments.len()) {
        (&Method::POST, 1) => Operation::Create,
        (&Method::PUT | &Method::PATCH, 2) => Operation::Update,
        _ => return None,
    };
    Some((resource, operation))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text. Required text must not be blank; optional text keeps an
    /// empty value so updates can clear it.
    Text,
    /// A 20-character record identifier.
    Identifier,
    /// One of a closed set of values.
    Enum(&'static [&'static str]),
    /// A date-time; absent values become the current time when `default_now`.
    Timestamp { default_now: bool },
    /// Every same-named value, each an identifier. Blanks are discarded.
    IdentifierList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        required: true,
        kind,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        required: false,
        kind,
    }
}

const PERSON: &[FieldRule] = &[
    required("name", FieldKind::Text),
    optional("role", FieldKind::Text),
];

const THEME: &[FieldRule] = &[
    required("name", FieldKind::Text),
    optional("description", FieldKind::Text),
];

const ACTION_CREATE: &[FieldRule] = &[
    required("person_id", FieldKind::Identifier),
    required("description", FieldKind::Text),
    required("valence", FieldKind::Enum(Valence::CREATE_VALUES)),
    optional("occurred_at", FieldKind::Timestamp { default_now: true }),
    optional("references", FieldKind::Text),
    optional("themes", FieldKind::IdentifierList),
];

const ACTION_UPDATE: &[FieldRule] = &[
    required("description", FieldKind::Text),
    required("valence", FieldKind::Enum(Valence::UPDATE_VALUES)),
    optional("occurred_at", FieldKind::Timestamp { default_now: false }),
    optional("references", FieldKind::Text),
    optional("themes", FieldKind::IdentifierList),
];

const CONVERSATION_CREATE: &[FieldRule] = &[
    required("person_id", FieldKind::Identifier),
    required("summary", FieldKind::Text),
    optional("held_at", FieldKind::Timestamp { default_now: true }),
    optional("follow_up", FieldKind::Text),
];

const CONVERSATION_UPDATE: &[FieldRule] = &[
    required("summary", FieldKind::Text),
    optional("held_at", FieldKind::Timestamp { default_now: false }),
    optional("follow_up", FieldKind::Text),
];

/// Field rules for a resource and operation.
pub fn rules(resource: Resource, operation: Operation) -> &'static [FieldRule] {
    match (resource, operation) {
        (Resource::People, _) => PERSON,
        (Resource::Themes, _) => THEME,
        (Resource::Actions, Operation::Create) => ACTION_CREATE,
        (Resource::Actions, Operation::Update) => ACTION_UPDATE,
        (Resource::Conversations, Operation::Create) => CONVERSATION_CREATE,
        (Resource::Conversations, Operation::Update) => CONVERSATION_UPDATE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<String>),
}

/// Validated form fields in rule order. Absent optional fields are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRequest {
    fields: Vec<(&'static str, FieldValue)>,
}

impl CanonicalRequest {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(name, value)| {
                let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (name.to_string(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Naive forms are taken as UTC. `datetime-local` inputs omit seconds.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Check decoded form pairs against `rules` and build the canonical request.
pub fn canonicalize(
    rules: &[FieldRule],
    form: &[(String, String)],
) -> Result<CanonicalRequest, ValidationError> {
    let mut canonical = CanonicalRequest::default();

    for rule in rules {
        let first = form
            .iter()
            .find(|(name, _)| name == rule.name)
            .map(|(_, value)| value.as_str());
        let blank = first.map_or(true, |value| value.trim().is_empty());

        let value = match rule.kind {
            FieldKind::IdentifierList => {
                let mut ids = Vec::new();
                for (_, value) in form.iter().filter(|(name, _)| name == rule.name) {
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    id::decode(value).map_err(|_| ValidationError::format(rule.name, value))?;
                    ids.push(value.to_owned());
                }
                if rule.required && ids.is_empty() {
                    return Err(ValidationError::required(rule.name));
                }
                Some(FieldValue::List(ids))
            }
            _ if blank && rule.required => return Err(ValidationError::required(rule.name)),
            FieldKind::Timestamp { default_now } if blank => {
                default_now.then(|| FieldValue::Timestamp(Utc::now()))
            }
            FieldKind::Text => first.map(|value| FieldValue::Text(value.trim().to_owned())),
            _ if blank => None,
            FieldKind::Identifier => {
                let value = first.unwrap_or_default().trim();
                id::decode(value).map_err(|_| ValidationError::format(rule.name, value))?;
                Some(FieldValue::Text(value.to_owned()))
            }
            FieldKind::Enum(allowed) => {
                let value = first.unwrap_or_default().trim();
                if !allowed.contains(&value) {
                    return Err(ValidationError::invalid(rule.name, value, allowed));
                }
                Some(FieldValue::Text(value.to_owned()))
            }
            FieldKind::Timestamp { .. } => {
                let value = first.unwrap_or_default();
                let at = parse_timestamp(value)
                    .ok_or_else(|| ValidationError::format(rule.name, value.trim()))?;
                Some(FieldValue::Timestamp(at))
            }
        };

        if let Some(value) = value {
            canonical.fields.push((rule.name, value));
        }
    }

    Ok(canonical)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormEncoding {
    UrlEncoded,
    Multipart,
}

fn form_encoding(headers: &HeaderMap) -> Option<FormEncoding> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next().unwrap_or("").trim();
    if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        Some(FormEncoding::UrlEncoded)
    } else if essence.eq_ignore_ascii_case("multipart/form-data") {
        Some(FormEncoding::Multipart)
    } else {
        None
    }
}

/// A form submission has no explicit preference unless `Accept` says so.
fn default_accept(headers: &mut HeaderMap) {
    let explicit = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .is_some_and(|v| !v.is_empty() && v != "*/*");
    if !explicit {
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
    }
}

async fn decode_multipart(content_type: HeaderValue, body: Bytes) -> Result<Vec<(String, String)>, ApiError> {
    let request = axum::http::Request::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    let mut pairs = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::MalformedBody(e.body_text()))?
    {
        // File parts carry no record fields.
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::MalformedBody(e.body_text()))?;
        pairs.push((name, value));
    }
    Ok(pairs)
}

/// Middleware state.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    pub max_body_bytes: usize,
}

/// Middleware: rewrite form submissions on record routes into canonical JSON.
pub async fn normalize_forms(
    State(normalizer): State<Normalizer>,
    request: Request,
    next: Next,
) -> Response {
    let Some(encoding) = form_encoding(request.headers()) else {
        return next.run(request).await;
    };
    let Some((resource, operation)) = route_key(request.method(), request.uri().path()) else {
        return next.run(request).await;
    };

    let (mut parts, body) = request.into_parts();
    default_accept(&mut parts.headers);
    let ctx = RequestContext::from_parts(&parts);
    let limit = normalizer.max_body_bytes;

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return error_response(&ctx, &ApiError::PayloadTooLarge { limit });
    }
    // Only the length limit or a vanished client can fail a buffered read.
    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(_) => return error_response(&ctx, &ApiError::PayloadTooLarge { limit }),
    };

    let form = match encoding {
        FormEncoding::UrlEncoded => Ok(url::form_urlencoded::parse(&bytes).into_owned().collect()),
        FormEncoding::Multipart => match parts.headers.get(header::CONTENT_TYPE).cloned() {
            Some(content_type) => decode_multipart(content_type, bytes).await,
            None => Err(ApiError::MalformedBody("missing content type".into())),
        },
    };
    let form: Vec<(String, String)> = match form {
        Ok(form) => form,
        Err(err) => return error_response(&ctx, &err),
    };

    let canonical = match canonicalize(rules(resource, operation), &form) {
        Ok(canonical) => canonical,
        Err(err) => {
            tracing::debug!(
                request_id = ctx.request_id().unwrap_or(""),
                field = err.field(),
                code = err.code(),
                "form rejected"
            );
            return error_response(&ctx, &ApiError::Validation(err));
        }
    };

    let json = canonical.to_json().to_string();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(json.len()));
    next.run(Request::from_parts(parts, Body::from(json))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const PERSON_ID: &str = "9m4e2mr0ui3e8a215n4g";

    #[test]
    fn route_keys() {
        assert_eq!(
            route_key(&Method::POST, "/actions"),
            Some((Resource::Actions, Operation::Create))
        );
        assert_eq!(
            route_key(&Method::PATCH, "/people/9m4e2mr0ui3e8a215n4g"),
            Some((Resource::People, Operation::Update))
        );
        assert_eq!(route_key(&Method::POST, "/people/x"), None);
        assert_eq!(route_key(&Method::GET, "/people"), None);
        assert_eq!(route_key(&Method::POST, "/elsewhere"), None);
    }

    #[test]
    fn missing_description_is_required() {
        let err = canonicalize(
            ACTION_CREATE,
            &form(&[("person_id", PERSON_ID), ("valence", "positive")]),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::required("description"));
    }

    #[test]
    fn blank_required_text_is_required() {
        let err = canonicalize(PERSON, &form(&[("name", "   ")])).unwrap_err();
        assert_eq!(err, ValidationError::required("name"));
    }

    #[test]
    fn first_failure_in_table_order_wins() {
        let err = canonicalize(ACTION_CREATE, &form(&[("valence", "unknown")])).unwrap_err();
        assert_eq!(err, ValidationError::required("person_id"));
    }

    #[test]
    fn unknown_valence_is_invalid() {
        let err = canonicalize(
            ACTION_CREATE,
            &form(&[
                ("person_id", PERSON_ID),
                ("description", "x"),
                ("valence", "unknown"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::FieldInvalid { ref field, ref value, .. }
                if field == "valence" && value == "unknown"
        ));
    }

    #[test]
    fn neutral_only_on_create() {
        let ok = canonicalize(
            ACTION_CREATE,
            &form(&[
                ("person_id", PERSON_ID),
                ("description", "x"),
                ("valence", "neutral"),
            ]),
        );
        assert!(ok.is_ok());

        let err = canonicalize(
            ACTION_UPDATE,
            &form(&[("description", "x"), ("valence", "neutral")]),
        )
        .unwrap_err();
        assert_eq!(err.code(), "field_invalid");
    }

    #[test]
    fn omitted_occurred_at_defaults_to_now() {
        let before = Utc::now();
        let canonical = canonicalize(
            ACTION_CREATE,
            &form(&[
                ("person_id", PERSON_ID),
                ("description", "x"),
                ("valence", "positive"),
            ]),
        )
        .unwrap();
        match canonical.get("occurred_at") {
            Some(FieldValue::Timestamp(at)) => {
                assert!(*at >= before && *at <= Utc::now());
            }
            other => panic!("expected timestamp, got {other:?}"),
        }
    }

    #[test]
    fn omitted_occurred_at_on_update_stays_absent() {
        let canonical = canonicalize(
            ACTION_UPDATE,
            &form(&[("description", "x"), ("valence", "negative"), ("occurred_at", "")]),
        )
        .unwrap();
        assert_eq!(canonical.get("occurred_at"), None);
    }

    #[test]
    fn timestamp_formats() {
        let minute = parse_timestamp("2024-03-01T09:30").unwrap();
        assert_eq!(minute.to_rfc3339(), "2024-03-01T09:30:00+00:00");
        let second = parse_timestamp("2024-03-01T09:30:15").unwrap();
        assert_eq!(second.timestamp() - minute.timestamp(), 15);
        let offset = parse_timestamp("2024-03-01T10:30:00+01:00").unwrap();
        assert_eq!(offset, minute);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn bad_timestamp_is_format_invalid() {
        let err = canonicalize(
            CONVERSATION_UPDATE,
            &form(&[("summary", "1:1"), ("held_at", "last tuesday")]),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::format("held_at", "last tuesday"));
    }

    #[test]
    fn bad_identifier_is_format_invalid() {
        let err = canonicalize(
            CONVERSATION_CREATE,
            &form(&[("person_id", "not-an-id"), ("summary", "1:1")]),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::format("person_id", "not-an-id"));
    }

    #[test]
    fn lists_collect_every_value_and_drop_blanks() {
        let other = "00000000000000000000";
        let canonical = canonicalize(
            ACTION_UPDATE,
            &form(&[
                ("description", "x"),
                ("valence", "positive"),
                ("themes", PERSON_ID),
                ("themes", ""),
                ("themes", other),
            ]),
        )
        .unwrap();
        assert_eq!(
            canonical.get("themes"),
            Some(&FieldValue::List(vec![PERSON_ID.into(), other.into()]))
        );
    }

    #[test]
    fn absent_list_is_empty() {
        let canonical = canonicalize(
            ACTION_UPDATE,
            &form(&[("description", "x"), ("valence", "positive")]),
        )
        .unwrap();
        assert_eq!(canonical.get("themes"), Some(&FieldValue::List(Vec::new())));
    }

    #[test]
    fn optional_text_keeps_empty_and_omits_absent() {
        let canonical = canonicalize(PERSON, &form(&[("name", "Ada"), ("role", "")])).unwrap();
        assert_eq!(canonical.get("role"), Some(&FieldValue::Text(String::new())));

        let canonical = canonicalize(PERSON, &form(&[("name", "Ada")])).unwrap();
        assert_eq!(canonical.get("role"), None);
    }

    #[test]
    fn json_preserves_rule_order() {
        let canonical = canonicalize(
            PERSON,
            &form(&[("role", "Lead"), ("name", "Ada"), ("ignored", "x")]),
        )
        .unwrap();
        assert_eq!(canonical.to_json().to_string(), r#"{"name":"Ada","role":"Lead"}"#);
    }

    #[test]
    fn accept_is_defaulted_only_when_unstated() {
        let mut headers = HeaderMap::new();
        default_accept(&mut headers);
        assert_eq!(headers[header::ACCEPT], "text/html");

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        default_accept(&mut headers);
        assert_eq!(headers[header::ACCEPT], "text/html");

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        default_accept(&mut headers);
        assert_eq!(headers[header::ACCEPT], "application/json");
    }
}
