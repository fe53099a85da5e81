mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use helpers::{create_person, create_theme, form, get, send, test_app, test_app_with};
use tally::config::ServerConfig;

#[tokio::test]
async fn missing_description_never_reaches_storage() {
    let app = test_app();
    let person = create_person(&app, "Ada").await;

    let mut req = form("POST", "/actions", &format!("person_id={person}&valence=positive"));
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json();
    assert_eq!(body["code"], "field_required");
    assert_eq!(body["field"], "description");

    let listed = send(&app, get("/actions")).await;
    assert_eq!(listed.json(), serde_json::json!([]));
}

#[tokio::test]
async fn unknown_valence_is_field_invalid() {
    let app = test_app();
    let person = create_person(&app, "Ada").await;

    let mut req = form(
        "POST",
        "/actions",
        &format!("person_id={person}&description=Shipped&valence=unknown"),
    );
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_invalid");
    assert_eq!(res.json()["field"], "valence");
}

#[tokio::test]
async fn form_errors_render_as_markup_by_default() {
    let app = test_app();
    let res = send(&app, form("POST", "/people", "role=Engineer")).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.is_html(), "{}", res.content_type());
    assert!(res.body.contains("data-field=\"name\""));
}

#[tokio::test]
async fn omitted_occurred_at_is_close_to_now() {
    let app = test_app();
    let person = create_person(&app, "Grace").await;
    let before = Utc::now() - chrono::Duration::seconds(1);

    let mut req = form(
        "POST",
        "/actions",
        &format!("person_id={person}&description=Fixed+the+build&valence=positive"),
    );
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let occurred: DateTime<Utc> = res.json()["occurred_at"].as_str().unwrap().parse().unwrap();
    assert!(occurred >= before);
    assert!(occurred <= Utc::now() + chrono::Duration::seconds(1));
}

#[tokio::test]
async fn browser_form_without_accept_gets_a_fragment() {
    let app = test_app();
    let res = send(&app, form("POST", "/people", "name=Ada+Lovelace&role=")).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.is_html());
    assert!(res.body.contains("<li class=\"person\""));
    assert!(res.body.contains("Ada Lovelace"));
    assert!(!res.body.contains("class=\"role\""));
}

#[tokio::test]
async fn themes_are_collected_from_repeated_fields() {
    let app = test_app();
    let person = create_person(&app, "Linus").await;
    let delivery = create_theme(&app, "Delivery").await;
    let mentoring = create_theme(&app, "Mentoring").await;

    let mut req = form(
        "POST",
        "/actions",
        &format!(
            "person_id={person}&description=Paired&valence=neutral\
             &occurred_at=2024-03-01T09:30&themes={mentoring}&themes=&themes={delivery}"
        ),
    );
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let body = res.json();
    assert_eq!(body["valence"], "neutral");
    assert_eq!(body["occurred_at"], "2024-03-01T09:30:00Z");
    let names: Vec<&str> = body["themes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Delivery", "Mentoring"]);
}

#[tokio::test]
async fn multipart_forms_are_normalized() {
    let app = test_app();
    let boundary = "XtallyBoundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nKatherine\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"role\"\r\n\r\nAnalyst\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method("POST")
        .uri("/people")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("accept", "application/json")
        .body(Body::from(body))
        .unwrap();
    let res = send(&app, req).await;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.json()["name"], "Katherine");
    assert_eq!(res.json()["role"], "Analyst");
}

#[tokio::test]
async fn update_form_clears_optional_text_and_rejects_neutral() {
    let app = test_app();
    let person = create_person(&app, "Edsger").await;

    let mut req = form("PUT", &format!("/people/{person}"), "name=Edsger&role=");
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["role"], serde_json::Value::Null);

    let created = send(
        &app,
        helpers::json(
            "POST",
            "/actions",
            serde_json::json!({"person_id": person, "description": "x", "valence": "positive"}),
        ),
    )
    .await;
    let action = created.json()["id"].as_str().unwrap().to_owned();

    let mut req = form(
        "PATCH",
        &format!("/actions/{action}"),
        "description=x&valence=neutral",
    );
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_invalid");
}

#[tokio::test]
async fn oversized_form_is_rejected() {
    let app = test_app_with(ServerConfig {
        max_body_bytes: 32,
        ..ServerConfig::default()
    });
    let mut req = form("POST", "/people", &format!("name={}", "a".repeat(100)));
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json()["code"], "payload_too_large");
}

#[tokio::test]
async fn bad_timestamp_is_format_invalid() {
    let app = test_app();
    let person = create_person(&app, "Ada").await;

    let mut req = form(
        "POST",
        "/conversations",
        &format!("person_id={person}&summary=Check-in&held_at=next+week"),
    );
    req.headers_mut()
        .insert("accept", "application/json".parse().unwrap());
    let res = send(&app, req).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_format_invalid");
    assert_eq!(res.json()["field"], "held_at");
}
