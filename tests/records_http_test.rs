mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use helpers::{create_person, create_theme, get, json, send, test_app};
use serde_json::json;

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn people_crud() {
    let app = test_app();
    let res = send(
        &app,
        json("POST", "/people", json!({"name": "  Ada  ", "role": "Engineer"})),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let person = res.json();
    assert_eq!(person["name"], "Ada");
    assert_eq!(person["role"], "Engineer");
    let id = person["id"].as_str().unwrap();
    assert_eq!(id.len(), 20);

    let res = send(
        &app,
        json("PUT", &format!("/people/{id}"), json!({"name": "Ada L."})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["name"], "Ada L.");
    assert_eq!(res.json()["role"], "Engineer");

    let res = send(
        &app,
        json("PATCH", &format!("/people/{id}"), json!({"name": "Ada L.", "role": ""})),
    )
    .await;
    assert_eq!(res.json()["role"], serde_json::Value::Null);

    let res = send(&app, delete(&format!("/people/{id}"))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"id": id, "resource": "person"}));

    let res = send(&app, get(&format!("/people/{id}"))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn themes_crud() {
    let app = test_app();
    let id = create_theme(&app, "Delivery").await;

    let res = send(
        &app,
        json(
            "PUT",
            &format!("/themes/{id}"),
            json!({"name": "Delivery", "description": "Shipping on time"}),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["description"], "Shipping on time");

    let res = send(&app, get(&format!("/themes/{id}"))).await;
    assert_eq!(res.json()["name"], "Delivery");

    let res = send(&app, delete(&format!("/themes/{id}"))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(send(&app, get("/themes")).await.json(), json!([]));
}

#[tokio::test]
async fn actions_are_listed_newest_first_and_filtered() {
    let app = test_app();
    let ada = create_person(&app, "Ada").await;
    let grace = create_person(&app, "Grace").await;
    let theme = create_theme(&app, "Mentoring").await;

    for (person, description, valence, at, themes) in [
        (&ada, "Older", "positive", "2024-01-01T10:00:00Z", json!([])),
        (&ada, "Newer", "negative", "2024-02-01T10:00:00Z", json!([theme])),
        (&grace, "Other", "neutral", "2024-03-01T10:00:00Z", json!([])),
    ] {
        let res = send(
            &app,
            json(
                "POST",
                "/actions",
                json!({
                    "person_id": person,
                    "description": description,
                    "valence": valence,
                    "occurred_at": at,
                    "themes": themes,
                }),
            ),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    }

    let all = send(&app, get("/actions")).await.json();
    let order: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["description"].as_str().unwrap())
        .collect();
    assert_eq!(order, ["Other", "Newer", "Older"]);

    let mine = send(&app, get(&format!("/actions?person_id={ada}"))).await.json();
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let negative = send(&app, get("/actions?valence=negative")).await.json();
    assert_eq!(negative[0]["description"], "Newer");
    assert_eq!(negative.as_array().unwrap().len(), 1);

    let tagged = send(&app, get(&format!("/actions?theme_id={theme}"))).await.json();
    assert_eq!(tagged[0]["themes"][0]["name"], "Mentoring");

    let bad = send(&app, get("/actions?valence=great")).await;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad.json()["field"], "valence");
}

#[tokio::test]
async fn action_update_keeps_time_and_rejects_neutral() {
    let app = test_app();
    let person = create_person(&app, "Ada").await;
    let created = send(
        &app,
        json(
            "POST",
            "/actions",
            json!({
                "person_id": person,
                "description": "Draft",
                "valence": "positive",
                "occurred_at": "2024-01-01T10:00:00Z",
                "references": "PR-12",
            }),
        ),
    )
    .await
    .json();
    let id = created["id"].as_str().unwrap();

    let res = send(
        &app,
        json(
            "PUT",
            &format!("/actions/{id}"),
            json!({"description": "Final", "valence": "negative", "references": ""}),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let updated = res.json();
    assert_eq!(updated["description"], "Final");
    assert_eq!(updated["occurred_at"], "2024-01-01T10:00:00Z");
    assert_eq!(updated["references"], serde_json::Value::Null);

    let res = send(
        &app,
        json(
            "PUT",
            &format!("/actions/{id}"),
            json!({"description": "Final", "valence": "neutral"}),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_invalid");
    assert_eq!(res.json()["field"], "valence");
}

#[tokio::test]
async fn conversations_crud_and_filter() {
    let app = test_app();
    let ada = create_person(&app, "Ada").await;
    let grace = create_person(&app, "Grace").await;

    let res = send(
        &app,
        json(
            "POST",
            "/conversations",
            json!({"person_id": ada, "summary": "Career chat", "follow_up": "Send course list"}),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let id = res.json()["id"].as_str().unwrap().to_owned();

    send(
        &app,
        json("POST", "/conversations", json!({"person_id": grace, "summary": "Intro"})),
    )
    .await;

    let res = send(
        &app,
        json(
            "PATCH",
            &format!("/conversations/{id}"),
            json!({"summary": "Career chat", "follow_up": ""}),
        ),
    )
    .await;
    assert_eq!(res.json()["follow_up"], serde_json::Value::Null);

    let listed = send(&app, get(&format!("/conversations?person_id={ada}"))).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["summary"], "Career chat");

    let res = send(&app, delete(&format!("/conversations/{id}"))).await;
    assert_eq!(res.json()["resource"], "conversation");
}

#[tokio::test]
async fn person_detail_and_cascade() {
    let app = test_app();
    let person = create_person(&app, "Ada").await;
    send(
        &app,
        json(
            "POST",
            "/actions",
            json!({"person_id": person, "description": "Shipped", "valence": "positive"}),
        ),
    )
    .await;
    send(
        &app,
        json("POST", "/conversations", json!({"person_id": person, "summary": "1:1"})),
    )
    .await;

    let detail = send(&app, get(&format!("/people/{person}"))).await.json();
    assert_eq!(detail["person"]["name"], "Ada");
    assert_eq!(detail["actions"][0]["description"], "Shipped");
    assert_eq!(detail["conversations"][0]["summary"], "1:1");

    send(&app, delete(&format!("/people/{person}"))).await;
    assert_eq!(send(&app, get("/actions")).await.json(), json!([]));
    assert_eq!(send(&app, get("/conversations")).await.json(), json!([]));
}

#[tokio::test]
async fn unknown_person_on_action_is_not_found() {
    let app = test_app();
    let res = send(
        &app,
        json(
            "POST",
            "/actions",
            json!({"person_id": "00000000000000000000", "description": "x", "valence": "positive"}),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["code"], "not_found");
}

#[tokio::test]
async fn undecodable_path_id_is_format_invalid() {
    let app = test_app();
    let res = send(&app, get("/people/not-a-valid-id")).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_format_invalid");
    assert_eq!(res.json()["field"], "id");
}

#[tokio::test]
async fn blank_json_name_is_required() {
    let app = test_app();
    let res = send(&app, json("POST", "/people", json!({"name": "   "}))).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_required");
    assert_eq!(res.json()["field"], "name");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/people")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "body_malformed");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = test_app();
    let res = send(&app, get("/nowhere")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["code"], "not_found");
}

#[tokio::test]
async fn missing_json_description_is_required() {
    let app = test_app();
    let person = create_person(&app, "Ada").await;
    let res = send(
        &app,
        json("POST", "/actions", json!({"person_id": person, "valence": "positive"})),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "field_required");
    assert_eq!(res.json()["field"], "description");
    assert_eq!(send(&app, get("/actions")).await.json(), json!([]));

    let res = send(
        &app,
        json("POST", "/conversations", json!({"person_id": person})),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["field"], "summary");
}
