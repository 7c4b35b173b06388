/// End-to-end tests through the HTTP router
///
/// These run against the in-memory store; the PostgreSQL store has its own
/// tests in `taskboard-shared`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(response.header("x-content-type-options").is_some());
}

#[tokio::test]
async fn test_registration_and_login() {
    let ctx = TestContext::new();

    let (id, _) = ctx.register("Ada@Example.com", "secret").await;

    let response = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "ada@example.com", "password": "secret" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // The token is the raw body, not a JSON document
    let token = response.text();
    assert_eq!(token.split('.').count(), 3);

    let me = ctx.get(&format!("/api/users/{}", id), &token).await;
    assert_eq!(me.status, StatusCode::OK);
    let body = me.json();
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["firstName"], "Test");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new();
    ctx.register("bob@example.com", "secret").await;

    let wrong_password = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "bob@example.com", "password": "nope" })),
        )
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);

    let unknown_user = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "nobody@example.com", "password": "secret" })),
        )
        .await;
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    for uri in ["/api/users", "/api/task_statuses", "/api/labels", "/api/tasks"] {
        let response = ctx.send(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let forged = ctx.get("/api/tasks", "not.a.token").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_authorization_is_unauthorized() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/labels")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .expect("failed to build request");
    let response = ctx.app.clone().oneshot(request).await.expect("router is infallible");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_normalizes_padded_email() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": " Kim@Example.COM ", "password": "secret" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    assert_eq!(response.json()["email"], "kim@example.com");

    let login = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "kim@example.com", "password": "secret" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_registration_validation_and_duplicates() {
    let ctx = TestContext::new();
    ctx.register("carol@example.com", "secret").await;

    let duplicate = ctx
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "CAROL@example.com", "password": "other" })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let invalid = ctx
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "not-an-email", "password": "pw" })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = invalid.json();
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_array().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn test_users_can_only_modify_themselves() {
    let ctx = TestContext::new();
    let (ada, ada_token) = ctx.register("ada@example.com", "secret").await;
    let (bob, _) = ctx.register("bob@example.com", "secret").await;

    let foreign_update = ctx
        .put(&format!("/api/users/{}", bob), &ada_token, json!({ "firstName": "Hacked" }))
        .await;
    assert_eq!(foreign_update.status, StatusCode::FORBIDDEN);

    let foreign_delete = ctx.delete(&format!("/api/users/{}", bob), &ada_token).await;
    assert_eq!(foreign_delete.status, StatusCode::FORBIDDEN);

    let own_update = ctx
        .put(&format!("/api/users/{}", ada), &ada_token, json!({ "lastName": "Lovelace" }))
        .await;
    assert_eq!(own_update.status, StatusCode::OK);
    let body = own_update.json();
    assert_eq!(body["lastName"], "Lovelace");
    assert_eq!(body["firstName"], "Test");

    let own_delete = ctx.delete(&format!("/api/users/{}", ada), &ada_token).await;
    assert_eq!(own_delete.status, StatusCode::NO_CONTENT);

    let gone = ctx.get(&format!("/api/users/{}", ada), &ada_token).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_password_change_takes_effect() {
    let ctx = TestContext::new();
    let (id, token) = ctx.register("dan@example.com", "old-secret").await;

    let response = ctx
        .put(&format!("/api/users/{}", id), &token, json!({ "password": "new-secret" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let old = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "dan@example.com", "password": "old-secret" })),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = ctx
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "dan@example.com", "password": "new-secret" })),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_sets_total_count_header() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("eve@example.com", "secret").await;

    ctx.create_label(&token, "bug").await;
    ctx.create_label(&token, "feature").await;

    let response = ctx.get("/api/labels", &token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-total-count").as_deref(), Some("2"));
    assert_eq!(response.json().as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_status_crud() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("fay@example.com", "secret").await;

    let id = ctx.create_status(&token, "Draft", "draft").await;

    let renamed = ctx
        .put(&format!("/api/task_statuses/{}", id), &token, json!({ "name": "Sketch" }))
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.json()["name"], "Sketch");
    assert_eq!(renamed.json()["slug"], "draft");

    let duplicate = ctx
        .post("/api/task_statuses", &token, json!({ "name": "Other", "slug": "draft" }))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let deleted = ctx.delete(&format!("/api/task_statuses/{}", id), &token).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = ctx.delete(&format!("/api/task_statuses/{}", id), &token).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_label_name_length_is_validated() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("gus@example.com", "secret").await;

    let response = ctx.post("/api/labels", &token, json!({ "name": "ab" })).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    let (user, token) = ctx.register("hal@example.com", "secret").await;
    ctx.create_status(&token, "Draft", "draft").await;
    ctx.create_status(&token, "To review", "to_review").await;
    let bug = ctx.create_label(&token, "bug").await;

    let created = ctx
        .post(
            "/api/tasks",
            &token,
            json!({
                "title": "Fix login",
                "content": "Tokens expire too early",
                "index": 7,
                "assignee_id": user,
                "status": "draft",
                "taskLabelIds": [bug, bug, 9999],
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());
    let body = created.json();
    let task_id = body["id"].as_i64().expect("task id");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["assignee_id"], user);
    assert_eq!(body["taskLabelIds"], json!([bug]));

    let moved = ctx
        .put(
            &format!("/api/tasks/{}", task_id),
            &token,
            json!({ "status": "to_review", "assignee_id": null }),
        )
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    let body = moved.json();
    assert_eq!(body["status"], "to_review");
    assert!(body["assignee_id"].is_null());
    assert_eq!(body["title"], "Fix login");
    assert_eq!(body["index"], 7);

    let cleared = ctx
        .put(&format!("/api/tasks/{}", task_id), &token, json!({ "taskLabelIds": [] }))
        .await;
    assert_eq!(cleared.json()["taskLabelIds"], json!([]));

    let deleted = ctx.delete(&format!("/api/tasks/{}", task_id), &token).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = ctx.get(&format!("/api/tasks/{}", task_id), &token).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_unknown_references() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register("ivy@example.com", "secret").await;
    ctx.create_status(&token, "Draft", "draft").await;

    let unknown_status = ctx
        .post("/api/tasks", &token, json!({ "title": "T", "status": "nope" }))
        .await;
    assert_eq!(unknown_status.status, StatusCode::NOT_FOUND);

    let unknown_assignee = ctx
        .post(
            "/api/tasks",
            &token,
            json!({ "title": "T", "status": "draft", "assignee_id": 9999 }),
        )
        .await;
    assert_eq!(unknown_assignee.status, StatusCode::NOT_FOUND);

    let blank_title = ctx
        .post("/api/tasks", &token, json!({ "title": "", "status": "draft" }))
        .await;
    assert_eq!(blank_title.status, StatusCode::UNPROCESSABLE_ENTITY);

    let listed = ctx.get("/api/tasks", &token).await;
    assert_eq!(listed.header("x-total-count").as_deref(), Some("0"));
}

#[tokio::test]
async fn test_task_filters() {
    let ctx = TestContext::new();
    let (ada, token) = ctx.register("ada@example.com", "secret").await;
    let (bob, _) = ctx.register("bob@example.com", "secret").await;
    ctx.create_status(&token, "Draft", "draft").await;
    ctx.create_status(&token, "Done", "done").await;
    let bug = ctx.create_label(&token, "bug").await;

    for (title, assignee, status, labels) in [
        ("Review PR", ada, "draft", vec![bug]),
        ("Write docs", bob, "draft", vec![]),
        ("review release", ada, "done", vec![]),
    ] {
        let response = ctx
            .post(
                "/api/tasks",
                &token,
                json!({
                    "title": title,
                    "assignee_id": assignee,
                    "status": status,
                    "taskLabelIds": labels,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    }

    let titles = |response: &common::TestResponse| -> Vec<String> {
        let mut titles: Vec<String> = response
            .json()
            .as_array()
            .expect("array")
            .iter()
            .map(|t| t["title"].as_str().unwrap_or_default().to_string())
            .collect();
        titles.sort();
        titles
    };

    let all = ctx.get("/api/tasks", &token).await;
    assert_eq!(titles(&all).len(), 3);
    assert_eq!(all.header("x-total-count").as_deref(), Some("3"));

    let by_title = ctx.get("/api/tasks?titleCont=REVIEW", &token).await;
    assert_eq!(titles(&by_title), vec!["Review PR", "review release"]);

    let combined = ctx
        .get(&format!("/api/tasks?titleCont=review&assigneeId={}&status=done", ada), &token)
        .await;
    assert_eq!(titles(&combined), vec!["review release"]);

    let by_label = ctx.get(&format!("/api/tasks?labelId={}", bug), &token).await;
    assert_eq!(titles(&by_label), vec!["Review PR"]);

    let by_assignee = ctx.get(&format!("/api/tasks?assigneeId={}", bob), &token).await;
    assert_eq!(titles(&by_assignee), vec!["Write docs"]);

    // The header counts every task, not only the filtered page
    assert_eq!(by_assignee.header("x-total-count").as_deref(), Some("3"));

    let case_sensitive_status = ctx.get("/api/tasks?status=DRAFT", &token).await;
    assert!(titles(&case_sensitive_status).is_empty());
}

#[tokio::test]
async fn test_referenced_entities_cannot_be_deleted() {
    let ctx = TestContext::new();
    let (user, token) = ctx.register("jay@example.com", "secret").await;
    let status = ctx.create_status(&token, "Draft", "draft").await;
    let label = ctx.create_label(&token, "bug").await;

    let task = ctx
        .post(
            "/api/tasks",
            &token,
            json!({
                "title": "Pinned",
                "assignee_id": user,
                "status": "draft",
                "taskLabelIds": [label],
            }),
        )
        .await;
    assert_eq!(task.status, StatusCode::CREATED);
    let task_id = task.json()["id"].as_i64().expect("task id");

    let status_delete = ctx.delete(&format!("/api/task_statuses/{}", status), &token).await;
    assert_eq!(status_delete.status, StatusCode::CONFLICT);
    assert_eq!(status_delete.json()["error"], "conflict");

    let label_delete = ctx.delete(&format!("/api/labels/{}", label), &token).await;
    assert_eq!(label_delete.status, StatusCode::CONFLICT);

    let user_delete = ctx.delete(&format!("/api/users/{}", user), &token).await;
    assert_eq!(user_delete.status, StatusCode::CONFLICT);

    // Once the task is gone, everything it referenced can go too
    ctx.delete(&format!("/api/tasks/{}", task_id), &token).await;

    for uri in [
        format!("/api/task_statuses/{}", status),
        format!("/api/labels/{}", label),
        format!("/api/users/{}", user),
    ] {
        let response = ctx.delete(&uri, &token).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT, "{}", uri);
    }
}
