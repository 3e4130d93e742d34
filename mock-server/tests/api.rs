use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Envelope, Todo};
use tower::ServiceExt;

async fn body_envelope(response: axum::response::Response) -> Envelope {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- todos ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app().oneshot(empty_request("GET", "/todos")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let env = body_envelope(resp).await;
    assert_eq!(env.code, 0);
    assert_eq!(env.data, serde_json::json!([]));
}

#[tokio::test]
async fn create_todo_returns_201_envelope() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", r#"{"title":"Buy milk"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let env = body_envelope(resp).await;
    assert_eq!(env.code, 0);
    let todo: Todo = serde_json::from_value(env.data).unwrap();
    assert_eq!(todo.title, "Buy milk");
    assert!(!todo.completed);
}

#[tokio::test]
async fn get_todo_not_found_is_an_envelope() {
    let resp = app()
        .oneshot(empty_request("GET", "/todos/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let env = body_envelope(resp).await;
    assert_eq!(env.code, 404);
    assert_eq!(env.message.as_deref(), Some("todo not found"));
}

#[tokio::test]
async fn patch_todo_not_found() {
    let resp = app()
        .oneshot(json_request(
            "PATCH",
            "/todos/00000000-0000-0000-0000-000000000000",
            r#"{"completed":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn todo_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/todos", r#"{"title":"Walk dog"}"#))
        .await
        .unwrap();
    let created: Todo = serde_json::from_value(body_envelope(resp).await.data).unwrap();
    let id = created.id;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", &format!("/todos/{id}"), r#"{"completed":true}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = serde_json::from_value(body_envelope(resp).await.data).unwrap();
    assert_eq!(updated.title, "Walk dog"); // unchanged
    assert!(updated.completed);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/todos/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let env = body_envelope(resp).await;
    assert_eq!(env.data["id"], id.to_string());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/todos/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- envelope fixtures ---

#[tokio::test]
async fn echo_reflects_request() {
    let resp = app()
        .oneshot(json_request("PUT", "/echo?page=2", r#"{"a":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let env = body_envelope(resp).await;
    assert_eq!(env.code, 0);
    assert_eq!(env.data["method"], "PUT");
    assert_eq!(env.data["query"], "page=2");
    assert_eq!(env.data["content_type"], "application/json");
    assert_eq!(env.data["body"], r#"{"a":1}"#);
}

#[tokio::test]
async fn custom_code_is_sent_verbatim() {
    let resp = app().oneshot(empty_request("GET", "/code/200")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let env = body_envelope(resp).await;
    assert_eq!(env.code, 200);
    assert_eq!(env.message.as_deref(), Some("code 200"));
}

#[tokio::test]
async fn malformed_returns_plain_text() {
    let resp = app().oneshot(empty_request("GET", "/malformed")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"upstream unavailable");
}
