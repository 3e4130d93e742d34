use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Wire envelope. `code` is whatever the handler chooses, not just 0/1.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub message: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn ok(data: impl Serialize) -> Json<Self> {
        Json(Self {
            code: 0,
            message: None,
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        })
    }

    pub fn fail(code: i64, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            code,
            message: Some(message.into()),
            data: Value::Null,
        })
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Todo>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(update_todo)
                .patch(update_todo)
                .delete(delete_todo),
        )
        .route("/echo", any(echo))
        .route("/code/{code}", get(custom_code))
        .route("/malformed", get(malformed))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found() -> (StatusCode, Json<Envelope>) {
    (StatusCode::NOT_FOUND, Envelope::fail(404, "todo not found"))
}

async fn list_todos(State(db): State<Db>) -> Json<Envelope> {
    let todos = db.read().await;
    Envelope::ok(todos.values().cloned().collect::<Vec<_>>())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Envelope>) {
    let todo = Todo {
        id: Uuid::new_v4(),
        title: input.title,
        completed: input.completed,
    };
    db.write().await.insert(todo.id, todo.clone());
    tracing::info!(id = %todo.id, "todo created");
    (StatusCode::CREATED, Envelope::ok(todo))
}

async fn get_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope>, (StatusCode, Json<Envelope>)> {
    let todos = db.read().await;
    todos.get(&id).map(Envelope::ok).ok_or_else(not_found)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Envelope>, (StatusCode, Json<Envelope>)> {
    let mut todos = db.write().await;
    let todo = todos.get_mut(&id).ok_or_else(not_found)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Envelope::ok(&*todo))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope>, (StatusCode, Json<Envelope>)> {
    let mut todos = db.write().await;
    todos
        .remove(&id)
        .map(|todo| Envelope::ok(json!({ "id": todo.id })))
        .ok_or_else(not_found)
}

/// Reflects the request back inside a success envelope.
async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String) -> Json<Envelope> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    Envelope::ok(json!({
        "method": method.as_str(),
        "query": query,
        "content_type": content_type,
        "body": body,
    }))
}

async fn custom_code(Path(code): Path<i64>) -> Json<Envelope> {
    Envelope::fail(code, format!("code {code}"))
}

async fn malformed() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/plain")],
        "upstream unavailable",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_serializes_with_zero_code() {
        let todo = Todo {
            id: Uuid::nil(),
            title: "Test".to_string(),
            completed: false,
        };
        let json = serde_json::to_value(&Envelope::ok(todo).0).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["message"], Value::Null);
        assert_eq!(json["data"]["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["data"]["title"], "Test");
    }

    #[test]
    fn fail_envelope_carries_code_and_message() {
        let json = serde_json::to_value(&Envelope::fail(404, "todo not found").0).unwrap();
        assert_eq!(json["code"], 404);
        assert_eq!(json["message"], "todo not found");
        assert_eq!(json["data"], Value::Null);
    }

    #[test]
    fn create_todo_defaults_completed_to_false() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"No completed field"}"#).unwrap();
        assert_eq!(input.title, "No completed field");
        assert!(!input.completed);
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.completed.is_none());
    }
}
