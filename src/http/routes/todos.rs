use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};

use crate::application::todo_service::{TodoList, TodoService};
use crate::domain::query::ListParams;
use crate::domain::todo::TodoId;
use crate::domain::validation::TodoInput;
use crate::http::auth::{Caller, SharedAuthenticator};
use crate::http::types::{ApiError, Message, SummaryEnvelope, TodoEnvelope, TodoMessage};

#[derive(Clone)]
pub struct AppState<S: TodoService> {
    pub service: S,
    pub authenticator: SharedAuthenticator,
    /// Include store error text in 500 bodies (non-production only).
    pub expose_errors: bool,
}

impl<S: TodoService> AppState<S> {
    pub fn new(service: S, authenticator: SharedAuthenticator, expose_errors: bool) -> Self {
        Self { service, authenticator, expose_errors }
    }
}

pub fn router<S: TodoService + Clone>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/stats/summary", get(todo_summary::<S>))
        .route("/todos/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(
    State(state): State<AppState<S>>,
    Caller(owner): Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TodoList>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected query string");
        ApiError::BadRequest("Invalid query parameters".into())
    })?;
    let list = state
        .service
        .list(&owner, &params)
        .await
        .map_err(|e| ApiError::from_service(e, "fetching todos", state.expose_errors))?;
    Ok(Json(list))
}

async fn get_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Caller(owner): Caller,
    Path(id): Path<String>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state
        .service
        .get(&owner, id)
        .await
        .map_err(|e| ApiError::from_service(e, "fetching todo", state.expose_errors))?;
    Ok(Json(TodoEnvelope { todo }))
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Caller(owner): Caller,
    payload: Result<Json<TodoInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoMessage>), ApiError> {
    let Json(input) = payload.map_err(invalid_body)?;
    let todo = state
        .service
        .create(&owner, input)
        .await
        .map_err(|e| ApiError::from_service(e, "creating todo", state.expose_errors))?;
    Ok((StatusCode::CREATED, Json(TodoMessage { message: "Todo created successfully", todo })))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Caller(owner): Caller,
    Path(id): Path<String>,
    payload: Result<Json<TodoInput>, JsonRejection>,
) -> Result<Json<TodoMessage>, ApiError> {
    let Json(input) = payload.map_err(invalid_body)?;
    let id = match parse_id(&id) {
        Ok(id) => id,
        // a bad body is still reported ahead of the unknown id
        Err(not_found) => return Err(input.into_patch().err().map(ApiError::Validation).unwrap_or(not_found)),
    };
    let todo = state
        .service
        .update(&owner, id, input)
        .await
        .map_err(|e| ApiError::from_service(e, "updating todo", state.expose_errors))?;
    Ok(Json(TodoMessage { message: "Todo updated successfully", todo }))
}

async fn delete_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Caller(owner): Caller,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    state
        .service
        .delete(&owner, id)
        .await
        .map_err(|e| ApiError::from_service(e, "deleting todo", state.expose_errors))?;
    Ok(Json(Message { message: "Todo deleted successfully" }))
}

async fn todo_summary<S: TodoService>(
    State(state): State<AppState<S>>,
    Caller(owner): Caller,
) -> Result<Json<SummaryEnvelope>, ApiError> {
    let summary = state
        .service
        .summary(&owner)
        .await
        .map_err(|e| ApiError::from_service(e, "fetching statistics", state.expose_errors))?;
    Ok(Json(SummaryEnvelope { summary }))
}

/// Ids that cannot exist are reported like ids that do not.
fn parse_id(raw: &str) -> Result<TodoId, ApiError> { raw.parse().map_err(|_| ApiError::NotFound) }

fn invalid_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    ApiError::BadRequest("Invalid request body".into())
}
