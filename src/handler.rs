use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    error::ApiError,
    repo,
    schema::{CreateTodoSchema, FilterOptions, UpdateTodoSchema},
    AppState,
};

// Handler for the health check route
pub async fn health_checker_handler(State(data): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "database": data.db.kind().name(),
    }))
}

// Handler for listing Todo items, with optional completed/priority filters
pub async fn list_todos(
    State(data): State<Arc<AppState>>,
    filter: Result<Query<FilterOptions>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = filter?;
    let todos = repo::list_todos(&data.db, &filter).await?;
    Ok(Json(todos))
}

// Handler for getting a specific Todo by ID
pub async fn get_todo(
    id: Result<Path<i32>, PathRejection>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let todo = repo::get_todo(&data.db, id)
        .await?
        .ok_or(ApiError::NotFound(id))?;
    Ok(Json(todo))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    body: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let new = body.validate()?;
    let todo = repo::create_todo(&data.db, new).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

// Handler for updating a Todo by ID; absent fields are left unchanged
pub async fn update_todo(
    id: Result<Path<i32>, PathRejection>,
    State(data): State<Arc<AppState>>,
    body: Result<Json<UpdateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let changes = body.validate()?;
    let todo = repo::update_todo(&data.db, id, changes)
        .await?
        .ok_or(ApiError::NotFound(id))?;
    Ok(Json(todo))
}

// Handler for deleting a Todo by ID
pub async fn delete_todo(
    id: Result<Path<i32>, PathRejection>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    if !repo::delete_todo(&data.db, id).await? {
        return Err(ApiError::NotFound(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
