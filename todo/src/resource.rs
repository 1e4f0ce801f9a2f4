use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clockwork::{Dispatcher, Intercepted, LogTime, intercept};
use tracing::info;

use crate::{ApiError, TodoBase, TodoService};

/// HTTP face of the [`TodoService`]. Every request is timed.
#[derive(Intercepted)]
pub struct TodoResource {
    dispatcher: Dispatcher,
    service: Arc<TodoService>,
}

#[intercept(LogTime)]
impl TodoResource {
    pub fn new(dispatcher: Dispatcher, service: Arc<TodoService>) -> Self {
        Self {
            dispatcher,
            service,
        }
    }

    /// 201 with the new todo's location, 406 when the todo is rejected.
    pub async fn create(&self, base: TodoBase) -> Result<Response, ApiError> {
        info!(todo = ?base, "creating todo");
        let id = self.service.create(base).await?;
        let location = format!("/todo/{id}");
        Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
    }

    /// 200 with every todo, 204 when there are none.
    pub async fn get_all(&self) -> Result<Response, ApiError> {
        let todos = self.service.get_all().await?;
        if todos.is_empty() {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
        Ok(Json(todos).into_response())
    }

    pub async fn find_by_id(&self, id: u32) -> Result<Response, ApiError> {
        let todo = self.service.find_by_id(id).await?;
        Ok(Json(todo).into_response())
    }

    pub async fn update(&self, id: u32, base: TodoBase) -> Result<Response, ApiError> {
        self.service.update(id, base).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    pub async fn delete(&self, id: u32) -> Result<Response, ApiError> {
        self.service.delete(id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

/// Routes `/todo` and `/todo/:id` to the resource.
pub fn router(resource: Arc<TodoResource>) -> Router {
    Router::new()
        .route("/todo", post(create_todo).get(list_todos))
        .route(
            "/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(resource)
}

async fn create_todo(
    State(resource): State<Arc<TodoResource>>,
    Json(base): Json<TodoBase>,
) -> Result<Response, ApiError> {
    resource.create(base).await
}

async fn list_todos(State(resource): State<Arc<TodoResource>>) -> Result<Response, ApiError> {
    resource.get_all().await
}

async fn get_todo(
    State(resource): State<Arc<TodoResource>>,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    resource.find_by_id(id).await
}

async fn update_todo(
    State(resource): State<Arc<TodoResource>>,
    Path(id): Path<u32>,
    Json(base): Json<TodoBase>,
) -> Result<Response, ApiError> {
    resource.update(id, base).await
}

async fn delete_todo(
    State(resource): State<Arc<TodoResource>>,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    resource.delete(id).await
}
