use std::sync::Arc;

use clockwork::{Dispatcher, Intercepted, LogTime, intercept};
use tracing::debug;

use crate::{Todo, TodoBase, TodoError, TodoRepository};

/// CRUD operations on todos. Every call is timed.
#[derive(Intercepted)]
pub struct TodoService {
    dispatcher: Dispatcher,
    repository: Arc<dyn TodoRepository>,
}

#[intercept(LogTime)]
impl TodoService {
    pub fn new(dispatcher: Dispatcher, repository: Arc<dyn TodoRepository>) -> Self {
        Self {
            dispatcher,
            repository,
        }
    }

    /// Stores a new todo and returns its id.
    pub async fn create(&self, base: TodoBase) -> Result<u32, TodoError> {
        base.validate()?;
        let todo = self.repository.insert(base).await;
        debug!(id = todo.id, "todo stored");
        Ok(todo.id)
    }

    pub async fn get_all(&self) -> Result<Vec<Todo>, TodoError> {
        Ok(self.repository.all().await)
    }

    pub async fn find_by_id(&self, id: u32) -> Result<Todo, TodoError> {
        self.repository.get(id).await.ok_or(TodoError::NotFound(id))
    }

    pub async fn update(&self, id: u32, base: TodoBase) -> Result<(), TodoError> {
        base.validate()?;
        self.repository
            .replace(id, base)
            .await
            .map(|_| ())
            .ok_or(TodoError::NotFound(id))
    }

    pub async fn delete(&self, id: u32) -> Result<(), TodoError> {
        self.repository
            .remove(id)
            .await
            .map(|_| ())
            .ok_or(TodoError::NotFound(id))
    }
}
