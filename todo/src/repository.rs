use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Todo, TodoBase};

/// Storage for todos.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    /// Stores a new todo under a fresh id.
    async fn insert(&self, base: TodoBase) -> Todo;

    /// Every todo, ordered by id.
    async fn all(&self) -> Vec<Todo>;

    async fn get(&self, id: u32) -> Option<Todo>;

    /// Overwrites an existing todo. Returns `None` when there is nothing to overwrite.
    async fn replace(&self, id: u32, base: TodoBase) -> Option<Todo>;

    async fn remove(&self, id: u32) -> Option<Todo>;
}

#[derive(Debug)]
struct Store {
    todos: BTreeMap<u32, Todo>,
    next_id: u32,
}

/// Keeps todos in memory. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct MemoryTodoRepository {
    store: RwLock<Store>,
}

impl Default for MemoryTodoRepository {
    fn default() -> Self {
        Self {
            store: RwLock::new(Store {
                todos: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn insert(&self, base: TodoBase) -> Todo {
        let mut store = self.store.write().await;
        let id = store.next_id;
        store.next_id += 1;
        let todo = base.into_todo(id);
        store.todos.insert(id, todo.clone());
        todo
    }

    async fn all(&self) -> Vec<Todo> {
        self.store.read().await.todos.values().cloned().collect()
    }

    async fn get(&self, id: u32) -> Option<Todo> {
        self.store.read().await.todos.get(&id).cloned()
    }

    async fn replace(&self, id: u32, base: TodoBase) -> Option<Todo> {
        let mut store = self.store.write().await;
        let slot = store.todos.get_mut(&id)?;
        *slot = base.into_todo(id);
        Some(slot.clone())
    }

    async fn remove(&self, id: u32) -> Option<Todo> {
        self.store.write().await.todos.remove(&id)
    }
}
