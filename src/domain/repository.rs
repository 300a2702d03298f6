use async_trait::async_trait;

use super::query::TodoQuery;
use super::todo::{NewTodo, OwnerId, Todo, TodoId, TodoPatch, TodoStatus};

/// Persistent todo store. Every call is scoped to one owner: a record owned by
/// anyone else is reported exactly like a missing one.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn insert(&self, owner: &OwnerId, input: NewTodo) -> anyhow::Result<Todo>;
    async fn get(&self, id: TodoId, owner: &OwnerId) -> anyhow::Result<Option<Todo>>;
    async fn query(&self, owner: &OwnerId, query: &TodoQuery) -> anyhow::Result<Vec<Todo>>;
    async fn update(&self, id: TodoId, owner: &OwnerId, patch: TodoPatch) -> anyhow::Result<Option<Todo>>;
    async fn delete(&self, id: TodoId, owner: &OwnerId) -> anyhow::Result<bool>;
    async fn count_by_status(&self, owner: &OwnerId) -> anyhow::Result<Vec<(TodoStatus, u64)>>;
    /// Removes every todo of `owner`, returning how many went away.
    async fn delete_all(&self, owner: &OwnerId) -> anyhow::Result<u64>;
}
