use async_trait::async_trait;
use serde::Serialize;

use crate::application::statistics::StatusSummary;
use crate::domain::error::TodoError;
use crate::domain::query::{ListParams, TodoQuery};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{OwnerId, Todo, TodoId};
use crate::domain::validation::TodoInput;

/// Every match, unpaginated. Fine for personal lists; large accounts would need paging.
#[derive(Debug, Clone, Serialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
    pub total: usize,
}

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self, owner: &OwnerId, params: &ListParams) -> Result<TodoList, TodoError>;
    async fn get(&self, owner: &OwnerId, id: TodoId) -> Result<Todo, TodoError>;
    async fn create(&self, owner: &OwnerId, input: TodoInput) -> Result<Todo, TodoError>;
    async fn update(&self, owner: &OwnerId, id: TodoId, input: TodoInput) -> Result<Todo, TodoError>;
    async fn delete(&self, owner: &OwnerId, id: TodoId) -> Result<(), TodoError>;
    async fn summary(&self, owner: &OwnerId) -> Result<StatusSummary, TodoError>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }

    pub fn repository(&self) -> &R { &self.repo }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list(&self, owner: &OwnerId, params: &ListParams) -> Result<TodoList, TodoError> {
        let query = TodoQuery::compile(params)?;
        let todos = self.repo.query(owner, &query).await?;
        Ok(TodoList { total: todos.len(), todos })
    }

    async fn get(&self, owner: &OwnerId, id: TodoId) -> Result<Todo, TodoError> {
        self.repo.get(id, owner).await?.ok_or(TodoError::NotFound)
    }

    async fn create(&self, owner: &OwnerId, input: TodoInput) -> Result<Todo, TodoError> {
        let new = input.into_new_todo()?;
        let todo = self.repo.insert(owner, new).await?;
        tracing::info!(todo_id = %todo.id, owner = %owner, "todo created");
        Ok(todo)
    }

    async fn update(&self, owner: &OwnerId, id: TodoId, input: TodoInput) -> Result<Todo, TodoError> {
        let patch = input.into_patch()?;
        let todo = self.repo.update(id, owner, patch).await?.ok_or(TodoError::NotFound)?;
        tracing::debug!(todo_id = %id, owner = %owner, "todo updated");
        Ok(todo)
    }

    async fn delete(&self, owner: &OwnerId, id: TodoId) -> Result<(), TodoError> {
        if !self.repo.delete(id, owner).await? {
            return Err(TodoError::NotFound);
        }
        tracing::info!(todo_id = %id, owner = %owner, "todo deleted");
        Ok(())
    }

    async fn summary(&self, owner: &OwnerId) -> Result<StatusSummary, TodoError> {
        let counts = self.repo.count_by_status(owner).await?;
        Ok(StatusSummary::from_counts(counts))
    }
}
