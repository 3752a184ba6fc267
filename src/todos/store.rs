//! Data-store seam for the todo handlers.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use super::model::Todo;
use crate::jsonapi::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The id does not address a stored item. An expected outcome.
    #[error("no todo with id `{id}`")]
    NotFound { id: String },

    /// The backing store failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id } => {
                ApiError::NOT_FOUND.with_detail(format!("Todo `{id}` does not exist."))
            }
            StoreError::Unavailable(reason) => {
                error!(%reason, "todo store failed");
                ApiError::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Persistence operations the handlers need.
#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Todo, StoreError>;

    /// Stores `todo` under a fresh id and returns it as stored.
    async fn insert(&self, todo: Todo) -> Result<Todo, StoreError>;

    /// Replaces the item under `id`, keeping its id and creation time.
    async fn update_by_id(&self, id: &str, todo: Todo) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}

/// In-process store, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound { id: id.to_owned() }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Todo, StoreError> {
        self.items
            .read()
            .await
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn insert(&self, mut todo: Todo) -> Result<Todo, StoreError> {
        todo.id = Some(Uuid::new_v4().simple().to_string());
        todo.created_at = Some(OffsetDateTime::now_utc());
        self.items.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn update_by_id(&self, id: &str, mut todo: Todo) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(id))?;
        todo.id = slot.id.take();
        todo.created_at = slot.created_at;
        *slot = todo;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        let index = items
            .iter()
            .position(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(id))?;
        items.remove(index);
        Ok(())
    }
}
