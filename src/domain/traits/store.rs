use async_trait::async_trait;

use crate::application::errors::StorageError;

/// Store trait - abstraction for document persistence
#[async_trait]
pub trait Store: Send + Sync {
    /// Raw document stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Like `get`, but bypasses any cached copy
    async fn reload(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.get(key).await
    }
}
