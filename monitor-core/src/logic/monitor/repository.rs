//! Subscription Repository
//!
//! Capability set the monitor needs from storage. Callers inject an
//! implementation; nothing in this crate holds subscriptions globally.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::error::RepositoryError;
use super::types::SubscriptionRecord;

// ============================================================================
// REPOSITORY TRAIT
// ============================================================================

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Current subscription batch
    async fn list(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError>;

    async fn find(&self, id: &str) -> Result<Option<SubscriptionRecord>, RepositoryError>;

    /// Store a new record. An empty `id` asks the repository to assign one.
    async fn create(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepositoryError>;

    /// Replace the record with the same id
    async fn update(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

// ============================================================================
// IN-MEMORY REPOSITORY
// ============================================================================

/// Instance-owned store for tests and local runs
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepository {
    records: RwLock<Vec<SubscriptionRecord>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SubscriptionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn list(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError> {
        Ok(self.records.read().clone())
    }

    async fn find(&self, id: &str) -> Result<Option<SubscriptionRecord>, RepositoryError> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, mut record: SubscriptionRecord) -> Result<SubscriptionRecord, RepositoryError> {
        let mut records = self.records.write();

        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        } else if records.iter().any(|r| r.id == record.id) {
            return Err(RepositoryError::Conflict(record.id));
        }

        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepositoryError> {
        let mut records = self.records.write();
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| RepositoryError::NotFound(record.id.clone()))?;

        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
