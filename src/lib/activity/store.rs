use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::types::{ActivityRecord, ActivityStore, OperationId, StoreError};
use crate::lib::accounts::types::UserId;

#[derive(Debug, Default)]
pub struct MemoryActivityStore {
    records: RwLock<HashMap<OperationId, ActivityRecord>>,
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn find(&self, id: OperationId) -> Result<Option<ActivityRecord>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn create(
        &self,
        causer_id: Option<UserId>,
        description: &str,
        properties: Map<String, Value>,
    ) -> Result<OperationId, StoreError> {
        let id = OperationId::new();
        let now = Utc::now();
        let record = ActivityRecord {
            id,
            causer_id,
            description: description.to_string(),
            properties,
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.insert(id, record);
        Ok(id)
    }

    async fn update_properties(
        &self,
        id: OperationId,
        properties: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.is_terminal() {
            return Err(StoreError::Sealed(id));
        }
        record.properties.extend(properties);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::lib::activity::types::{ActivityStatus, EXIT_CODE, STATUS};

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn created_record_has_no_exit_code() {
        let store = MemoryActivityStore::new();
        let id = store
            .create(Some(7), "docker ps", props(json!({ "status": "queued" })))
            .await
            .unwrap();

        let record = store.find(id).await.unwrap().unwrap();
        assert_eq!(record.causer_id, Some(7));
        assert_eq!(record.status(), Some(ActivityStatus::Queued));
        assert_eq!(record.exit_code(), None);
        assert!(!record.is_terminal());
    }

    #[tokio::test]
    async fn updates_merge_and_seal_on_exit_code() {
        let store = MemoryActivityStore::new();
        let id = store
            .create(None, "cleanup", props(json!({ "command": "prune" })))
            .await
            .unwrap();

        store
            .update_properties(id, props(json!({ STATUS: "finished", EXIT_CODE: 0 })))
            .await
            .unwrap();
        let record = store.find(id).await.unwrap().unwrap();
        assert_eq!(record.properties["command"], json!("prune"));
        assert_eq!(record.exit_code(), Some(0));

        let err = store
            .update_properties(id, props(json!({ EXIT_CODE: 1 })))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Sealed(id));
        assert_eq!(store.find(id).await.unwrap().unwrap().exit_code(), Some(0));
    }

    #[tokio::test]
    async fn unknown_activity() {
        let store = MemoryActivityStore::new();
        let id = OperationId::new();

        assert_eq!(store.find(id).await.unwrap(), None);
        assert_eq!(
            store.update_properties(id, Map::new()).await.unwrap_err(),
            StoreError::NotFound(id)
        );
    }

    #[test]
    fn non_integer_exit_code_is_not_terminal() {
        let now = Utc::now();
        let record = ActivityRecord {
            id: OperationId::new(),
            causer_id: None,
            description: String::new(),
            properties: props(json!({ EXIT_CODE: "0" })),
            created_at: now,
            updated_at: now,
        };
        assert!(!record.is_terminal());
    }
}
