//! Schema and audit operations of the in-memory backend

use uuid::Uuid;

use crate::error::BackendError;
use crate::model::audit::AuditEvent;
use crate::model::schema::SchemaData;

use super::store::InMemoryBackend;

impl InMemoryBackend {
    pub(super) fn load_schema_impl(&self) -> Result<SchemaData, BackendError> {
        let data = self.dataset()?;
        Ok(data.schema.data.clone())
    }

    pub(super) fn start_schema_update_impl(
        &self,
        schema_timestamp: u64,
    ) -> Result<String, BackendError> {
        let mut data = self.dataset()?;
        if data.schema.lock_token.is_some() {
            return Err(BackendError::SchemaLocked);
        }
        if data.schema.data.timestamp != schema_timestamp {
            return Err(BackendError::SchemaOutOfDate {
                expected: data.schema.data.timestamp,
                actual: schema_timestamp,
            });
        }
        let token = Uuid::new_v4().to_string();
        data.schema.lock_token = Some(token.clone());
        Ok(token)
    }

    pub(super) fn finish_schema_update_impl(
        &self,
        lock_token: &str,
    ) -> Result<u64, BackendError> {
        let mut data = self.dataset()?;
        if data.schema.lock_token.as_deref() != Some(lock_token) {
            return Err(BackendError::SchemaLocked);
        }
        data.schema.lock_token = None;
        let timestamp = data.next_timestamp();
        data.schema.data.timestamp = timestamp;
        Ok(timestamp)
    }

    pub(super) fn write_audit_event_impl(&self, event: AuditEvent) -> Result<(), BackendError> {
        let mut data = self.dataset()?;
        data.audit_log.push(event);
        Ok(())
    }

    /// Test/diagnostic view of the audit log
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.dataset().map(|data| data.audit_log.clone()).unwrap_or_default()
    }
}
