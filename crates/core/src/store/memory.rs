//! In-memory template store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{StoreError, StoreResult, TemplateStore};
use crate::template::{NewTemplate, ServiceConfigTemplate, TemplateScope};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Default)]
struct Inner {
    next_id: DbId,
    /// Kept in insertion order.
    templates: Vec<ServiceConfigTemplate>,
    /// device id -> template id
    assignments: BTreeMap<String, DbId>,
}

impl Inner {
    fn position(&self, id: DbId) -> StoreResult<usize> {
        self.templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })
    }
}

/// Process-local [`TemplateStore`] with the same semantics as the database store.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    inner: Mutex<Inner>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Insert a template row verbatim, bypassing validation. For seeding fixtures.
    pub fn insert_raw(&self, template: ServiceConfigTemplate) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.next_id = inner.next_id.max(template.id);
        inner.templates.push(template);
        Ok(())
    }
}

/// Next `updated_at` value, strictly after the previous one.
fn advance(previous: Timestamp) -> Timestamp {
    Utc::now().max(previous + Duration::microseconds(1))
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn list_templates(
        &self,
        scope: Option<TemplateScope>,
    ) -> StoreResult<Vec<ServiceConfigTemplate>> {
        let inner = self.lock()?;
        Ok(inner
            .templates
            .iter()
            .filter(|t| scope.is_none_or(|s| t.scope == s))
            .cloned()
            .collect())
    }

    async fn get_template(&self, id: DbId) -> StoreResult<ServiceConfigTemplate> {
        let inner = self.lock()?;
        let pos = inner.position(id)?;
        Ok(inner.templates[pos].clone())
    }

    async fn insert_template(&self, template: &NewTemplate) -> StoreResult<ServiceConfigTemplate> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let now = Utc::now();
        let row = ServiceConfigTemplate {
            id: inner.next_id,
            name: template.name.clone(),
            description: template.description.clone(),
            scope: template.scope,
            device_type: template.device_type.clone(),
            config: template.config.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.templates.push(row.clone());
        Ok(row)
    }

    async fn save_template(
        &self,
        template: &ServiceConfigTemplate,
        expected_updated_at: Option<Timestamp>,
    ) -> StoreResult<ServiceConfigTemplate> {
        let mut inner = self.lock()?;
        let pos = inner.position(template.id)?;
        let existing = &mut inner.templates[pos];

        if expected_updated_at.is_some_and(|expected| expected != existing.updated_at) {
            return Err(StoreError::Stale { id: template.id });
        }

        // id, scope, device_type and created_at are owned by the store.
        existing.name = template.name.clone();
        existing.description = template.description.clone();
        existing.config = template.config.clone();
        existing.updated_at = advance(existing.updated_at);
        Ok(existing.clone())
    }

    async fn remove_template(&self, id: DbId) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let pos = inner.position(id)?;
        if inner.assignments.values().any(|tid| *tid == id) {
            return Err(StoreError::InUse { id });
        }
        inner.templates.remove(pos);
        Ok(())
    }

    async fn affected_devices(&self, template_id: DbId) -> StoreResult<BTreeSet<String>> {
        let inner = self.lock()?;
        Ok(inner
            .assignments
            .iter()
            .filter(|(_, tid)| **tid == template_id)
            .map(|(device, _)| device.clone())
            .collect())
    }

    async fn assign_device(&self, template_id: DbId, device_id: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.position(template_id)?;
        inner.assignments.insert(device_id.to_string(), template_id);
        Ok(())
    }

    async fn unassign_device(&self, template_id: DbId, device_id: &str) -> StoreResult<bool> {
        let mut inner = self.lock()?;
        match inner.assignments.get(device_id) {
            Some(tid) if *tid == template_id => {
                inner.assignments.remove(device_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn new_template(name: &str, scope: TemplateScope) -> NewTemplate {
        NewTemplate {
            name: name.to_string(),
            description: None,
            scope,
            device_type: None,
            config: json!({}),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryTemplateStore::new();
        let a = store.insert_template(&new_template("a", TemplateScope::Global)).await.unwrap();
        let b = store.insert_template(&new_template("b", TemplateScope::Group)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.created_at, a.updated_at);
    }

    #[tokio::test]
    async fn list_filters_by_scope_in_insertion_order() {
        let store = MemoryTemplateStore::new();
        for (name, scope) in [
            ("one", TemplateScope::Group),
            ("two", TemplateScope::Global),
            ("three", TemplateScope::Group),
        ] {
            store.insert_template(&new_template(name, scope)).await.unwrap();
        }

        let names = |v: Vec<ServiceConfigTemplate>| v.into_iter().map(|t| t.name).collect::<Vec<_>>();
        assert_eq!(names(store.list_templates(None).await.unwrap()), ["one", "two", "three"]);
        assert_eq!(
            names(store.list_templates(Some(TemplateScope::Group)).await.unwrap()),
            ["one", "three"]
        );
        assert!(store.list_templates(Some(TemplateScope::DeviceType)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_advances_updated_at_and_keeps_scope() {
        let store = MemoryTemplateStore::new();
        let created = store.insert_template(&new_template("a", TemplateScope::Global)).await.unwrap();

        let mut changed = created.clone();
        changed.name = "renamed".to_string();
        changed.scope = TemplateScope::Group;
        let saved = store.save_template(&changed, None).await.unwrap();

        assert_eq!(saved.name, "renamed");
        assert_eq!(saved.scope, TemplateScope::Global);
        assert!(saved.updated_at > created.updated_at);
        assert_eq!(saved.created_at, created.created_at);
    }

    #[tokio::test]
    async fn guarded_save_rejects_stale_timestamp() {
        let store = MemoryTemplateStore::new();
        let created = store.insert_template(&new_template("a", TemplateScope::Global)).await.unwrap();
        store.save_template(&created, None).await.unwrap();

        let result = store.save_template(&created, Some(created.updated_at)).await;
        assert_matches!(result, Err(StoreError::Stale { id: 1 }));
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let store = MemoryTemplateStore::new();
        assert_matches!(store.get_template(9).await, Err(StoreError::NotFound { id: 9 }));
        assert_matches!(store.remove_template(9).await, Err(StoreError::NotFound { id: 9 }));
        assert_matches!(store.assign_device(9, "dev-1").await, Err(StoreError::NotFound { id: 9 }));
    }

    #[tokio::test]
    async fn remove_refuses_assigned_template() {
        let store = MemoryTemplateStore::new();
        let a = store.insert_template(&new_template("a", TemplateScope::Global)).await.unwrap();
        store.assign_device(a.id, "dev-1").await.unwrap();

        assert_matches!(store.remove_template(a.id).await, Err(StoreError::InUse { id: 1 }));
        assert!(store.get_template(a.id).await.is_ok());

        store.unassign_device(a.id, "dev-1").await.unwrap();
        store.remove_template(a.id).await.unwrap();
    }

    #[tokio::test]
    async fn reassigning_a_device_moves_it() {
        let store = MemoryTemplateStore::new();
        let a = store.insert_template(&new_template("a", TemplateScope::Global)).await.unwrap();
        let b = store.insert_template(&new_template("b", TemplateScope::Global)).await.unwrap();

        store.assign_device(a.id, "dev-1").await.unwrap();
        store.assign_device(a.id, "dev-2").await.unwrap();
        store.assign_device(b.id, "dev-1").await.unwrap();

        assert_eq!(
            store.affected_devices(a.id).await.unwrap(),
            BTreeSet::from(["dev-2".to_string()])
        );
        assert_eq!(store.affected_devices(b.id).await.unwrap().len(), 1);
        assert!(!store.unassign_device(a.id, "dev-1").await.unwrap());
        assert!(store.unassign_device(b.id, "dev-1").await.unwrap());
    }
}
