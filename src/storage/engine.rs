use crate::core::{EntityInstance, EntityKind, Fields, StoreResult, value};
use async_trait::async_trait;

/// Document store trait - one key space per entity kind.
///
/// Implemented by [`MemoryStore`](super::MemoryStore) for local and test use and
/// by [`HttpStore`](super::HttpStore) for a hosted database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a kind, ordered by the kind's display field.
    async fn list_all(&self, kind: EntityKind) -> StoreResult<Vec<EntityInstance>>;

    /// Stores a new document and returns its freshly assigned id.
    async fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<String>;

    /// Replaces the fields of an existing document.
    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<()>;

    /// Removes a document.
    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<()>;
}

/// Stable sort by the kind's order field; documents without it go last.
pub fn sort_for_listing(kind: EntityKind, instances: &mut [EntityInstance]) {
    let field = kind.order_field();
    instances.sort_by(|a, b| value::compare(a.get(field), b.get(field)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(id: &str, fields: serde_json::Value) -> EntityInstance {
        EntityInstance::new(id, fields.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_sort_orders_by_display_field_and_keeps_ties() {
        let mut rows = vec![
            instance("1", json!({"projectTitle": "Well"})),
            instance("2", json!({"balance": 3})),
            instance("3", json!({"projectTitle": "Bridge"})),
            instance("4", json!({"projectTitle": "Well"})),
        ];
        sort_for_listing(EntityKind::Projects, &mut rows);

        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "4", "2"]);
    }
}
