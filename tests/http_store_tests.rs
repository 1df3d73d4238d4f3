use async_trait::async_trait;
use crowdconsole::core::StoreResult;
use crowdconsole::{
    Console, ConsoleError, DocumentStore, EntityInstance, EntityKind, Fields, HttpStore,
    MemoryStore, NoticeLevel, StoreError, server,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serves reads from memory and refuses every write.
#[derive(Default)]
struct ReadOnlyStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn list_all(&self, kind: EntityKind) -> StoreResult<Vec<EntityInstance>> {
        self.inner.list_all(kind).await
    }

    async fn insert(&self, _kind: EntityKind, _fields: Fields) -> StoreResult<String> {
        Err(StoreError::rejected("quota exceeded"))
    }

    async fn update(&self, _kind: EntityKind, _id: &str, _fields: Fields) -> StoreResult<()> {
        Err(StoreError::rejected("quota exceeded"))
    }

    async fn delete(&self, _kind: EntityKind, _id: &str) -> StoreResult<()> {
        Err(StoreError::rejected("quota exceeded"))
    }
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

/// Serves `backend` on an ephemeral port and returns a client for it.
async fn spawn_server(backend: Arc<dyn DocumentStore>) -> HttpStore {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(backend)).await.unwrap();
    });

    HttpStore::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_http_store_round_trip() {
    let backend = Arc::new(MemoryStore::new());
    let store = spawn_server(backend.clone()).await;

    let id = store
        .insert(EntityKind::Projects, fields(json!({"projectTitle": "Well", "fundGoal": 10})))
        .await
        .unwrap();
    assert_eq!(backend.len(EntityKind::Projects).await, 1);

    store
        .update(EntityKind::Projects, &id, fields(json!({"projectTitle": "Well", "fundGoal": 20})))
        .await
        .unwrap();

    let listed = store.list_all(EntityKind::Projects).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].fields["fundGoal"], json!(20));

    store.delete(EntityKind::Projects, &id).await.unwrap();
    assert!(store.list_all(EntityKind::Projects).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_store_maps_statuses() {
    let backend = Arc::new(MemoryStore::new());
    let store = spawn_server(backend.clone()).await;

    let err = store
        .update(EntityKind::Users, "missing", fields(json!({"name": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    backend.set_available(false);
    let err = store.list_all(EntityKind::Users).await.unwrap_err();
    assert!(matches!(err, StoreError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_console_over_http() {
    let backend = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = Arc::new(spawn_server(backend.clone()).await);

    let mut console = Console::new(store);
    console.select_kind(EntityKind::Users).await.unwrap();
    console.on_field_change("name", "Mia").unwrap();
    console.on_field_change("backedProjects", "p1, p2").unwrap();
    console.submit().await.unwrap();

    let stored = backend.list_all(EntityKind::Users).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].fields["backedProjects"], json!(["p1", "p2"]));
    assert_eq!(console.instances().len(), 1);
}

#[tokio::test]
async fn test_http_store_maps_conflict_to_write_rejected() {
    let store = spawn_server(Arc::new(ReadOnlyStore::default())).await;

    let err = store
        .insert(EntityKind::Creators, fields(json!({"name": "Ada"})))
        .await
        .unwrap_err();
    match err {
        StoreError::WriteRejected(message) => {
            assert!(message.starts_with("409"));
            assert!(message.contains("write_rejected"));
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("expected WriteRejected, got {other:?}"),
    }

    let err = store
        .update(EntityKind::Creators, "c1", fields(json!({"name": "Ada"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::WriteRejected(_)));

    let err = store.delete(EntityKind::Creators, "c1").await.unwrap_err();
    assert!(matches!(err, StoreError::WriteRejected(_)));

    assert!(store.list_all(EntityKind::Creators).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_console_reports_rejected_save_over_http() {
    let store: Arc<dyn DocumentStore> =
        Arc::new(spawn_server(Arc::new(ReadOnlyStore::default())).await);

    let mut console = Console::new(store);
    console.select_kind(EntityKind::Creators).await.unwrap();
    console.on_field_change("name", "Ada").unwrap();
    let form_before = console.form().clone();

    let err = console.submit().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Store(StoreError::WriteRejected(_))));
    assert_eq!(console.form(), &form_before);
    let notice = console.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Error saving data"));
}
