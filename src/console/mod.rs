//! Schema-driven entity console.
//!
//! Holds the active entity kind, the snapshot of its instances and the
//! create/edit form, and mediates every mutation against a
//! [`DocumentStore`]. Every successful mutation is followed by a full
//! re-fetch of the active kind.

pub mod form;
pub mod listing;

pub use form::{FormField, FormValues};
pub use listing::{Column, ColumnSource, Listing, ListingRow};

use crate::core::{
    ConsoleError, EntityInstance, EntityKind, Fields, Result, StoreError, StoreResult,
};
use crate::schema::{self, EntityKindSchema};
use crate::storage::DocumentStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Blocking message for the operator, shown until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(context: &str, err: &StoreError) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: format!("{}: {}", context, err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Inserted(String),
    Updated(String),
}

pub struct Console {
    store: Arc<dyn DocumentStore>,
    active_kind: EntityKind,
    instances: Vec<EntityInstance>,
    form: FormValues,
    edit_target: Option<String>,
    pending_delete: Option<String>,
    notice: Option<Notice>,
    column_source: ColumnSource,
    password_cost: u32,
}

impl Console {
    /// Creates an idle console on the first tab. Nothing is fetched until
    /// [`select_kind`](Self::select_kind) or [`refresh`](Self::refresh).
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let kind = EntityKind::ALL[0];
        Self {
            store,
            active_kind: kind,
            instances: Vec::new(),
            form: FormValues::defaults(kind),
            edit_target: None,
            pending_delete: None,
            notice: None,
            column_source: ColumnSource::default(),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_column_source(mut self, source: ColumnSource) -> Self {
        self.column_source = source;
        self
    }

    /// bcrypt cost used for password fields on submit.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn active_kind(&self) -> EntityKind {
        self.active_kind
    }

    pub fn schema(&self) -> &'static EntityKindSchema {
        schema::schema(self.active_kind)
    }

    pub fn instances(&self) -> &[EntityInstance] {
        &self.instances
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn edit_target(&self) -> Option<&str> {
        self.edit_target.as_deref()
    }

    pub fn edit_state(&self) -> EditState {
        match &self.edit_target {
            Some(id) => EditState::Editing(id.clone()),
            None => EditState::Idle,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    pub fn column_source(&self) -> ColumnSource {
        self.column_source
    }

    pub fn listing(&self) -> Listing {
        Listing::build(&self.instances, self.schema(), self.column_source)
    }

    /// "Add New Project" / "Edit Project".
    pub fn heading(&self) -> String {
        let verb = if self.is_editing() { "Edit" } else { "Add New" };
        format!("{} {}", verb, self.active_kind.singular_title())
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Switches tabs: defaults restored, edit target cleared, listing re-fetched.
    pub async fn select_kind(&mut self, kind: EntityKind) -> Result<()> {
        if kind != self.active_kind {
            self.instances.clear();
        }
        self.active_kind = kind;
        self.form = FormValues::defaults(kind);
        self.edit_target = None;
        self.pending_delete = None;
        info!(%kind, "entity kind selected");

        self.refresh().await
    }

    /// Re-fetches the snapshot. On failure the previous snapshot stays.
    pub async fn refresh(&mut self) -> Result<()> {
        let kind = self.active_kind;
        match self.store.list_all(kind).await {
            Ok(instances) => {
                debug!(%kind, count = instances.len(), "snapshot refreshed");
                self.instances = instances;
                Ok(())
            }
            Err(err) => {
                warn!(%kind, error = %err, "fetch failed, keeping previous snapshot");
                self.notice = Some(Notice::error("Error fetching data", &err));
                Err(err.into())
            }
        }
    }

    /// Loads an instance into the form. Fields beyond the schema are kept.
    pub fn edit(&mut self, instance: &EntityInstance) {
        debug!(kind = %self.active_kind, id = %instance.id, "editing instance");
        self.edit_target = Some(instance.id.clone());
        self.form = FormValues::from_instance(self.active_kind, instance);
    }

    pub fn edit_by_id(&mut self, id: &str) -> Result<()> {
        let instance = self
            .instances
            .iter()
            .find(|instance| instance.id == id)
            .cloned()
            .ok_or_else(|| ConsoleError::NotInListing(id.to_string()))?;
        self.edit(&instance);
        Ok(())
    }

    /// Drops in-progress edits without touching the store.
    pub fn cancel(&mut self) {
        self.edit_target = None;
        self.form = FormValues::defaults(self.active_kind);
    }

    pub fn on_field_change(&mut self, field: &str, raw: &str) -> Result<()> {
        self.form.set_raw(field, raw)
    }

    /// Inserts the form, or updates the edit target with it. New password
    /// values are stored as bcrypt hashes.
    ///
    /// On failure the form and edit target are left as they were so the
    /// operator can retry.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let kind = self.active_kind;
        let result = match self.form.sealed_payload(self.password_cost) {
            Ok(payload) => self.save(kind, payload).await,
            Err(err) => Err(err),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%kind, error = %err, "save failed");
                self.notice = Some(Notice::error("Error saving data", &err));
                return Err(err.into());
            }
        };
        info!(%kind, ?outcome, "form saved");

        self.edit_target = None;
        self.form = FormValues::defaults(kind);

        let message = match outcome {
            SubmitOutcome::Inserted(_) => "Added successfully!",
            SubmitOutcome::Updated(_) => "Updated successfully!",
        };
        if self.refresh().await.is_ok() {
            self.notice = Some(Notice::success(message));
        }
        Ok(outcome)
    }

    async fn save(&self, kind: EntityKind, payload: Fields) -> StoreResult<SubmitOutcome> {
        match self.edit_target.clone() {
            Some(id) => self
                .store
                .update(kind, &id, payload)
                .await
                .map(|()| SubmitOutcome::Updated(id)),
            None => self
                .store
                .insert(kind, payload)
                .await
                .map(SubmitOutcome::Inserted),
        }
    }

    /// First step of a delete: nothing reaches the store until
    /// [`confirm_delete`](Self::confirm_delete).
    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.pending_delete = Some(id.into());
    }

    pub fn dismiss_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> Result<()> {
        let id = self
            .pending_delete
            .take()
            .ok_or(ConsoleError::NothingToConfirm)?;
        let kind = self.active_kind;

        if let Err(err) = self.store.delete(kind, &id).await {
            warn!(%kind, %id, error = %err, "delete failed");
            self.notice = Some(Notice::error("Error deleting data", &err));
            return Err(err.into());
        }
        info!(%kind, %id, "instance deleted");

        if self.edit_target.as_deref() == Some(id.as_str()) {
            self.cancel();
        }
        if self.refresh().await.is_ok() {
            self.notice = Some(Notice::success("Deleted successfully!"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    async fn console_with_projects() -> (Arc<MemoryStore>, Console) {
        let store = Arc::new(MemoryStore::new());
        for title in ["Well", "Bridge"] {
            store
                .insert(
                    EntityKind::Projects,
                    json!({"projectTitle": title, "fundGoal": 100})
                        .as_object()
                        .unwrap()
                        .clone(),
                )
                .await
                .unwrap();
        }
        let mut console = Console::new(store.clone());
        console.select_kind(EntityKind::Projects).await.unwrap();
        (store, console)
    }

    #[tokio::test]
    async fn test_select_kind_loads_sorted_snapshot() {
        let (_, console) = console_with_projects().await;
        let titles: Vec<&str> = console
            .instances()
            .iter()
            .map(|p| p.fields["projectTitle"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Bridge", "Well"]);
        assert_eq!(console.heading(), "Add New Project");
    }

    #[tokio::test]
    async fn test_edit_then_submit_updates_in_place() {
        let (store, mut console) = console_with_projects().await;
        let id = console.instances()[0].id.clone();

        console.edit_by_id(&id).unwrap();
        assert_eq!(console.heading(), "Edit Project");
        console.on_field_change("fundGoal", "750").unwrap();

        let outcome = console.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Updated(id.clone()));
        assert_eq!(console.edit_state(), EditState::Idle);
        assert_eq!(store.len(EntityKind::Projects).await, 2);

        let updated = console.instances().iter().find(|p| p.id == id).unwrap();
        assert_eq!(updated.fields["fundGoal"], json!(750));
        assert!(updated.fields.get("id").is_none());
        assert_eq!(console.notice(), Some(&Notice::success("Updated successfully!")));
    }

    #[tokio::test]
    async fn test_deleting_the_edit_target_resets_to_idle() {
        let (_, mut console) = console_with_projects().await;
        let id = console.instances()[1].id.clone();

        console.edit_by_id(&id).unwrap();
        console.request_delete(id.clone());
        console.confirm_delete().await.unwrap();

        assert_eq!(console.edit_state(), EditState::Idle);
        assert_eq!(console.form(), &FormValues::defaults(EntityKind::Projects));
        assert_eq!(console.instances().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_without_request_is_an_error() {
        let (_, mut console) = console_with_projects().await;
        assert_eq!(
            console.confirm_delete().await.unwrap_err(),
            ConsoleError::NothingToConfirm
        );
    }

    #[tokio::test]
    async fn test_edit_by_unknown_id() {
        let (_, mut console) = console_with_projects().await;
        assert!(matches!(
            console.edit_by_id("missing"),
            Err(ConsoleError::NotInListing(_))
        ));
        assert!(!console.is_editing());
    }
}
