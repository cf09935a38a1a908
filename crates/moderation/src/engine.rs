//! The generic moderation controller.
//!
//! One `Moderator<K>` instance owns the in-memory list for one record
//! collection. Only the engine mutates the list; the rendering boundary
//! reads snapshots and drains notifications. Mutations are gated through
//! the authorization gate, serialized per record by a single-flight guard,
//! and echoed into the list only after the store confirms the write.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clubdesk_auth::{authorize_target, SessionHandle};
use clubdesk_core::{DomainError, DomainResult, Notification, RecordId};
use clubdesk_infra::{DocumentStore, SortDirection};

use crate::filter::{apply_filter_sort, FilterSortSpec};
use crate::kind::RecordKind;

/// Proof that the boundary ran its confirmation dialog.
///
/// The engine is confirmation-agnostic: it neither asks nor re-asks, it just
/// refuses to delete without this token.
#[derive(Debug, Copy, Clone)]
pub struct Confirmed;

/// Outcome of a successful `remove`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The removed record's detail view was open and has been closed.
    pub closed_detail: bool,
}

struct EngineState<R> {
    records: Vec<R>,
    loading: bool,
    open_detail: Option<RecordId>,
}

impl<R> Default for EngineState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            loading: false,
            open_detail: None,
        }
    }
}

/// Generic record-list controller for one kind.
pub struct Moderator<K: RecordKind> {
    store: Arc<dyn DocumentStore>,
    session: SessionHandle,
    state: Mutex<EngineState<K::Record>>,
    in_flight: Mutex<HashSet<RecordId>>,
    notices: Mutex<Vec<Notification>>,
}

impl<K: RecordKind> Moderator<K> {
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionHandle) -> Self {
        Self {
            store,
            session,
            state: Mutex::new(EngineState::default()),
            in_flight: Mutex::new(HashSet::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    // Guards are never held across an await.
    fn state(&self) -> MutexGuard<'_, EngineState<K::Record>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<RecordId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the in-memory list in stored order.
    pub fn records(&self) -> Vec<K::Record> {
        self.state().records.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Currently open detail view, if any.
    pub fn detail(&self) -> Option<RecordId> {
        self.state().open_detail
    }

    pub fn open_detail(&self, record_id: RecordId) -> DomainResult<()> {
        let mut state = self.state();
        if state.records.iter().any(|r| K::id(r) == record_id) {
            state.open_detail = Some(record_id);
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    pub fn close_detail(&self) {
        self.state().open_detail = None;
    }

    /// Drain pending notifications for the boundary to display.
    pub fn take_notifications(&self) -> Vec<Notification> {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *notices)
    }

    fn notify_error(&self, text: impl Into<String>) {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        notices.push(Notification::error(text));
    }

    /// Fetch every record of the kind, newest first.
    ///
    /// On failure the list ends up empty (never partially populated) and a
    /// notification is queued.
    pub async fn load_all(&self) {
        self.state().loading = true;

        let fetched = self
            .store
            .query(K::COLLECTION, "created_at", SortDirection::Descending)
            .await;
        let decoded: DomainResult<Vec<K::Record>> = match fetched {
            Ok(documents) => documents
                .into_iter()
                .map(|doc| {
                    serde_json::from_value(doc)
                        .map_err(|err| DomainError::store_failure(err.to_string()))
                })
                .collect(),
            Err(err) => Err(err.into()),
        };

        match decoded {
            Ok(records) => {
                let mut state = self.state();
                state.records = records;
                state.loading = false;
            }
            Err(err) => {
                tracing::warn!(collection = K::COLLECTION, error = %err, "load failed");
                self.notify_error(format!("Could not load {}.", K::COLLECTION));
                let mut state = self.state();
                state.records.clear();
                state.loading = false;
            }
        }
    }

    /// Transition one record through the kind's state machine.
    ///
    /// At most one mutation per record may be in flight; a second call on
    /// the same record is rejected with `Busy`, never queued. The in-memory
    /// echo is applied only after the store confirms the write.
    pub async fn transition(&self, record_id: RecordId, action: K::Action) -> DomainResult<()> {
        let session = self.session.snapshot();
        authorize_target(&session, K::MUTATE_CAPABILITY, record_id.into())?;

        let current = self
            .state()
            .records
            .iter()
            .find(|r| K::id(r) == record_id)
            .cloned()
            .ok_or(DomainError::NotFound)?;

        let (next, fields) = K::transition(&current, action).ok_or_else(|| {
            DomainError::invalid_transition(K::status_label(&current), format!("{action:?}"))
        })?;

        self.begin_mutation(record_id)?;
        let written = self
            .store
            .update(K::COLLECTION, &record_id.to_string(), fields)
            .await;
        self.end_mutation(record_id);

        match written {
            Ok(()) => {
                tracing::debug!(
                    collection = K::COLLECTION,
                    record = %record_id,
                    action = ?action,
                    "transition persisted"
                );
                let mut state = self.state();
                if let Some(slot) = state.records.iter_mut().find(|r| K::id(r) == record_id) {
                    *slot = next;
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    collection = K::COLLECTION,
                    record = %record_id,
                    error = %err,
                    "transition write failed"
                );
                self.notify_error("Could not save the change.");
                Err(err.into())
            }
        }
    }

    /// Hard-delete one record.
    ///
    /// Requires the boundary's confirmation token and the kind's delete
    /// capability. Closes the detail view if it was open on this record.
    pub async fn remove(
        &self,
        record_id: RecordId,
        _confirmed: Confirmed,
    ) -> DomainResult<RemoveOutcome> {
        let session = self.session.snapshot();
        authorize_target(&session, K::DELETE_CAPABILITY, record_id.into())?;

        if !self.state().records.iter().any(|r| K::id(r) == record_id) {
            return Err(DomainError::NotFound);
        }

        self.begin_mutation(record_id)?;
        let deleted = self.store.delete(K::COLLECTION, &record_id.to_string()).await;
        self.end_mutation(record_id);

        match deleted {
            Ok(()) => {
                let mut state = self.state();
                state.records.retain(|r| K::id(r) != record_id);
                let closed_detail = state.open_detail == Some(record_id);
                if closed_detail {
                    state.open_detail = None;
                }
                tracing::debug!(collection = K::COLLECTION, record = %record_id, "record removed");
                Ok(RemoveOutcome { closed_detail })
            }
            Err(err) => {
                tracing::warn!(
                    collection = K::COLLECTION,
                    record = %record_id,
                    error = %err,
                    "delete failed"
                );
                self.notify_error("Could not delete the record.");
                Err(err.into())
            }
        }
    }

    /// Project the in-memory list through `spec`. Pure; stored order is
    /// untouched.
    pub fn apply_filter_sort(&self, spec: &FilterSortSpec) -> Vec<K::Record> {
        apply_filter_sort::<K>(&self.state().records, spec)
    }

    fn begin_mutation(&self, record_id: RecordId) -> DomainResult<()> {
        if self.in_flight().insert(record_id) {
            Ok(())
        } else {
            Err(DomainError::Busy)
        }
    }

    fn end_mutation(&self, record_id: RecordId) {
        self.in_flight().remove(&record_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{
        ApplicationAction, Applications, MessageAction, Messages, UserAction, UserRoles,
    };
    use crate::record::{
        ApplicationRecord, ApplicationStatus, MessageRecord, MessageStatus, UserRecord,
    };

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{Map, Value as JsonValue};
    use tokio::sync::Semaphore;

    use clubdesk_auth::{Identity, Role, Session};
    use clubdesk_core::{NotificationKind, UserId};
    use clubdesk_infra::{InMemoryDocumentStore, StoreError};

    fn admin_handle() -> SessionHandle {
        let handle = SessionHandle::new();
        handle.replace(Session::signed_in(
            Identity::new(UserId::new(), "chair@club.example"),
            Role::Admin,
        ));
        handle
    }

    fn message(minute: i64) -> MessageRecord {
        MessageRecord {
            id: RecordId::new(),
            name: "Meera Nair".to_string(),
            email: "meera@x.com".to_string(),
            subject: "Pool hours".to_string(),
            body: "Are the lanes open on Sundays?".to_string(),
            status: MessageStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    fn application() -> ApplicationRecord {
        ApplicationRecord {
            id: RecordId::new(),
            name: "Raj Patel".to_string(),
            email: "raj@x.com".to_string(),
            occupation: "Architect".to_string(),
            motivation: "Weekend tennis".to_string(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn user(role: Role) -> UserRecord {
        UserRecord {
            id: UserId::new(),
            email: "ana@x.com".to_string(),
            display_name: "Ana Souza".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    async fn seed<K: RecordKind>(store: &InMemoryDocumentStore, record: &K::Record) {
        store
            .set(
                K::COLLECTION,
                &K::id(record).to_string(),
                serde_json::to_value(record).unwrap(),
            )
            .await
            .unwrap();
    }

    async fn loaded_moderator<K: RecordKind>(
        store: Arc<InMemoryDocumentStore>,
        session: SessionHandle,
    ) -> Moderator<K> {
        let moderator = Moderator::<K>::new(store, session);
        moderator.load_all().await;
        moderator
    }

    #[tokio::test]
    async fn load_all_orders_newest_first() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let older = message(0);
        let newer = message(5);
        seed::<Messages>(&store, &older).await;
        seed::<Messages>(&store, &newer).await;

        let moderator = loaded_moderator::<Messages>(store, admin_handle()).await;
        let records = moderator.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, newer.id);
        assert!(!moderator.is_loading());
    }

    #[tokio::test]
    async fn load_failure_leaves_list_empty_and_notifies() {
        let store = Arc::new(InMemoryDocumentStore::new());
        seed::<Messages>(&store, &message(0)).await;

        let moderator = Moderator::<Messages>::new(store.clone(), admin_handle());
        store.fail_next_operation();
        moderator.load_all().await;

        assert!(moderator.records().is_empty());
        assert!(!moderator.is_loading());
        let notices = moderator.take_notifications();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NotificationKind::Error);
        assert!(moderator.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn mark_read_persists_then_echoes() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let record = message(0);
        seed::<Messages>(&store, &record).await;

        let moderator = loaded_moderator::<Messages>(store.clone(), admin_handle()).await;
        moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap();

        // Store and in-memory list agree without a re-fetch.
        let doc = store
            .get("messages", &record.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], "read");
        assert_eq!(moderator.records()[0].status, MessageStatus::Read);

        // The edge is gone now.
        let err = moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn transition_requires_a_ready_admin_session() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let record = message(0);
        seed::<Messages>(&store, &record).await;

        let handle = SessionHandle::new();
        handle.replace(Session::signed_in(
            Identity::new(UserId::new(), "m@club.example"),
            Role::Member,
        ));
        let moderator = loaded_moderator::<Messages>(store.clone(), handle.clone()).await;

        let err = moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        // An unready session is denied even if its role field says admin.
        let mut unready = Session::signed_in(
            Identity::new(UserId::new(), "chair@club.example"),
            Role::Admin,
        );
        unready.ready = false;
        handle.replace(unready);
        let err = moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        // Nothing was persisted along the way.
        let doc = store
            .get("messages", &record.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], "pending");
    }

    #[tokio::test]
    async fn decided_applications_reject_both_actions() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let record = application();
        seed::<Applications>(&store, &record).await;

        let moderator = loaded_moderator::<Applications>(store, admin_handle()).await;
        moderator
            .transition(record.id, ApplicationAction::Approve)
            .await
            .unwrap();

        for action in [ApplicationAction::Approve, ApplicationAction::Reject] {
            let err = moderator.transition(record.id, action).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition { .. }));
        }
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let moderator = loaded_moderator::<Messages>(store, admin_handle()).await;

        let err = moderator
            .transition(RecordId::new(), MessageAction::MarkRead)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[tokio::test]
    async fn write_failure_leaves_the_list_untouched() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let record = message(0);
        seed::<Messages>(&store, &record).await;

        let moderator = loaded_moderator::<Messages>(store.clone(), admin_handle()).await;
        store.fail_next_operation();
        let err = moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::StoreFailure(_)));

        // No optimistic update before the write confirms.
        assert_eq!(moderator.records()[0].status, MessageStatus::Pending);
        assert_eq!(moderator.take_notifications().len(), 1);

        // The guard was released; a retry succeeds.
        moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap();
        assert_eq!(moderator.records()[0].status, MessageStatus::Read);
    }

    #[tokio::test]
    async fn role_change_moves_between_any_two_roles() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let record = user(Role::Member);
        seed::<UserRoles>(&store, &record).await;

        let moderator = loaded_moderator::<UserRoles>(store.clone(), admin_handle()).await;
        moderator
            .transition(record.id.into(), UserAction::SetRole(Role::Admin))
            .await
            .unwrap();

        assert_eq!(moderator.records()[0].role, Role::Admin);
        let doc = store
            .get("users", &record.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["role"], "admin");
    }

    #[tokio::test]
    async fn admin_cannot_mutate_or_delete_themself() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let handle = admin_handle();
        let own_id = handle.snapshot().user_id().unwrap();

        let own_record = UserRecord {
            id: own_id,
            email: "chair@club.example".to_string(),
            display_name: "Chair".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        seed::<UserRoles>(&store, &own_record).await;

        let moderator = loaded_moderator::<UserRoles>(store.clone(), handle).await;

        let err = moderator
            .transition(own_id.into(), UserAction::SetRole(Role::User))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        let err = moderator.remove(own_id.into(), Confirmed).await.unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);

        // Untouched in store and in memory.
        let doc = store
            .get("users", &own_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["role"], "admin");
        assert_eq!(moderator.records().len(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_and_closes_open_detail() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let record = message(0);
        seed::<Messages>(&store, &record).await;

        let moderator = loaded_moderator::<Messages>(store.clone(), admin_handle()).await;
        moderator.open_detail(record.id).unwrap();

        let outcome = moderator.remove(record.id, Confirmed).await.unwrap();
        assert!(outcome.closed_detail);
        assert!(moderator.detail().is_none());
        assert!(moderator.records().is_empty());
        assert!(store
            .get("messages", &record.id.to_string())
            .await
            .unwrap()
            .is_none());

        let err = moderator.remove(record.id, Confirmed).await.unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[tokio::test]
    async fn filter_sort_projects_without_reordering_storage() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let first = message(1);
        let second = message(0);
        seed::<Messages>(&store, &first).await;
        seed::<Messages>(&store, &second).await;

        let moderator = loaded_moderator::<Messages>(store, admin_handle()).await;
        let before = moderator.records();

        let spec = FilterSortSpec {
            direction: SortDirection::Ascending,
            ..FilterSortSpec::default()
        };
        let projected = moderator.apply_filter_sort(&spec);
        assert_eq!(projected[0].id, second.id);

        // Stored order unchanged.
        assert_eq!(moderator.records(), before);
    }

    // A store whose updates block until released, for exercising the
    // single-flight guard with a genuinely in-flight write.
    struct GatedStore {
        inner: InMemoryDocumentStore,
        gate: Semaphore,
    }

    impl GatedStore {
        fn new(inner: InMemoryDocumentStore) -> Self {
            Self {
                inner,
                gate: Semaphore::new(0),
            }
        }

        fn release_one(&self) {
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn set(
            &self,
            collection: &str,
            id: &str,
            document: JsonValue,
        ) -> Result<(), StoreError> {
            self.inner.set(collection, id, document).await
        }

        async fn update(
            &self,
            collection: &str,
            id: &str,
            fields: Map<String, JsonValue>,
        ) -> Result<(), StoreError> {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| StoreError::backend("gate closed"))?;
            self.inner.update(collection, id, fields).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
            self.inner.delete(collection, id).await
        }

        async fn query(
            &self,
            collection: &str,
            order_by: &str,
            direction: SortDirection,
        ) -> Result<Vec<JsonValue>, StoreError> {
            self.inner.query(collection, order_by, direction).await
        }
    }

    #[tokio::test]
    async fn concurrent_transition_on_same_record_is_busy() {
        let inner = InMemoryDocumentStore::new();
        let record = message(0);
        inner
            .set(
                "messages",
                &record.id.to_string(),
                serde_json::to_value(&record).unwrap(),
            )
            .await
            .unwrap();
        let store = Arc::new(GatedStore::new(inner));

        let moderator = Arc::new(Moderator::<Messages>::new(store.clone(), admin_handle()));
        moderator.load_all().await;

        let first = {
            let moderator = moderator.clone();
            let id = record.id;
            tokio::spawn(async move { moderator.transition(id, MessageAction::MarkRead).await })
        };
        // Let the first call reach its (gated) store write.
        tokio::task::yield_now().await;

        let err = moderator
            .transition(record.id, MessageAction::MarkRead)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Busy);

        store.release_one();
        first.await.unwrap().unwrap();

        // Exactly one status change was persisted.
        let doc = store
            .get("messages", &record.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], "read");
        assert_eq!(moderator.records()[0].status, MessageStatus::Read);
    }
}
