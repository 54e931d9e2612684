//! # Resources
//!
//! A [`Resource`] is the single source of truth for one entity's collection
//! during a view's lifetime. It wraps a [`ResourceService`] and keeps:
//!
//! - `items`: the cached collection, in the order of the last fetch
//! - `loading`: true while at least one call is in flight
//! - `error`: the last failure, cleared when a new call starts
//! - `success`: set when the latest mutation succeeded
//!
//! Mutations fold their result into the cache instead of re-fetching.
//!
//! ## Races
//!
//! Calls are not queued. Two overlapping calls both apply their result and
//! whichever resolves last wins, regardless of issue order.
//!
//! ## Liveness
//!
//! A resource is bound to a [`ViewScope`]. Nothing is applied to the state
//! after the scope ends: calls made afterwards fail fast, and calls in flight
//! when it ends return [`DeskError::Cancelled`] with the state untouched.

use crate::error::{DeskError, RequestError, Result};
use crate::filter::{FilterCriteria, FilterSpec};
use crate::http::Transport;
use crate::model::{IdKey, Record, RecordId};
use crate::service::ResourceService;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

mod scope;

pub use scope::{Liveness, ViewScope};

/// What `create` appends to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Append the record the server returned; nothing if it returned none.
    #[default]
    ServerAuthoritative,
    /// Append the submitted payload, overlaid with whatever the server returned.
    OptimisticEcho,
}

/// What a failed fetch does to the collection already on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchFailurePolicy {
    #[default]
    PreserveLastGood,
    /// Legacy behavior: a failed fetch empties the collection.
    ClearOnFailure,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceOptions {
    pub id_key: IdKey,
    pub merge_strategy: MergeStrategy,
    pub fetch_failure: FetchFailurePolicy,
    /// How long `success` stays up after a mutation; `None` keeps it until the
    /// next mutation starts.
    pub success_ttl: Option<Duration>,
}

/// A point-in-time copy of a resource's state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSnapshot {
    pub items: Vec<Record>,
    pub loading: bool,
    pub error: Option<RequestError>,
    pub success: bool,
}

#[derive(Default)]
struct ResourceState {
    items: Vec<Record>,
    in_flight: usize,
    error: Option<RequestError>,
    succeeded_at: Option<Instant>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Fetch,
    Mutation,
}

pub struct Resource<T: Transport> {
    service: ResourceService<T>,
    options: ResourceOptions,
    state: Arc<RwLock<ResourceState>>,
    liveness: Liveness,
}

impl<T: Transport> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            options: self.options.clone(),
            state: Arc::clone(&self.state),
            liveness: self.liveness.clone(),
        }
    }
}

impl<T: Transport> Resource<T> {
    pub fn new(service: ResourceService<T>, options: ResourceOptions, scope: &ViewScope) -> Self {
        Self {
            service,
            options,
            state: Arc::new(RwLock::new(ResourceState::default())),
            liveness: scope.liveness(),
        }
    }

    pub fn options(&self) -> &ResourceOptions {
        &self.options
    }

    pub fn service(&self) -> &ResourceService<T> {
        &self.service
    }

    pub async fn snapshot(&self) -> ResourceSnapshot {
        let state = self.state.read().await;
        let success = state.succeeded_at.is_some_and(|at| {
            self.options
                .success_ttl
                .map_or(true, |ttl| at.elapsed() < ttl)
        });
        ResourceSnapshot {
            items: state.items.clone(),
            loading: state.in_flight > 0,
            error: state.error.clone(),
            success,
        }
    }

    pub async fn items(&self) -> Vec<Record> {
        self.state.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.in_flight > 0
    }

    pub async fn error(&self) -> Option<RequestError> {
        self.state.read().await.error.clone()
    }

    /// The cached collection passed through the filter engine.
    pub async fn filtered(&self, spec: &FilterSpec, criteria: &FilterCriteria) -> Result<Vec<Record>> {
        let compiled = spec.compile(criteria)?;
        let state = self.state.read().await;
        Ok(compiled.apply(&state.items))
    }

    /// Replaces the cache with the full list.
    pub async fn fetch_all(&self) -> Result<Vec<Record>> {
        self.begin(CallKind::Fetch).await?;
        let outcome = self.service.list().await;
        self.settle_fetch(outcome).await
    }

    /// Replaces the cache with the server-side filtered list.
    pub async fn fetch_filtered(&self, values: &[String]) -> Result<Vec<Record>> {
        if !self.service.supports_filtered() {
            return Err(DeskError::Unsupported(format!(
                "{} has no filtered list endpoint",
                self.service.endpoints().list
            )));
        }
        self.begin(CallKind::Fetch).await?;
        let outcome = self.service.list_filtered(values).await;
        self.settle_fetch(outcome).await
    }

    /// Returns the record appended to the cache, if any.
    pub async fn create(&self, payload: Record) -> Result<Option<Record>> {
        self.begin(CallKind::Mutation).await?;
        let outcome = self.service.create(&payload).await;
        let strategy = self.options.merge_strategy;
        let key = self.options.id_key.clone();

        self.settle(outcome, CallKind::Mutation, move |state, returned| {
            let appended = match strategy {
                MergeStrategy::ServerAuthoritative => returned,
                MergeStrategy::OptimisticEcho => Some(match returned {
                    Some(stored) => payload.merged(&stored, &key),
                    None => payload,
                }),
            };
            if let Some(record) = &appended {
                state.items.push(record.clone());
            }
            appended
        })
        .await
    }

    /// Returns the merged cache entry, or `None` when the id is not cached.
    pub async fn update(&self, id: &RecordId, payload: Record) -> Result<Option<Record>> {
        self.begin(CallKind::Mutation).await?;
        let outcome = self.service.update(id, &payload).await;
        let key = self.options.id_key.clone();

        self.settle(outcome, CallKind::Mutation, move |state, returned| {
            let patch = returned.unwrap_or(payload);
            let entry = state.items.iter_mut().find(|r| r.matches_id(&key, id))?;
            *entry = entry.merged(&patch, &key);
            Some(entry.clone())
        })
        .await
    }

    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        if !self.service.supports_delete() {
            return Err(DeskError::Unsupported(format!(
                "records of {} cannot be deleted",
                self.service.endpoints().list
            )));
        }
        self.begin(CallKind::Mutation).await?;
        let outcome = self.service.delete(id).await;
        let key = self.options.id_key.clone();

        self.settle(outcome, CallKind::Mutation, move |state, ()| {
            state.items.retain(|r| !r.matches_id(&key, id));
        })
        .await
    }

    /// Moves a board card: a single-field update.
    pub async fn move_to(&self, id: &RecordId, field: &str, column: &str) -> Result<Option<Record>> {
        let patch = Record::new().with(field, Value::String(column.to_string()));
        self.update(id, patch).await
    }

    async fn begin(&self, kind: CallKind) -> Result<()> {
        if !self.liveness.is_alive() {
            return Err(DeskError::Cancelled);
        }
        let mut state = self.state.write().await;
        state.in_flight += 1;
        state.error = None;
        if kind == CallKind::Mutation {
            state.succeeded_at = None;
        }
        Ok(())
    }

    async fn settle_fetch(&self, outcome: Result<Vec<Record>>) -> Result<Vec<Record>> {
        self.settle(outcome, CallKind::Fetch, |state, records: Vec<Record>| {
            state.items = records.clone();
            records
        })
        .await
    }

    async fn settle<V, O>(
        &self,
        outcome: Result<V>,
        kind: CallKind,
        apply: impl FnOnce(&mut ResourceState, V) -> O,
    ) -> Result<O> {
        let mut state = self.state.write().await;
        if !self.liveness.is_alive() {
            debug!(path = %self.service.endpoints().list, "view ended, dropping result");
            return Err(DeskError::Cancelled);
        }
        state.in_flight = state.in_flight.saturating_sub(1);

        match outcome {
            Ok(value) => {
                if kind == CallKind::Mutation {
                    state.succeeded_at = Some(Instant::now());
                }
                Ok(apply(&mut *state, value))
            }
            Err(err) => {
                warn!(path = %self.service.endpoints().list, error = %err, "resource call failed");
                state.error = Some(err.to_request_error());
                if kind == CallKind::Fetch
                    && self.options.fetch_failure == FetchFailurePolicy::ClearOnFailure
                {
                    state.items.clear();
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;
    use crate::http::memory::{InMemoryBackend, ResponseShape};
    use crate::http::HttpClient;
    use crate::session::Session;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn resource_for(
        backend: &InMemoryBackend,
        kind: EntityKind,
        options: ResourceOptions,
        scope: &ViewScope,
    ) -> Resource<InMemoryBackend> {
        let client = Arc::new(HttpClient::new(backend.clone(), Session::in_memory()));
        let service = ResourceService::new(client, kind.endpoints());
        Resource::new(service, options, scope)
    }

    fn people_options() -> ResourceOptions {
        ResourceOptions {
            id_key: EntityKind::People.id_key(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fetch_replaces_collection() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1", "name": "Ana"}))],
        );
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);

        let fetched = clients.fetch_all().await.unwrap();
        assert_eq!(fetched.len(), 1);

        let snapshot = clients.snapshot().await;
        assert_eq!(snapshot.items, vec![record(json!({"id": "1", "name": "Ana"}))]);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error, None);
        assert!(!snapshot.success);
    }

    #[tokio::test]
    async fn failed_fetch_preserves_by_default() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1"}))],
        );
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);
        clients.fetch_all().await.unwrap();

        backend.fail_next(503);
        assert!(clients.fetch_all().await.is_err());

        let snapshot = clients.snapshot().await;
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.error.unwrap().is_server_error);
    }

    #[tokio::test]
    async fn failed_fetch_clears_under_legacy_policy() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1"}))],
        );
        let scope = ViewScope::new();
        let options = ResourceOptions {
            fetch_failure: FetchFailurePolicy::ClearOnFailure,
            ..Default::default()
        };
        let clients = resource_for(&backend, EntityKind::Clients, options, &scope);
        clients.fetch_all().await.unwrap();

        backend.set_offline(true);
        let err = clients.fetch_all().await.unwrap_err();
        assert!(matches!(err, DeskError::Request(ref e) if e.is_network_error));
        assert!(clients.items().await.is_empty());
    }

    #[tokio::test]
    async fn create_appends_server_record() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::People, vec![]);
        let scope = ViewScope::new();
        let people = resource_for(&backend, EntityKind::People, people_options(), &scope);

        let created = people
            .create(record(json!({"name": "Luis", "department": "Taller"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.text("empleadoId").as_deref(), Some("1"));

        let snapshot = people.snapshot().await;
        assert_eq!(snapshot.items, vec![created]);
        assert!(snapshot.success);
    }

    #[tokio::test]
    async fn create_without_returned_record_leaves_cache() {
        let backend = InMemoryBackend::new()
            .with_entity(EntityKind::Clients, vec![])
            .with_shape(ResponseShape::Acknowledge);
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);

        let appended = clients.create(record(json!({"name": "Flota SA"}))).await.unwrap();
        assert_eq!(appended, None);
        assert!(clients.items().await.is_empty());
        assert!(clients.snapshot().await.success);
    }

    #[tokio::test]
    async fn optimistic_echo_appends_payload() {
        let backend = InMemoryBackend::new()
            .with_entity(EntityKind::Clients, vec![])
            .with_shape(ResponseShape::Acknowledge);
        let scope = ViewScope::new();
        let options = ResourceOptions {
            merge_strategy: MergeStrategy::OptimisticEcho,
            ..Default::default()
        };
        let clients = resource_for(&backend, EntityKind::Clients, options, &scope);

        clients.create(record(json!({"name": "Flota SA"}))).await.unwrap();
        assert_eq!(clients.items().await, vec![record(json!({"name": "Flota SA"}))]);
    }

    #[tokio::test]
    async fn optimistic_echo_takes_server_fields_when_returned() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Clients, vec![]);
        let scope = ViewScope::new();
        let options = ResourceOptions {
            merge_strategy: MergeStrategy::OptimisticEcho,
            ..Default::default()
        };
        let clients = resource_for(&backend, EntityKind::Clients, options, &scope);

        let appended = clients
            .create(record(json!({"name": "Flota SA"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(appended, record(json!({"name": "Flota SA", "id": "1"})));
    }

    #[tokio::test]
    async fn update_merges_in_place() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![
                record(json!({"id": "1", "name": "Ana", "status": "activo"})),
                record(json!({"id": "2", "name": "Luis", "status": "activo"})),
            ],
        );
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);
        clients.fetch_all().await.unwrap();

        let merged = clients
            .update(&"2".into(), record(json!({"status": "inactivo"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(merged.text("status").as_deref(), Some("inactivo"));

        let items = clients.items().await;
        assert_eq!(items[0], record(json!({"id": "1", "name": "Ana", "status": "activo"})));
        assert_eq!(items[1], record(json!({"id": "2", "name": "Luis", "status": "inactivo"})));
    }

    #[tokio::test]
    async fn update_without_returned_record_uses_payload_and_keeps_id() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1", "name": "Ana"}))],
        );
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);
        clients.fetch_all().await.unwrap();

        backend.set_shape(ResponseShape::Acknowledge);
        clients
            .update(&"1".into(), record(json!({"id": "999", "name": "Ana María"})))
            .await
            .unwrap();

        assert_eq!(
            clients.items().await,
            vec![record(json!({"id": "1", "name": "Ana María"}))]
        );
    }

    #[tokio::test]
    async fn update_targets_configured_key_over_fallback_id() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::People,
            vec![
                record(json!({"empleadoId": "E1", "id": "3", "name": "A"})),
                record(json!({"empleadoId": "3", "name": "B"})),
            ],
        );
        let scope = ViewScope::new();
        let people = resource_for(&backend, EntityKind::People, people_options(), &scope);
        people.fetch_all().await.unwrap();

        backend.set_shape(ResponseShape::Acknowledge);
        people
            .update(&"3".into(), record(json!({"name": "X"})))
            .await
            .unwrap();

        assert_eq!(backend.requests().pop().unwrap().path, "/empleados/actualizar/3");
        let items = people.items().await;
        assert_eq!(items[0], record(json!({"empleadoId": "E1", "id": "3", "name": "A"})));
        assert_eq!(items[1], record(json!({"empleadoId": "3", "name": "X"})));
    }

    #[tokio::test]
    async fn rejected_update_sets_error_and_keeps_cache() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1", "name": "Ana"}))],
        );
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);
        clients.fetch_all().await.unwrap();

        backend.respond_next(200, json!({"success": false, "message": "Nombre duplicado"}));
        let err = clients
            .update(&"1".into(), record(json!({"name": "Luis"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Rejected { .. }));

        let snapshot = clients.snapshot().await;
        assert_eq!(snapshot.items, vec![record(json!({"id": "1", "name": "Ana"}))]);
        assert_eq!(snapshot.error.unwrap().user_message, "Nombre duplicado");
        assert!(!snapshot.success);
    }

    #[tokio::test]
    async fn remove_drops_entry() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Expenses,
            vec![record(json!({"id": "1"})), record(json!({"id": "2"}))],
        );
        let scope = ViewScope::new();
        let expenses = resource_for(&backend, EntityKind::Expenses, ResourceOptions::default(), &scope);
        expenses.fetch_all().await.unwrap();

        expenses.remove(&"1".into()).await.unwrap();
        assert_eq!(expenses.items().await, vec![record(json!({"id": "2"}))]);
        assert_eq!(backend.records("/api/expenses").len(), 1);
    }

    #[tokio::test]
    async fn remove_unsupported_without_request() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Communications, vec![]);
        let scope = ViewScope::new();
        let comms = resource_for(&backend, EntityKind::Communications, ResourceOptions::default(), &scope);

        let err = comms.remove(&"1".into()).await.unwrap_err();
        assert!(matches!(err, DeskError::Unsupported(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn fetch_filtered_uses_query_parameter() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::People,
            vec![
                record(json!({"empleadoId": "1", "department": "Ventas"})),
                record(json!({"empleadoId": "2", "department": "Taller"})),
                record(json!({"empleadoId": "3", "department": "Caja"})),
            ],
        );
        let scope = ViewScope::new();
        let people = resource_for(&backend, EntityKind::People, people_options(), &scope);

        let found = people
            .fetch_filtered(&["Ventas".to_string(), "Caja".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let request = backend.requests().pop().unwrap();
        assert_eq!(request.path, "/obtenerEmpleadosPorDepartamentos");
        assert_eq!(request.query_param("departamentos"), Some("Ventas,Caja"));
    }

    #[tokio::test]
    async fn fetch_filtered_unsupported_leaves_state_untouched() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1"}))],
        );
        let scope = ViewScope::new();
        let options = ResourceOptions {
            fetch_failure: FetchFailurePolicy::ClearOnFailure,
            ..Default::default()
        };
        let clients = resource_for(&backend, EntityKind::Clients, options, &scope);
        clients.fetch_all().await.unwrap();
        let sent = backend.requests().len();

        let err = clients.fetch_filtered(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, DeskError::Unsupported(_)));

        let snapshot = clients.snapshot().await;
        assert_eq!(snapshot.items, vec![record(json!({"id": "1"}))]);
        assert_eq!(snapshot.error, None);
        assert!(!snapshot.loading);
        assert_eq!(backend.requests().len(), sent);
    }

    #[tokio::test]
    async fn move_to_changes_stage() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Opportunities,
            vec![record(json!({"id": "1", "title": "Flota", "stage": "lead"}))],
        );
        let scope = ViewScope::new();
        let deals = resource_for(&backend, EntityKind::Opportunities, ResourceOptions::default(), &scope);
        deals.fetch_all().await.unwrap();

        deals.move_to(&"1".into(), "stage", "proposal").await.unwrap();
        assert_eq!(deals.items().await[0].text("stage").as_deref(), Some("proposal"));
    }

    #[tokio::test]
    async fn success_is_time_boxed_when_configured() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Clients, vec![]);
        let scope = ViewScope::new();
        let options = ResourceOptions {
            success_ttl: Some(Duration::ZERO),
            ..Default::default()
        };
        let clients = resource_for(&backend, EntityKind::Clients, options, &scope);

        clients.create(record(json!({"name": "x"}))).await.unwrap();
        assert!(!clients.snapshot().await.success);
    }

    #[tokio::test]
    async fn ended_scope_fails_fast() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Clients, vec![]);
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);
        scope.end();

        assert!(matches!(clients.fetch_all().await, Err(DeskError::Cancelled)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn scope_ending_mid_flight_drops_result() {
        let backend = InMemoryBackend::new().with_entity(
            EntityKind::Clients,
            vec![record(json!({"id": "1"}))],
        );
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);

        backend.delay_next(Duration::from_millis(50));
        let pending = tokio::spawn({
            let clients = clients.clone();
            async move { clients.fetch_all().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(scope);

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, Err(DeskError::Cancelled)));
        assert!(clients.items().await.is_empty());
    }

    #[tokio::test]
    async fn loading_is_true_while_in_flight() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Clients, vec![]);
        let scope = ViewScope::new();
        let clients = resource_for(&backend, EntityKind::Clients, ResourceOptions::default(), &scope);

        backend.delay_next(Duration::from_millis(50));
        let pending = tokio::spawn({
            let clients = clients.clone();
            async move { clients.fetch_all().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(clients.is_loading().await);

        pending.await.unwrap().unwrap();
        assert!(!clients.is_loading().await);
    }
}
