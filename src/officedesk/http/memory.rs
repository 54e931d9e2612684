//! An emulated REST backend.
//!
//! Serves one or more record collections through the same endpoint layout a
//! real backend would, so services and resources can be exercised end to end
//! without a network. Beyond plain CRUD it can:
//!
//! - answer in several response shapes (enveloped, raw, acknowledge-only)
//! - replay scripted responses for the next requests (failures, odd bodies)
//! - delay individual requests, to stage races
//! - go offline (network errors) and require a bearer token
//!
//! Every request is logged for later inspection.

use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::entities::EntityKind;
use crate::error::RequestError;
use crate::model::{IdKey, Record, RecordId};
use crate::service::{match_template, Endpoints};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How successful responses are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// `{ "success": true, "data": ... }`
    #[default]
    Enveloped,
    /// Lists as bare arrays, records as bare objects.
    Raw,
    /// Lists enveloped; mutations answer `{ "success": true }` without data.
    Acknowledge,
}

struct Collection {
    endpoints: Endpoints,
    id_key: IdKey,
    filtered_field: Option<String>,
    records: Vec<Record>,
}

impl Collection {
    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.matches_id(&self.id_key, id))
    }
}

#[derive(Default)]
struct BackendState {
    collections: Vec<Collection>,
    shape: ResponseShape,
    scripted: VecDeque<ApiResponse>,
    delays: VecDeque<Duration>,
    required_token: Option<String>,
    offline: bool,
    next_id: u64,
    log: Vec<ApiRequest>,
}

impl BackendState {
    fn route(&mut self, request: &ApiRequest) -> ApiResponse {
        if let Some(token) = &self.required_token {
            let expected = format!("Bearer {}", token);
            if request.header("Authorization") != Some(expected.as_str()) {
                return respond(401, json!({"success": false, "message": "Unauthorized"}));
            }
        }

        let shape = self.shape;
        for index in 0..self.collections.len() {
            if let Some(response) = self.route_collection(index, request, shape) {
                return response;
            }
        }
        respond(404, json!({"success": false, "message": "Not found"}))
    }

    fn route_collection(
        &mut self,
        index: usize,
        request: &ApiRequest,
        shape: ResponseShape,
    ) -> Option<ApiResponse> {
        let path = request.path.as_str();
        let endpoints = self.collections[index].endpoints.clone();

        match request.method {
            Method::Get if path == endpoints.list => {
                let records = self.collections[index].records.clone();
                Some(list_response(records, shape))
            }
            Method::Get
                if endpoints
                    .filtered
                    .as_ref()
                    .is_some_and(|f| f.path == path) =>
            {
                let filtered = endpoints.filtered.as_ref()?;
                let collection = &self.collections[index];
                let wanted: Vec<&str> = request
                    .query_param(&filtered.param)
                    .unwrap_or("")
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .collect();
                let field = collection.filtered_field.as_deref().unwrap_or("");
                let records = collection
                    .records
                    .iter()
                    .filter(|r| {
                        r.text(field)
                            .is_some_and(|value| wanted.contains(&value.as_str()))
                    })
                    .cloned()
                    .collect();
                Some(list_response(records, shape))
            }
            Method::Post if path == endpoints.create => {
                let Some(mut record) = request.body.clone().and_then(Record::from_value) else {
                    return Some(respond(
                        400,
                        json!({"success": false, "message": "Body must be an object"}),
                    ));
                };
                let collection_key = self.collections[index].id_key.clone();
                if record.id(&collection_key).is_none() {
                    self.next_id += 1;
                    record.insert(collection_key.primary(), self.next_id.to_string());
                }
                self.collections[index].records.push(record.clone());
                Some(record_response(201, record, shape))
            }
            Method::Put => {
                let id = match_template(&endpoints.update, path)?;
                let patch = request
                    .body
                    .clone()
                    .and_then(Record::from_value)
                    .unwrap_or_default();
                let collection = &mut self.collections[index];
                let Some(position) = collection.position(&id) else {
                    return Some(respond(404, json!({"success": false, "message": "Record not found"})));
                };
                let updated = collection.records[position].merged(&patch, &collection.id_key);
                collection.records[position] = updated.clone();
                Some(record_response(200, updated, shape))
            }
            Method::Delete => {
                let id = match_template(endpoints.delete.as_deref()?, path)?;
                let collection = &mut self.collections[index];
                let Some(position) = collection.position(&id) else {
                    return Some(respond(404, json!({"success": false, "message": "Record not found"})));
                };
                collection.records.remove(position);
                Some(respond(200, json!({"success": true, "data": null})))
            }
            _ => None,
        }
    }
}

fn respond(status: u16, body: Value) -> ApiResponse {
    ApiResponse { status, body }
}

fn list_response(records: Vec<Record>, shape: ResponseShape) -> ApiResponse {
    let items: Vec<Value> = records.into_iter().map(Record::into_value).collect();
    match shape {
        ResponseShape::Raw => respond(200, Value::Array(items)),
        ResponseShape::Enveloped | ResponseShape::Acknowledge => {
            respond(200, json!({"success": true, "data": items}))
        }
    }
}

fn record_response(status: u16, record: Record, shape: ResponseShape) -> ApiResponse {
    match shape {
        ResponseShape::Enveloped => {
            respond(status, json!({"success": true, "data": record.into_value()}))
        }
        ResponseShape::Raw => respond(status, record.into_value()),
        ResponseShape::Acknowledge => respond(status, json!({"success": true, "message": "ok"})),
    }
}

/// Cloning shares the underlying state, so a test can keep a handle while the
/// client owns another.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(
        self,
        endpoints: Endpoints,
        id_key: IdKey,
        filtered_field: Option<&str>,
        records: Vec<Record>,
    ) -> Self {
        self.lock().collections.push(Collection {
            endpoints,
            id_key,
            filtered_field: filtered_field.map(str::to_string),
            records,
        });
        self
    }

    /// A collection laid out like the entity's preset endpoints.
    pub fn with_entity(self, kind: EntityKind, records: Vec<Record>) -> Self {
        self.with_collection(kind.endpoints(), kind.id_key(), kind.filtered_field(), records)
    }

    pub fn with_shape(self, shape: ResponseShape) -> Self {
        self.set_shape(shape);
        self
    }

    pub fn with_required_token(self, token: &str) -> Self {
        self.lock().required_token = Some(token.to_string());
        self
    }

    pub fn set_shape(&self, shape: ResponseShape) {
        self.lock().shape = shape;
    }

    /// The next request gets exactly this response; the collections are untouched.
    pub fn respond_next(&self, status: u16, body: Value) {
        self.lock().scripted.push_back(respond(status, body));
    }

    /// The next request fails with `status` and a backend-style message.
    pub fn fail_next(&self, status: u16) {
        self.respond_next(
            status,
            json!({"success": false, "message": format!("Simulated failure ({})", status)}),
        );
    }

    /// The next request waits this long before it is answered.
    pub fn delay_next(&self, delay: Duration) {
        self.lock().delays.push_back(delay);
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().log.clone()
    }

    /// Current server-side records of the collection whose list path is given.
    pub fn records(&self, list_path: &str) -> Vec<Record> {
        self.lock()
            .collections
            .iter()
            .find(|c| c.endpoints.list == list_path)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for InMemoryBackend {
    async fn execute(&self, request: ApiRequest) -> std::result::Result<ApiResponse, RequestError> {
        // Scripted responses and delays are claimed on arrival so that the
        // order of requests, not the order of completion, decides who gets what.
        let (delay, scripted) = {
            let mut state = self.lock();
            state.log.push(request.clone());
            (state.delays.pop_front(), state.scripted.pop_front())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.offline {
            return Err(RequestError::network("backend unreachable"));
        }
        if let Some(response) = scripted {
            return Ok(response);
        }
        Ok(state.route(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Record {
        Record::new().with("id", "1").with("name", "Ana")
    }

    fn get(path: &str) -> ApiRequest {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            query: vec![],
            headers: vec![],
            body: None,
        }
    }

    #[tokio::test]
    async fn serves_lists_in_each_shape() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Clients, vec![ana()]);

        let enveloped = backend.execute(get("/clientes")).await.unwrap();
        assert_eq!(enveloped.body, json!({"success": true, "data": [{"id": "1", "name": "Ana"}]}));

        backend.set_shape(ResponseShape::Raw);
        let raw = backend.execute(get("/clientes")).await.unwrap();
        assert_eq!(raw.body, json!([{"id": "1", "name": "Ana"}]));
    }

    #[tokio::test]
    async fn assigns_ids_on_create() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::People, vec![]);
        let request = ApiRequest {
            method: Method::Post,
            path: "/empleados/crear".into(),
            query: vec![],
            headers: vec![],
            body: Some(json!({"name": "Luis"})),
        };
        let response = backend.execute(request).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body["data"]["empleadoId"], json!("1"));
        assert_eq!(backend.records("/empleados").len(), 1);
    }

    #[tokio::test]
    async fn scripted_response_wins_over_routing() {
        let backend = InMemoryBackend::new().with_entity(EntityKind::Clients, vec![ana()]);
        backend.fail_next(500);
        let response = backend.execute(get("/clientes")).await.unwrap();
        assert_eq!(response.status, 500);
        let response = backend.execute(get("/clientes")).await.unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let backend = InMemoryBackend::new();
        let response = backend.execute(get("/nowhere")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn offline_is_a_network_error() {
        let backend = InMemoryBackend::new();
        backend.set_offline(true);
        let err = backend.execute(get("/clientes")).await.unwrap_err();
        assert!(err.is_network_error);
    }

    #[tokio::test]
    async fn required_token_is_enforced() {
        let backend = InMemoryBackend::new()
            .with_entity(EntityKind::Clients, vec![])
            .with_required_token("t0k");
        assert_eq!(backend.execute(get("/clientes")).await.unwrap().status, 401);

        let mut authed = get("/clientes");
        authed.headers.push(("Authorization".into(), "Bearer t0k".into()));
        assert_eq!(backend.execute(authed).await.unwrap().status, 200);
    }
}
