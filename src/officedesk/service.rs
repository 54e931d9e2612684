//! # Service Layer
//!
//! One [`ResourceService`] per entity maps the four REST verbs onto that
//! entity's [`Endpoints`]. This is also where responses are decoded: every
//! body goes through [`Payload::decode`] exactly once, `success: false` turns
//! into [`DeskError::Rejected`], and callers get plain records back.

use crate::error::{DeskError, Result};
use crate::http::{HttpClient, RequestConfig, Transport};
use crate::model::{Record, RecordId};
use crate::payload::Payload;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const ID_PLACEHOLDER: &str = "{id}";

/// Characters escaped when an id becomes a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A list endpoint that filters server-side on a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredEndpoint {
    pub path: String,
    pub param: String,
}

/// Path configuration for one entity. `update` and `delete` are templates
/// containing `{id}`; a template without the placeholder gets `/{id}` appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub list: String,
    pub create: String,
    pub update: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered: Option<FilteredEndpoint>,
}

impl Endpoints {
    /// Conventional REST layout rooted at `base`.
    pub fn rest(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            list: base.to_string(),
            create: base.to_string(),
            update: format!("{}/{}", base, ID_PLACEHOLDER),
            delete: Some(format!("{}/{}", base, ID_PLACEHOLDER)),
            filtered: None,
        }
    }

    pub fn with_filtered(mut self, path: impl Into<String>, param: impl Into<String>) -> Self {
        self.filtered = Some(FilteredEndpoint {
            path: path.into(),
            param: param.into(),
        });
        self
    }

    pub fn without_delete(mut self) -> Self {
        self.delete = None;
        self
    }

    pub fn update_path(&self, id: &RecordId) -> String {
        fill_template(&self.update, id)
    }

    pub fn delete_path(&self, id: &RecordId) -> Option<String> {
        self.delete.as_deref().map(|t| fill_template(t, id))
    }
}

/// Substitutes the percent-encoded id, so it always stays one path segment.
pub fn fill_template(template: &str, id: &RecordId) -> String {
    let segment = utf8_percent_encode(id.as_str(), SEGMENT).to_string();
    if template.contains(ID_PLACEHOLDER) {
        template.replace(ID_PLACEHOLDER, &segment)
    } else {
        format!("{}/{}", template.trim_end_matches('/'), segment)
    }
}

/// Inverse of [`fill_template`]: the id segment of `path`, if it fits `template`.
pub fn match_template(template: &str, path: &str) -> Option<RecordId> {
    let owned;
    let template = if template.contains(ID_PLACEHOLDER) {
        template
    } else {
        owned = format!("{}/{}", template.trim_end_matches('/'), ID_PLACEHOLDER);
        owned.as_str()
    };
    let (prefix, suffix) = template.split_once(ID_PLACEHOLDER)?;
    let segment = path.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    let id = percent_decode_str(segment).decode_utf8().ok()?;
    Some(RecordId::from(id.into_owned()))
}

pub struct ResourceService<T: Transport> {
    client: Arc<HttpClient<T>>,
    endpoints: Endpoints,
}

impl<T: Transport> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            endpoints: self.endpoints.clone(),
        }
    }
}

impl<T: Transport> ResourceService<T> {
    pub fn new(client: Arc<HttpClient<T>>, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn supports_delete(&self) -> bool {
        self.endpoints.delete.is_some()
    }

    pub fn supports_filtered(&self) -> bool {
        self.endpoints.filtered.is_some()
    }

    pub async fn list(&self) -> Result<Vec<Record>> {
        let body = self
            .client
            .get(&self.endpoints.list, RequestConfig::new())
            .await?;
        Ok(accept(body)?.into_records())
    }

    /// Server-side filtering; values are sent comma-joined in one parameter.
    pub async fn list_filtered(&self, values: &[String]) -> Result<Vec<Record>> {
        let filtered = self.endpoints.filtered.as_ref().ok_or_else(|| {
            DeskError::Unsupported(format!("{} has no filtered list endpoint", self.endpoints.list))
        })?;
        let config = RequestConfig::new().query(filtered.param.clone(), values.join(","));
        let body = self.client.get(&filtered.path, config).await?;
        Ok(accept(body)?.into_records())
    }

    /// Returns the stored record when the backend echoes one.
    pub async fn create(&self, payload: &Record) -> Result<Option<Record>> {
        let body = self
            .client
            .post(&self.endpoints.create, &record_body(payload), RequestConfig::new())
            .await?;
        Ok(accept(body)?.into_record())
    }

    pub async fn update(&self, id: &RecordId, payload: &Record) -> Result<Option<Record>> {
        let path = self.endpoints.update_path(id);
        let body = self
            .client
            .put(&path, &record_body(payload), RequestConfig::new())
            .await?;
        Ok(accept(body)?.into_record())
    }

    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        let path = self.endpoints.delete_path(id).ok_or_else(|| {
            DeskError::Unsupported(format!("{} has no delete endpoint", self.endpoints.list))
        })?;
        let body = self.client.delete(&path, RequestConfig::new()).await?;
        accept(body)?;
        Ok(())
    }
}

fn record_body(record: &Record) -> Value {
    record.clone().into_value()
}

fn accept(body: Value) -> Result<Payload> {
    let payload = Payload::decode(body);
    if payload.is_rejected() {
        debug!(message = ?payload.message(), "backend rejected the request");
        return Err(DeskError::Rejected {
            message: payload.message().map(str::to_string),
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_matches_templates() {
        let id = RecordId::from("42");
        assert_eq!(fill_template("/empleados/actualizar/{id}", &id), "/empleados/actualizar/42");
        assert_eq!(fill_template("/api/projects/", &id), "/api/projects/42");

        assert_eq!(
            match_template("/empleados/actualizar/{id}", "/empleados/actualizar/42"),
            Some(id.clone())
        );
        assert_eq!(match_template("/api/projects", "/api/projects/42"), Some(id));
        assert_eq!(match_template("/api/projects/{id}", "/api/projects/"), None);
        assert_eq!(match_template("/api/projects/{id}", "/api/projects/4/notes"), None);
        assert_eq!(match_template("/api/projects/{id}", "/api/clients/4"), None);
    }

    #[test]
    fn ids_are_escaped_into_one_segment() {
        let id = RecordId::from("a#b/c d?");
        let path = fill_template("/api/projects/{id}", &id);
        assert_eq!(path, "/api/projects/a%23b%2Fc%20d%3F");
        assert_eq!(match_template("/api/projects/{id}", &path), Some(id));

        let percent = RecordId::from("50%");
        assert_eq!(fill_template("/api/projects", &percent), "/api/projects/50%25");
    }

    #[test]
    fn rest_layout() {
        let endpoints = Endpoints::rest("/api/expenses/");
        assert_eq!(endpoints.list, "/api/expenses");
        assert_eq!(endpoints.update_path(&"7".into()), "/api/expenses/7");
        assert_eq!(endpoints.delete_path(&"7".into()).as_deref(), Some("/api/expenses/7"));
        assert_eq!(endpoints.without_delete().delete_path(&"7".into()), None);
    }
}
