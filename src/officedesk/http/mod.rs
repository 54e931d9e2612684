//! # HTTP Layer
//!
//! [`HttpClient`] is the only code that knows about status codes, bearer
//! tokens and failure normalization. The actual wire is behind the
//! [`Transport`] trait:
//!
//! - [`remote::ReqwestTransport`]: production transport over `reqwest`
//! - [`memory::InMemoryBackend`]: an emulated REST backend for tests
//!
//! Every call returns the parsed response body on 2xx. Anything else becomes
//! a [`DeskError`]: 401 expires the session and yields
//! [`DeskError::Unauthorized`], other statuses and transport failures yield
//! [`DeskError::Request`] carrying the uniform [`RequestError`] shape.

use crate::error::{DeskError, RequestError, Result};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

pub mod memory;
pub mod remote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Per-call options: query parameters and extra headers.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A fully prepared request as handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; an empty body is `Value::Null`.
    pub body: Value,
}

/// Moves a request over the wire.
///
/// Implementations return `Err` only when no response was received; any
/// response, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> std::result::Result<ApiResponse, RequestError>;
}

pub struct HttpClient<T: Transport> {
    transport: T,
    session: Session,
}

impl<T: Transport> HttpClient<T> {
    pub fn new(transport: T, session: Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get(&self, path: &str, config: RequestConfig) -> Result<Value> {
        self.send(Method::Get, path, None, config).await
    }

    pub async fn post(&self, path: &str, body: &Value, config: RequestConfig) -> Result<Value> {
        self.send(Method::Post, path, Some(body.clone()), config)
            .await
    }

    pub async fn put(&self, path: &str, body: &Value, config: RequestConfig) -> Result<Value> {
        self.send(Method::Put, path, Some(body.clone()), config).await
    }

    pub async fn patch(&self, path: &str, body: &Value, config: RequestConfig) -> Result<Value> {
        self.send(Method::Patch, path, Some(body.clone()), config)
            .await
    }

    pub async fn delete(&self, path: &str, config: RequestConfig) -> Result<Value> {
        self.send(Method::Delete, path, None, config).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        config: RequestConfig,
    ) -> Result<Value> {
        let mut headers = config.headers;
        if let Some(token) = self.session.token()? {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let request = ApiRequest {
            method,
            path: path.to_string(),
            query: config.query,
            headers,
            body,
        };

        debug!(%method, path, "sending request");
        let response = self.transport.execute(request).await.map_err(|err| {
            warn!(%method, path, error = %err, "no response from backend");
            DeskError::Request(err)
        })?;

        match response.status {
            200..=299 => Ok(response.body),
            401 => {
                let login_route = self.session.expire();
                Err(DeskError::Unauthorized { login_route })
            }
            status => {
                let err = RequestError::from_response(status, response.body);
                warn!(%method, path, status, error = %err, "request failed");
                Err(DeskError::Request(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every request with a fixed response and keeps what it saw.
    struct Canned {
        response: std::result::Result<ApiResponse, RequestError>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Canned {
        fn status(status: u16, body: Value) -> Self {
            Self {
                response: Ok(ApiResponse { status, body }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn unreachable() -> Self {
            Self {
                response: Err(RequestError::network("connection refused")),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn execute(
            &self,
            request: ApiRequest,
        ) -> std::result::Result<ApiResponse, RequestError> {
            self.seen.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn session_with_token() -> Session {
        Session::new(MemoryTokenStore::with_token("secret"), "/login")
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let client = HttpClient::new(Canned::status(200, json!([])), session_with_token());
        client.get("/clientes", RequestConfig::new()).await.unwrap();

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].header("authorization"), Some("Bearer secret"));
        assert_eq!(seen[0].method, Method::Get);
    }

    #[tokio::test]
    async fn no_token_no_header() {
        let client = HttpClient::new(Canned::status(200, json!([])), Session::in_memory());
        client.get("/clientes", RequestConfig::new()).await.unwrap();

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].header("Authorization"), None);
    }

    #[tokio::test]
    async fn passes_query_and_body() {
        let client = HttpClient::new(Canned::status(201, json!({"ok": true})), Session::in_memory());
        let body = json!({"name": "Ana"});
        let result = client
            .post("/empleados/crear", &body, RequestConfig::new().query("draft", "1"))
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true}));

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].body.as_ref(), Some(&body));
        assert_eq!(seen[0].query_param("draft"), Some("1"));
    }

    #[tokio::test]
    async fn unauthorized_expires_session() {
        let session = session_with_token();
        let client = HttpClient::new(Canned::status(401, json!({})), session.clone());

        let err = client.get("/clientes", RequestConfig::new()).await.unwrap_err();
        assert!(matches!(err, DeskError::Unauthorized { ref login_route } if login_route == "/login"));
        assert!(!session.is_authenticated());
        assert_eq!(session.pending_redirect().as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn server_error_is_normalized() {
        let client = HttpClient::new(Canned::status(500, json!({"message": "boom"})), Session::in_memory());
        let err = client
            .put("/api/projects/1", &json!({}), RequestConfig::new())
            .await
            .unwrap_err();
        match err {
            DeskError::Request(e) => {
                assert!(e.is_server_error);
                assert_eq!(e.status, Some(500));
                assert_eq!(e.message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let client = HttpClient::new(Canned::unreachable(), Session::in_memory());
        let err = client.delete("/api/projects/1", RequestConfig::new()).await.unwrap_err();
        assert!(matches!(err, DeskError::Request(ref e) if e.is_network_error));
    }
}
