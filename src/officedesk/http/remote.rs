use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{DeskError, RequestError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Production transport: plain HTTP(S) against a base URL.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> std::result::Result<ApiResponse, RequestError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RequestError::network(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RequestError::network(e.to_string()))?;

        Ok(ApiResponse {
            status,
            body: parse_body(&bytes),
        })
    }
}

/// Non-JSON bodies (HTML error pages from proxies, plain text) are kept as a
/// string so they still reach `RequestError::data`.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_base_and_path() {
        let transport = ReqwestTransport::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:3000");
        assert_eq!(transport.url("/empleados"), "http://localhost:3000/empleados");
        assert_eq!(transport.url("api/projects"), "http://localhost:3000/api/projects");
    }

    #[test]
    fn parses_json_text_and_empty_bodies() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(br#"{"success":true}"#), json!({"success": true}));
        assert_eq!(parse_body(b"Bad Gateway"), json!("Bad Gateway"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) on loopback is closed on any sane test machine.
        let transport = ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = ApiRequest {
            method: Method::Get,
            path: "/empleados".into(),
            query: vec![],
            headers: vec![],
            body: None,
        };
        let err = transport.execute(request).await.unwrap_err();
        assert!(err.is_network_error);
    }
}
