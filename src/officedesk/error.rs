use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

const NETWORK_USER_MESSAGE: &str = "Unable to reach the server. Check your connection.";
const SERVER_USER_MESSAGE: &str = "The server encountered an error. Please try again later.";
const CLIENT_USER_MESSAGE: &str = "The request could not be completed.";

/// The uniform failure shape every request error is normalized into.
///
/// At most one of the `is_*` flags is set: network failures, 4xx and 5xx
/// responses each get theirs. Other statuses, application-level rejections
/// (`success: false` inside a 2xx response) and local failures set none.
/// Rejections carry no status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestError {
    pub message: String,
    pub status: Option<u16>,
    pub data: Option<Value>,
    pub is_network_error: bool,
    pub is_server_error: bool,
    pub is_client_error: bool,
    pub user_message: String,
}

impl RequestError {
    /// No response was received at all.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            data: None,
            is_network_error: true,
            is_server_error: false,
            is_client_error: false,
            user_message: NETWORK_USER_MESSAGE.to_string(),
        }
    }

    /// A response arrived with a non-success status code.
    ///
    /// The backend's own `message` field, when present, becomes the user
    /// message for 4xx responses; 5xx responses always get the generic text.
    pub fn from_response(status: u16, body: Value) -> Self {
        let server_message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let is_server_error = status >= 500;
        let is_client_error = (400..500).contains(&status);

        let message = server_message
            .clone()
            .unwrap_or_else(|| format!("Request failed with status code {}", status));
        let user_message = if is_server_error {
            SERVER_USER_MESSAGE.to_string()
        } else {
            server_message.unwrap_or_else(|| CLIENT_USER_MESSAGE.to_string())
        };

        Self {
            message,
            status: Some(status),
            data: if body.is_null() { None } else { Some(body) },
            is_network_error: false,
            is_server_error,
            is_client_error,
            user_message,
        }
    }

    /// The backend answered 2xx but flagged the operation as failed.
    pub fn rejected(message: Option<&str>) -> Self {
        let message = message.unwrap_or("The server rejected the request").to_string();
        Self {
            user_message: message.clone(),
            message,
            status: None,
            data: None,
            is_network_error: false,
            is_server_error: false,
            is_client_error: false,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Request failed: {0}")]
    Request(RequestError),

    #[error("Rejected by server: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("Not authenticated, login required at {login_route}")]
    Unauthorized { login_route: String },

    #[error("Operation cancelled: the owning view is gone")]
    Cancelled,

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Invalid filter criteria: {0}")]
    InvalidCriteria(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeskError {
    /// The failure as the uniform request-error shape stored in resource state.
    pub fn to_request_error(&self) -> RequestError {
        match self {
            DeskError::Request(err) => err.clone(),
            DeskError::Rejected { message } => RequestError::rejected(message.as_deref()),
            DeskError::Unauthorized { .. } => {
                let mut err = RequestError::from_response(401, Value::Null);
                err.user_message = "Your session has expired. Please log in again.".to_string();
                err
            }
            other => RequestError {
                message: other.to_string(),
                status: None,
                data: None,
                is_network_error: false,
                is_server_error: false,
                is_client_error: false,
                user_message: other.to_string(),
            },
        }
    }

    pub fn user_message(&self) -> String {
        self.to_request_error().user_message
    }
}

impl From<RequestError> for DeskError {
    fn from(err: RequestError) -> Self {
        DeskError::Request(err)
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_server_errors() {
        let err = RequestError::from_response(503, json!({"message": "down"}));
        assert!(err.is_server_error);
        assert!(!err.is_client_error);
        assert!(!err.is_network_error);
        assert_eq!(err.message, "down");
        assert_eq!(err.user_message, SERVER_USER_MESSAGE);
    }

    #[test]
    fn client_errors_surface_backend_message() {
        let err = RequestError::from_response(422, json!({"message": "Email ya registrado"}));
        assert!(err.is_client_error);
        assert_eq!(err.user_message, "Email ya registrado");
        assert_eq!(err.data, Some(json!({"message": "Email ya registrado"})));
    }

    #[test]
    fn status_message_when_body_is_silent() {
        let err = RequestError::from_response(404, Value::Null);
        assert_eq!(err.message, "Request failed with status code 404");
        assert_eq!(err.data, None);
    }

    #[test]
    fn other_statuses_are_unflagged() {
        let err = RequestError::from_response(304, Value::Null);
        assert_eq!(err.status, Some(304));
        assert!(!err.is_server_error && !err.is_client_error && !err.is_network_error);
    }

    #[test]
    fn network_errors_have_no_status() {
        let err = RequestError::network("connection refused");
        assert!(err.is_network_error);
        assert_eq!(err.status, None);
    }

    #[test]
    fn rejection_maps_to_unflagged_request_error() {
        let err = DeskError::Rejected {
            message: Some("duplicado".into()),
        };
        let shaped = err.to_request_error();
        assert_eq!(shaped.user_message, "duplicado");
        assert_eq!(shaped.status, None);
        assert!(!shaped.is_server_error && !shaped.is_client_error && !shaped.is_network_error);
    }
}
