//! Blocking client for the TaskFlow REST backend.
//!
//! Every call is synchronous; the TUI renders a loading frame before calling in
//! and ignores input until the call returns. Nothing is retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::category::Category;
use crate::model::config::ApiConfig;
use crate::model::task::{Task, TaskId};
use crate::model::user::User;

const UNAUTHORIZED_DEFAULT: &str = "Session expired, sign in again";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Error type for backend calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("not found")]
    NotFound,
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Token and user returned by login
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Everything the UI needs from the backend
pub trait Backend {
    fn set_token(&mut self, token: Option<String>);
    fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError>;
    fn current_user(&self) -> Result<User, ApiError>;
    fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    fn get_task(&self, id: &TaskId) -> Result<Task, ApiError>;
    fn create_task(&self, task: &Task) -> Result<Task, ApiError>;
    fn update_task(&self, task: &Task) -> Result<Task, ApiError>;
    fn delete_task(&self, id: &TaskId) -> Result<(), ApiError>;
    fn categories(&self) -> Result<Vec<Category>, ApiError>;
}

pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    version: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build();
        ApiClient {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.trim_matches('/').to_string(),
            token,
        }
    }

    /// Build a URL. Auth and task routes carry the version segment; profile and
    /// category routes never do.
    pub fn url(&self, path: &str, versioned: bool) -> String {
        if versioned && !self.version.is_empty() {
            format!("{}/{}{}", self.base_url, self.version, path)
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let req = self
            .agent
            .request(method, url)
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {}", token)),
            None => req,
        }
    }

    fn execute(
        &self,
        method: &str,
        url: &str,
        body: Option<Value>,
        unauthorized: &str,
    ) -> Result<Value, ApiError> {
        tracing::debug!(method, url, "request");
        let req = self.request(method, url);
        let result = match body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };
        match result {
            Ok(resp) => read_json(resp),
            Err(ureq::Error::Status(code, resp)) => {
                let err = status_error(code, resp, unauthorized);
                tracing::warn!(method, url, code, error = %err, "request failed");
                Err(err)
            }
            Err(e) => {
                tracing::warn!(method, url, error = %e, "transport error");
                Err(ApiError::Transport(e.to_string()))
            }
        }
    }

    fn get(&self, url: &str) -> Result<Value, ApiError> {
        self.execute("GET", url, None, UNAUTHORIZED_DEFAULT)
    }

    fn task_url(&self, id: &TaskId) -> String {
        self.url(&format!("/tasks/{}", id), true)
    }
}

fn to_value<T: Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// POST body for a new task. The backend assigns the id, so the draft's
/// local one stays out of the request.
fn create_body(task: &Task) -> Result<Value, ApiError> {
    let mut body = to_value(task)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn read_json(resp: ureq::Response) -> Result<Value, ApiError> {
    let text = resp
        .into_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn status_error(code: u16, resp: ureq::Response, unauthorized: &str) -> ApiError {
    let body = resp.into_string().unwrap_or_default();
    let message = error_message(&body);
    match code {
        401 | 403 => ApiError::Unauthorized {
            message: message.unwrap_or_else(|| unauthorized.to_string()),
        },
        404 => ApiError::NotFound,
        _ => ApiError::Status {
            code,
            message: message.unwrap_or_else(|| "request failed".into()),
        },
    }
}

/// The backend's `message` field, or the raw body if it isn't JSON
pub fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v
            .get("message")
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}

/// Strip the `{status, data, message}` envelope some routes wrap results in
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Task lists arrive bare, paginated (`{content}`), or enveloped (`{data}`)
pub fn unwrap_task_list(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("content") => {
            map.remove("content").unwrap_or(Value::Null)
        }
        Value::Object(map) if map.contains_key("data") => {
            unwrap_task_list(unwrap_envelope(Value::Object(map)))
        }
        Value::Null => Value::Array(Vec::new()),
        other => other,
    }
}

impl Backend for ApiClient {
    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = to_value(&LoginBody { email, password })?;
        let url = self.url("/auth/login", true);
        let value = self.execute("POST", &url, Some(body), INVALID_CREDENTIALS)?;
        decode(unwrap_envelope(value))
    }

    fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let body = to_value(&RegisterBody {
            name,
            email,
            password,
        })?;
        let url = self.url("/auth/register", true);
        self.execute("POST", &url, Some(body), UNAUTHORIZED_DEFAULT)?;
        Ok(())
    }

    fn current_user(&self) -> Result<User, ApiError> {
        let value = self.get(&self.url("/users/profile", false))?;
        decode(unwrap_envelope(value))
    }

    fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let value = self.get(&self.url("/tasks", true))?;
        decode(unwrap_task_list(value))
    }

    fn get_task(&self, id: &TaskId) -> Result<Task, ApiError> {
        let value = self.get(&self.task_url(id))?;
        decode(unwrap_envelope(value))
    }

    fn create_task(&self, task: &Task) -> Result<Task, ApiError> {
        let url = self.url("/tasks", true);
        let value = self.execute("POST", &url, Some(create_body(task)?), UNAUTHORIZED_DEFAULT)?;
        decode(unwrap_envelope(value))
    }

    fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
        let url = self.task_url(&task.id);
        let value = self.execute("PUT", &url, Some(to_value(task)?), UNAUTHORIZED_DEFAULT)?;
        match unwrap_envelope(value) {
            // Some revisions answer PUT with an empty body
            Value::Null => Ok(task.clone()),
            value => decode(value),
        }
    }

    fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.execute("DELETE", &self.task_url(id), None, UNAUTHORIZED_DEFAULT)?;
        Ok(())
    }

    fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let value = self.get(&self.url("/categories", false))?;
        decode(unwrap_task_list(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str, version: &str) -> ApiClient {
        ApiClient::new(
            &ApiConfig {
                base_url: base.into(),
                version: version.into(),
                timeout_secs: 5,
            },
            None,
        )
    }

    #[test]
    fn url_versioning() {
        let c = client("http://localhost:8080/api/", "v1");
        assert_eq!(c.url("/tasks", true), "http://localhost:8080/api/v1/tasks");
        assert_eq!(
            c.url("/users/profile", false),
            "http://localhost:8080/api/users/profile"
        );
        assert_eq!(
            c.task_url(&TaskId::new("42")),
            "http://localhost:8080/api/v1/tasks/42"
        );

        let c = client("http://h/api", "");
        assert_eq!(c.url("/auth/login", true), "http://h/api/auth/login");
    }

    #[test]
    fn create_body_leaves_id_to_backend() {
        let mut task = Task::new("5f0c7f4e-draft", "Write docs");
        task.story_points = Some(2);
        let body = create_body(&task).unwrap();
        assert_eq!(body.get("id"), None);
        assert_eq!(body["title"], json!("Write docs"));
        assert_eq!(body["storyPoints"], json!(2));
    }

    #[test]
    fn envelope_is_optional() {
        let bare = json!({"token": "t", "user": {"id": 1, "email": "a@b.c"}});
        let wrapped = json!({"status": "success", "data": bare.clone(), "message": "ok"});
        let a: AuthResponse = decode(unwrap_envelope(bare)).unwrap();
        let b: AuthResponse = decode(unwrap_envelope(wrapped)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.user.unwrap().email, "a@b.c");
    }

    #[test]
    fn task_list_shapes() {
        let tasks = json!([{"id": 1, "title": "a"}, {"id": "x", "title": "b"}]);
        for body in [
            tasks.clone(),
            json!({"content": tasks.clone(), "totalElements": 2}),
            json!({"data": tasks.clone()}),
            json!({"data": {"content": tasks.clone()}}),
        ] {
            let list: Vec<Task> = decode(unwrap_task_list(body)).unwrap();
            assert_eq!(list.len(), 2);
            assert_eq!(list[0].id, "1");
            assert_eq!(list[1].id, "x");
        }
        let empty: Vec<Task> = decode(unwrap_task_list(Value::Null)).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            error_message(r#"{"status":"error","message":"Email taken"}"#),
            Some("Email taken".into())
        );
        assert_eq!(error_message(r#"{"message":""}"#), None);
        assert_eq!(error_message("Bad Gateway"), Some("Bad Gateway".into()));
        assert_eq!(error_message("  "), None);
    }

    #[test]
    fn transport_error_when_nothing_listens() {
        // Port 9 (discard) on localhost is closed in test environments
        let c = client("http://127.0.0.1:9/api", "v1");
        assert!(matches!(c.list_tasks(), Err(ApiError::Transport(_))));
    }
}
