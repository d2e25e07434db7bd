//! HTTP client for the Todoz backend REST API.
//!
//! Thin typed wrapper over the backend's routes. Every request carries the
//! active locale as `Accept-Language`, and authenticated requests carry the
//! session token in the backend's custom `token` header. Mutating calls
//! return nothing useful on purpose: the caller refetches the affected
//! collection and replaces its local copy wholesale.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fields::{format_locale, Locale};
use crate::task::Task;
use crate::todo::Todo;

/// Default backend address, matching the server's development setup.
pub const DEFAULT_SERVER: &str = "http://localhost:3000";

/// Errors from Todoz API calls.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An attachment file could not be read.
    #[error("Attachment error: {0}")]
    Attachment(#[from] std::io::Error),
}

impl ApiError {
    /// Message for a status-bar notification: the server's own `msg` for
    /// API rejections, a generic line for everything else.
    pub fn notification(&self) -> String {
        match self {
            ApiError::Api { message, .. } if !message.is_empty() => message.clone(),
            _ => "Error".to_string(),
        }
    }
}

/// Error body shape the backend uses for rejections.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginUser {
    pub name: String,
}

/// Successful login payload: the session token plus the user record the
/// display name comes from.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
struct AddTaskRequest<'a> {
    text: &'a str,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateTaskRequest<'a> {
    text: &'a str,
    completed: bool,
}

/// Client for the Todoz REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    locale: Locale,
}

impl ApiClient {
    /// Create a client for the given server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not start with an http(s) scheme
    /// or the underlying client cannot be built.
    pub fn new(base_url: impl Into<String>, locale: Locale) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "server URL must start with http:// or https://, got '{base_url}'"
            )));
        }
        let client = Client::builder()
            .user_agent(concat!("todoz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            token: None,
            locale,
        })
    }

    /// Install or clear the session token used for authenticated routes.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Register a new account.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        let req = self.request(Method::POST, "/api/users/register").json(&body);
        self.execute_ok(req).await
    }

    /// Sign in and obtain a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let req = self.request(Method::POST, "/api/users/login").json(&body);
        self.execute(req).await
    }

    /// Fetch all todos for the signed-in user.
    pub async fn fetch_todos(&self) -> Result<Vec<Todo>, ApiError> {
        let req = self.request(Method::GET, "/api/todos/gettodos");
        self.execute(req).await
    }

    /// Look up a single todo by exact title. A miss is a `None`, not an
    /// error.
    pub async fn find_todo(&self, title: &str) -> Result<Option<Todo>, ApiError> {
        let path = format!("/api/todos/gettodo/{}", encode_segment(title));
        let req = self.request(Method::GET, &path);
        self.execute(req).await
    }

    /// Create a todo from a title and an image file, uploaded as a
    /// multipart form.
    pub async fn create_todo(&self, title: &str, image_path: &Path) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for_path(image_path))?;
        let form = reqwest::multipart::Form::new()
            .text("title", title.to_string())
            .part("image", part);
        let req = self.request(Method::POST, "/api/todos").multipart(form);
        self.execute_ok(req).await
    }

    /// Delete a whole todo. The backend exposes this under the todo's
    /// `/task` path.
    pub async fn delete_todo(&self, todo_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/todos/{todo_id}/task");
        let req = self.request(Method::DELETE, &path);
        self.execute_ok(req).await
    }

    /// Fetch the task list for one todo.
    pub async fn fetch_tasks(&self, todo_id: &str) -> Result<Vec<Task>, ApiError> {
        let path = format!("/api/todos/{todo_id}/tasks");
        let req = self.request(Method::GET, &path);
        self.execute(req).await
    }

    /// Add a task to a todo.
    pub async fn add_task(
        &self,
        todo_id: &str,
        text: &str,
        date: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        let body = AddTaskRequest {
            text,
            date: date.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        let path = format!("/api/todos/{todo_id}/task");
        let req = self.request(Method::POST, &path).json(&body);
        self.execute_ok(req).await
    }

    /// Update a task's text and completion flag.
    pub async fn update_task(
        &self,
        todo_id: &str,
        task_id: &str,
        text: &str,
        completed: bool,
    ) -> Result<(), ApiError> {
        let body = UpdateTaskRequest { text, completed };
        let path = format!("/api/todos/{todo_id}/task/{task_id}");
        let req = self.request(Method::PUT, &path).json(&body);
        self.execute_ok(req).await
    }

    /// Delete a task from a todo.
    pub async fn delete_task(&self, todo_id: &str, task_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/todos/{todo_id}/task/{task_id}");
        let req = self.request(Method::DELETE, &path);
        self.execute_ok(req).await
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "todoz api request");
        let mut req = self
            .client
            .request(method, url)
            .header("Accept-Language", format_locale(self.locale));
        if let Some(token) = &self.token {
            req = req.header("token", token);
        }
        req
    }

    async fn execute<T>(&self, req: reqwest::RequestBuilder) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = check_status(req.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }

    /// Like `execute`, for calls whose response body the client discards.
    async fn execute_ok(&self, req: reqwest::RequestBuilder) -> Result<(), ApiError> {
        check_status(req.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into `ApiError::Api`, preferring the backend's
/// `{msg}` body over the raw text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&error_text) {
        Ok(body) => body.msg,
        Err(_) => error_text,
    };
    Err(ApiError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Percent-encode one path segment; search titles may contain spaces.
fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
        let mut api = ApiClient::new(server.uri(), Locale::En).unwrap();
        api.set_token(token.map(str::to_string));
        api
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(ApiClient::new("", Locale::En).is_err());
        assert!(ApiClient::new("localhost:3000", Locale::En).is_err());
        assert!(ApiClient::new("http://localhost:3000", Locale::En).is_ok());
        assert!(ApiClient::new("http://localhost:3000/", Locale::En).is_ok());
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("groceries"), "groceries");
        assert_eq!(encode_segment("water plants"), "water%20plants");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
    }

    #[tokio::test]
    async fn test_login_decodes_token_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .and(body_json(serde_json::json!({
                "email": "dana@example.com",
                "password": "Abcde1@"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "jwt-abc",
                "user": {"name": "dana-lists"}
            })))
            .mount(&server)
            .await;

        let api = client_for(&server, None);
        let login = api.login("dana@example.com", "Abcde1@").await.unwrap();
        assert_eq!(login.token, "jwt-abc");
        assert_eq!(login.user.name, "dana-lists");
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"msg": "incorrect email or password"})),
            )
            .mount(&server)
            .await;

        let api = client_for(&server, None);
        let err = api.login("dana@example.com", "wrong").await.unwrap_err();
        match &err {
            ApiError::Api { status, message } => {
                assert_eq!(*status, 401);
                assert_eq!(message, "incorrect email or password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.notification(), "incorrect email or password");
    }

    #[tokio::test]
    async fn test_delete_failure_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/todos/6501/task"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"msg": "not found"})),
            )
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        let err = api.delete_todo("6501").await.unwrap_err();
        match &err {
            ApiError::Api { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_tasks_sends_token_and_locale_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/todos/6501/tasks"))
            .and(header("token", "jwt-abc"))
            .and(header("Accept-Language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"_id": "t1", "text": "milk", "completed": false, "date": null},
                {"_id": "t2", "text": "bread", "completed": true, "date": null}
            ])))
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        let tasks = api.fetch_tasks("6501").await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].text, "milk");
        assert!(tasks[1].completed);
    }

    #[tokio::test]
    async fn test_update_task_sends_inverted_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/todos/6501/task/t1"))
            .and(body_json(serde_json::json!({
                "text": "milk",
                "completed": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        api.update_task("6501", "t1", "milk", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_task_sends_iso_date_or_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/todos/6501/task"))
            .and(body_json(serde_json::json!({
                "text": "water plants",
                "date": "2025-03-01T09:00:00.000Z"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/todos/6502/task"))
            .and(body_json(serde_json::json!({
                "text": "no date",
                "date": null
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        let date = "2025-03-01T09:00:00Z".parse::<DateTime<Utc>>().unwrap();
        api.add_task("6501", "water plants", Some(date)).await.unwrap();
        api.add_task("6502", "no date", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_todo_miss_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/todos/gettodo/nothing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        assert!(api.find_todo("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_todo_hit_decodes_card() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/todos/gettodo/groceries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_id": "6501",
                "title": "groceries",
                "image": {"secure_url": "https://img.example/x.png"}
            })))
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        let found = api.find_todo("groceries").await.unwrap().unwrap();
        assert_eq!(found.id, "6501");
    }

    #[tokio::test]
    async fn test_delete_routes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/todos/6501/task/t1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/todos/6501/task"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = client_for(&server, Some("jwt-abc"));
        api.delete_task("6501", "t1").await.unwrap();
        api.delete_todo("6501").await.unwrap();
    }

    #[tokio::test]
    async fn test_register_posts_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/register"))
            .and(body_json(serde_json::json!({
                "name": "dana-lists",
                "email": "dana@example.com",
                "password": "Abcde1@"
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let api = client_for(&server, None);
        api.register("dana-lists", "dana@example.com", "Abcde1@")
            .await
            .unwrap();
    }
}
