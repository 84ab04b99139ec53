#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use pinboard_api::auth::MemorySessionStore;
use pinboard_api::config::AppConfig;
use pinboard_api::database::MemoryStore;
use pinboard_api::{app, AppState};

pub const PASSWORD: &str = "password123";

/// Upload limit used by the test server
pub const MAX_FILE_BYTES: usize = 64 * 1024;

/// In-process server on a free port with fresh in-memory stores
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    uploads: TempDir,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let uploads = tempfile::tempdir().context("failed to create uploads dir")?;

        let mut config = AppConfig::development();
        config.server.port = port;
        config.uploads.dir = uploads.path().to_path_buf();
        config.uploads.max_file_bytes = MAX_FILE_BYTES;
        // Cheapest argon2 cost keeps the suite fast
        config.security.password_memory_kib = 1024;
        config.security.password_iterations = 1;

        let state = AppState::new(
            &config,
            Arc::new(MemoryStore::new()),
            MemorySessionStore::new(),
        )?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self {
            port,
            base_url,
            uploads,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn uploads_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Client with a cookie jar and no session yet
    pub fn anonymous(&self) -> Result<Client> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Client {
            http,
            base_url: self.base_url.clone(),
            user_id: String::new(),
            token: String::new(),
        })
    }

    /// Register `<name>@example.com`; the returned client holds the session cookie
    pub async fn register(&self, name: &str) -> Result<Client> {
        let mut client = self.anonymous()?;
        let (status, body) = client
            .post(
                "/api/users/register",
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name),
                    "password": PASSWORD,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        client.user_id = body["data"]["user"]["id"].as_str().context("missing user id")?.to_string();
        client.token = body["data"]["token"].as_str().context("missing token")?.to_string();
        Ok(client)
    }
}

pub struct Client {
    pub http: reqwest::Client,
    pub base_url: String,
    pub user_id: String,
    pub token: String,
}

impl Client {
    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, None).await
    }

    /// Create a board and return its id
    pub async fn board(&self, title: &str, collaborators: &[&Client]) -> Result<String> {
        let ids: Vec<&str> = collaborators.iter().map(|c| c.user_id.as_str()).collect();
        let (status, body) = self
            .post("/api/boards", json!({ "title": title, "collaborators": ids }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create board failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("missing board id")?.to_string())
    }

    /// Create a link pin and return its id
    pub async fn link_pin(&self, board_id: &str, title: &str, tags: Value) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/pins",
                json!({
                    "boardId": board_id,
                    "type": "link",
                    "contentUrl": "https://example.com",
                    "title": title,
                    "tags": tags,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create pin failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("missing pin id")?.to_string())
    }
}

/// Titles from a `{"data": [...]}` listing, in order
pub fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
