#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde_json::{json, Value};

use elearning_api::config::AppConfig;
use elearning_api::database::MemoryStore;
use elearning_api::services::payment::{verify_signature, OrderRequest, PaymentError, PaymentGateway};
use elearning_api::services::storage::MemoryStorage;
use elearning_api::{app, AppState};

pub const PAYMENT_SECRET: &str = "test-key-secret";
pub const ADMIN_KEY: &str = "dev-admin-key";

/// Gateway double: echoes the order back and checks signatures with
/// `PAYMENT_SECRET`
pub struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, order: OrderRequest) -> Result<Value, PaymentError> {
        Ok(json!({
            "id": "order_test_1",
            "entity": "order",
            "amount": order.amount,
            "currency": order.currency,
            "receipt": order.receipt,
            "status": "created",
        }))
    }

    fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(PAYMENT_SECRET, order_id, payment_id, signature)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub storage: Arc<MemoryStorage>,
}

impl TestServer {
    /// In-process server on a free port with in-memory backends
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(false).await
    }

    pub async fn spawn_with_payments() -> Result<Self> {
        Self::spawn_with(true).await
    }

    async fn spawn_with(payments: bool) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let storage = Arc::new(MemoryStorage::new());
        let gateway: Option<Arc<dyn PaymentGateway>> = if payments {
            Some(Arc::new(FakeGateway))
        } else {
            None
        };
        let state = AppState::new(
            AppConfig::development(),
            Arc::new(MemoryStore::new()),
            storage.clone(),
            gateway,
        );

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self { base_url, storage };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

/// Client that keeps cookies between requests
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

pub struct Session {
    pub client: Client,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register(server: &TestServer, client: &Client, name: &str) -> Result<reqwest::Response> {
    Ok(client
        .post(server.api("/users/register"))
        .json(&json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "password123",
        }))
        .send()
        .await?)
}

/// Register and log in a fresh user
pub async fn signed_in(server: &TestServer, name: &str) -> Result<Session> {
    let client = client();
    let res = register(server, &client, name).await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let res = client
        .post(server.api("/users/login"))
        .json(&json!({ "email": format!("{name}@example.com"), "password": "password123" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body: Value = res.json().await?;

    Ok(Session {
        client,
        user_id: body["data"]["user"]["id"].as_str().context("user id")?.to_string(),
        access_token: body["data"]["accessToken"].as_str().context("access token")?.to_string(),
        refresh_token: body["data"]["refreshToken"].as_str().context("refresh token")?.to_string(),
    })
}

pub fn image(name: &str) -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name(name.to_string())
        .mime_str("image/png")
        .expect("mime")
}

pub fn video(name: &str) -> Part {
    Part::bytes(vec![0, 0, 0, 0x18, b'f', b't', b'y', b'p'])
        .file_name(name.to_string())
        .mime_str("video/mp4")
        .expect("mime")
}

pub fn course_form(name: &str, price: &str) -> Form {
    Form::new()
        .text("courseName", name.to_string())
        .text("description", "A practical course")
        .text("price", price.to_string())
        .text("duration", "6h")
        .text("category", "Web Development")
        .text("tags", "rust,web")
        .part("thumbnail", image("thumb.png"))
}

/// Create a course as `session` and return its JSON
pub async fn create_course(server: &TestServer, session: &Session, name: &str, price: &str) -> Result<Value> {
    let res = session
        .client
        .post(server.api("/courses/createCourse"))
        .multipart(course_form(name, price))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create course failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}

pub async fn create_lesson(server: &TestServer, session: &Session, course_id: &str, title: &str) -> Result<Value> {
    let form = Form::new()
        .text("lessonTitle", title.to_string())
        .text("details", "Lesson details")
        .text("videoTitle", format!("{title} video"))
        .part("video", video("clip.mp4"));
    let res = session
        .client
        .post(server.api(&format!("/lessons/{course_id}")))
        .multipart(form)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create lesson failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}
