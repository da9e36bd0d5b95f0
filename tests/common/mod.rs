use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/helpdesk-api");
        cmd.env("HELPDESK_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready on any health answer, even a degraded store
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Whether the spawned server has a working database behind it.
///
/// Scenario tests bail out quietly when it does not, so the suite stays
/// green on machines without a reachable Postgres.
pub async fn db_ready(server: &TestServer) -> Result<bool> {
    let client = reqwest::Client::new();
    // Migrations and bootstrap run in the background after startup; give
    // them a moment before declaring the store unavailable.
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let res = client
            .get(format!("{}/health", server.base_url))
            .send()
            .await?;
        if res.status() == StatusCode::OK {
            return Ok(true);
        }
        if Instant::now() > deadline {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

pub fn bootstrap_email() -> String {
    std::env::var("BOOTSTRAP_ADMIN_EMAIL").unwrap_or_else(|_| "admin@helpdesk.local".to_string())
}

pub fn bootstrap_password() -> String {
    std::env::var("BOOTSTRAP_ADMIN_PASSWORD").unwrap_or_else(|_| "ChangeMe123!".to_string())
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique suffix so tests can rerun against a shared database.
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{nanos}-{n}")
}

/// POST /api/auth/login and return the bearer token.
pub async fn login(base_url: &str, email: &str, password: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;

    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed ({}): {}", status, body);
    anyhow::ensure!(body["success"] == true, "login envelope not successful: {}", body);

    body["data"]["token"]
        .as_str()
        .map(|t| t.to_string())
        .context("login response missing token")
}

/// Login as the bootstrap supreme admin.
///
/// Migrations and the first-run seed finish shortly after startup; retry
/// briefly so the first test does not race them.
pub async fn login_supreme(base_url: &str) -> Result<String> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match login(base_url, &bootstrap_email(), &bootstrap_password()).await {
            Ok(token) => return Ok(token),
            Err(e) if Instant::now() > deadline => return Err(e),
            Err(_) => tokio::time::sleep(Duration::from_millis(300)).await,
        }
    }
}

pub fn authed(token: &str) -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {}", token).parse().expect("valid header"),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .expect("client")
}

/// Unwrap the `data` field of a success envelope, asserting the envelope shape.
pub fn data(body: &Value) -> &Value {
    assert_eq!(body["success"], true, "expected success envelope, got: {body}");
    &body["data"]
}

/// Create an organization through the supreme admin API and return it.
pub async fn create_org(client: &reqwest::Client, base_url: &str, name: &str) -> Result<Value> {
    let res = client
        .post(format!("{}/api/organizational/organizations", base_url))
        .json(&serde_json::json!({ "name": name, "org_type": "university" }))
        .send()
        .await?;
    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create_org failed ({}): {}", status, body);
    Ok(data(&body).clone())
}

/// Create a user through the supreme admin API and return it.
pub async fn create_user(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &str,
    role: &str,
    organization_id: Option<&str>,
) -> Result<Value> {
    let res = client
        .post(format!("{}/api/organizational/users", base_url))
        .json(&serde_json::json!({
            "name": email.split('@').next().unwrap_or("user"),
            "email": email,
            "password": password,
            "role": role,
            "organization_id": organization_id,
        }))
        .send()
        .await?;
    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create_user failed ({}): {}", status, body);
    Ok(data(&body).clone())
}
