#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::{Datelike, NaiveDate, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use tourdesk_api::auth::jwt::{generate_access_token, JwtConfig};
use tourdesk_api::config::{DocumentConfig, ServerConfig};
use tourdesk_api::router::build_app_router;
use tourdesk_api::scanner::VirusScanner;
use tourdesk_api::state::AppState;
use tourdesk_api::storage::{DocumentStore, LocalDocumentStore, StorageError};
use tourdesk_core::documents::{DocumentKind, ScanVerdict};
use tourdesk_core::link::LinkStatus;
use tourdesk_core::prerequisites::RecencyPolicy;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::{Account, CreateAccount, UpdateProfile};
use tourdesk_db::models::link::CreateLink;
use tourdesk_db::models::tour::{CreateTourInstance, CreateTourTemplate};
use tourdesk_db::repositories::{AccountRepo, LinkRepo, TourRepo};
use tourdesk_events::{DeliveryError, Notification, NotificationDispatcher, Notifier};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

/// Build a test `ServerConfig` storing uploads under `upload_dir`.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        public_base_url: "http://localhost:5173".to_string(),
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
            invitation_expiry_hours: 24,
        },
        eligibility: RecencyPolicy::default(),
        documents: DocumentConfig {
            upload_dir,
            max_upload_bytes: 1024 * 1024,
            clamd_addr: "127.0.0.1:1".to_string(),
            virus_scan_disabled: false,
        },
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Keeps every notification it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Dispatch is fire-and-forget, so poll briefly for `count` messages.
    pub async fn wait_for(&self, count: usize) -> Vec<Notification> {
        for _ in 0..50 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: &Notification) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Returns the same verdict for every file.
pub struct StaticScanner(pub ScanVerdict);

#[async_trait]
impl VirusScanner for StaticScanner {
    async fn scan(&self, _bytes: &[u8]) -> ScanVerdict {
        self.0.clone()
    }
}

/// Delegates to a local store but refuses to write one kind of document.
pub struct FailingKindStore {
    inner: LocalDocumentStore,
    failing: DocumentKind,
}

#[async_trait]
impl DocumentStore for FailingKindStore {
    async fn put(
        &self,
        owner_id: DbId,
        kind: DocumentKind,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if kind == self.failing {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.put(owner_id, kind, extension, bytes).await
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        self.inner.delete(reference).await
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub notifier: Arc<RecordingNotifier>,
    pub config: ServerConfig,
    uploads: TempDir,
}

impl TestApp {
    pub fn upload_root(&self) -> &std::path::Path {
        self.uploads.path()
    }

    pub fn token_for(&self, user_id: DbId, role: Role) -> String {
        generate_access_token(user_id, role, &self.config.jwt).unwrap()
    }
}

/// Build the full application router with a clean-verdict scanner.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with_scanner(pool, ScanVerdict::Clean)
}

/// Build the full application router, using the same middleware stack as
/// production, with every upload given `verdict`.
pub fn build_test_app_with_scanner(pool: PgPool, verdict: ScanVerdict) -> TestApp {
    build_test_app_with(pool, verdict, |store| {
        Arc::new(store) as Arc<dyn DocumentStore>
    })
}

/// Build the full application router whose document store cannot write the
/// back of a photo ID.
pub fn build_test_app_failing_id_back(pool: PgPool) -> TestApp {
    build_test_app_with(pool, ScanVerdict::Clean, |store| {
        Arc::new(FailingKindStore {
            inner: store,
            failing: DocumentKind::IdBack,
        }) as Arc<dyn DocumentStore>
    })
}

fn build_test_app_with(
    pool: PgPool,
    verdict: ScanVerdict,
    documents: impl FnOnce(LocalDocumentStore) -> Arc<dyn DocumentStore>,
) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let config = test_config(uploads.path().to_path_buf());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        notifier: NotificationDispatcher::new(notifier.clone()),
        documents: documents(LocalDocumentStore::new(uploads.path())),
        scanner: Arc::new(StaticScanner(verdict)),
    };

    TestApp {
        router: build_app_router(state, &config),
        notifier,
        config,
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_auth(app, Method::POST, uri, token, body).await
}

pub async fn put_json_auth(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_auth(app, Method::PUT, uri, token, body).await
}

async fn json_auth(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        builder(method, uri, Some(token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

const BOUNDARY: &str = "tourdesk-test-boundary";

/// Send a multipart form of `(field, filename, bytes)` files.
pub async fn post_multipart_auth(
    app: &TestApp,
    uri: &str,
    token: &str,
    files: &[(&str, &str, &[u8])],
) -> Response<Body> {
    let mut body = Vec::new();
    for (field, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// A birthdate that makes the account `years` old today.
pub fn born_years_ago(years: i32) -> NaiveDate {
    let today = Utc::now().date_naive();
    NaiveDate::from_ymd_opt(today.year() - years, 1, 1).unwrap()
}

pub async fn create_account(
    pool: &PgPool,
    role: Role,
    name: &str,
    birthdate: Option<NaiveDate>,
) -> Account {
    let input = CreateAccount {
        role,
        name: name.to_string(),
        email: format!("{}@test.org", name.to_lowercase().replace(' ', ".")),
        birthdate,
    };
    AccountRepo::create(pool, &input).await.unwrap()
}

/// A guardian with a phone number on file, so the profile gate passes.
pub async fn create_guardian(pool: &PgPool, name: &str) -> Account {
    let account = create_account(pool, Role::Guardian, name, None).await;
    let update = UpdateProfile {
        phone: Some("555-0100".to_string()),
        ..Default::default()
    };
    AccountRepo::update_profile(pool, account.id, &update)
        .await
        .unwrap()
        .unwrap()
}

pub async fn create_minor(pool: &PgPool, name: &str, age: i32) -> Account {
    create_account(pool, Role::Minor, name, Some(born_years_ago(age))).await
}

pub async fn link_approved(pool: &PgPool, guardian: &Account, minor: &Account) {
    LinkRepo::create(
        pool,
        &CreateLink {
            minor_id: Some(minor.id),
            guardian_id: Some(guardian.id),
            minor_email: Some(minor.email.clone()),
            guardian_email: Some(guardian.email.clone()),
            status: LinkStatus::Approved,
            initiated_by: guardian.id,
        },
    )
    .await
    .unwrap();
}

/// Schedule a tour a month from now. `price_cents: None` leaves it unpriced.
pub async fn create_tour(pool: &PgPool, capacity: i32, price_cents: Option<i64>) -> DbId {
    let price_tier_id = match price_cents {
        Some(cents) => Some(
            TourRepo::create_price_tier(pool, &format!("tier-{}", uuid::Uuid::new_v4()), cents)
                .await
                .unwrap()
                .id,
        ),
        None => None,
    };
    let template = TourRepo::create_template(
        pool,
        &CreateTourTemplate {
            title: "Engineering campus tour".into(),
            description: Some("Labs and lecture halls".into()),
            price_tier_id,
        },
    )
    .await
    .unwrap();
    TourRepo::create_instance(
        pool,
        &CreateTourInstance {
            template_id: template.id,
            tour_date: Utc::now().date_naive() + chrono::Days::new(30),
            capacity: Some(capacity),
        },
    )
    .await
    .unwrap()
    .id
}
