//! Shared fixture: the access router mounted next to a small check ledger
//! whose routes use the access layer the way back-office handlers do.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use access::application::{AccessConfig, NewAuditEntry};
use access::domain::entity::{AuditEntry, User};
use access::{
    AccessAppState, AccessError, AccessResult, MemoryAccessRepository, Permission, Principal,
    RequestContext, Requirement, Role, STEP_UP_HEADER, SensitiveAction, access_router,
};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use platform::clock::ManualClock;
use platform::password::ClearTextPassword;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const PASSWORD: &str = "Correct-Horse-42";

/// Hashing is the slow part of every fixture; do it once per test binary.
fn digest() -> &'static str {
    static DIGEST: OnceLock<String> = OnceLock::new();
    DIGEST.get_or_init(|| {
        ClearTextPassword::new(PASSWORD.to_string())
            .unwrap()
            .hash(None)
            .unwrap()
            .as_phc_string()
            .to_string()
    })
}

#[derive(Clone)]
struct Backoffice {
    access: AccessAppState<MemoryAccessRepository>,
    checks: Arc<Mutex<HashMap<String, String>>>,
}

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub repo: MemoryAccessRepository,
    pub state: AccessAppState<MemoryAccessRepository>,
    checks: Arc<Mutex<HashMap<String, String>>>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let repo = MemoryAccessRepository::new();
        let state = AccessAppState::with_clock(
            Arc::new(repo.clone()),
            Arc::new(AccessConfig::with_random_secret()),
            Arc::new(clock.clone()),
        );
        let checks = Arc::new(Mutex::new(HashMap::from([
            ("chk-1001".to_string(), "PENDING".to_string()),
            ("chk-1002".to_string(), "PENDING".to_string()),
        ])));

        let backoffice = Router::new()
            .route("/api/checks", post(create_check))
            .route("/api/checks/{id}/void", post(void_check))
            .route("/api/banks/{id}/credentials", put(edit_bank_credentials))
            .route("/api/audit", get(read_audit))
            .route("/api/users", get(list_users))
            .with_state(Backoffice {
                access: state.clone(),
                checks: checks.clone(),
            });

        let router = Router::new()
            .nest("/api/auth", access_router(state.clone()))
            .merge(backoffice);

        Self {
            router,
            clock,
            repo,
            state,
            checks,
        }
    }

    pub async fn add_user(&self, name: &str, role: Role) -> Principal {
        let user = User::new(name, role, None, digest());
        let principal = user.principal();
        self.repo.insert_user(user).await;
        principal
    }

    /// Session token minted directly, skipping the login round trip.
    pub fn session_for(&self, principal: &Principal) -> String {
        self.state.tokens.issue_session(principal).unwrap().token
    }

    pub async fn check_status(&self, id: &str) -> Option<String> {
        self.checks.lock().await.get(id).cloned()
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.repo.audit_entries().await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, body }
    }

    pub async fn verify_password(&self, session: &str, password: &str) -> TestResponse {
        self.send(
            RequestBuilder::post("/api/auth/verify-password")
                .session(session)
                .json(json!({ "password": password })),
        )
        .await
    }

    pub async fn void(&self, id: &str, session: &str, step_up: Option<&str>) -> TestResponse {
        let mut builder = RequestBuilder::post(&format!("/api/checks/{id}/void")).session(session);
        if let Some(step_up) = step_up {
            builder = builder.step_up(step_up);
        }
        self.send(builder.empty()).await
    }
}

/// Thin wrapper over `http::request::Builder` for the headers these tests use.
pub struct RequestBuilder {
    inner: axum::http::request::Builder,
}

impl RequestBuilder {
    pub fn get(uri: &str) -> Self {
        Self {
            inner: Request::builder().method("GET").uri(uri),
        }
    }

    pub fn post(uri: &str) -> Self {
        Self {
            inner: Request::builder().method("POST").uri(uri),
        }
    }

    pub fn put(uri: &str) -> Self {
        Self {
            inner: Request::builder().method("PUT").uri(uri),
        }
    }

    pub fn session(self, token: &str) -> Self {
        Self {
            inner: self
                .inner
                .header(header::AUTHORIZATION, format!("Bearer {token}")),
        }
    }

    pub fn step_up(self, token: &str) -> Self {
        Self {
            inner: self.inner.header(STEP_UP_HEADER, token),
        }
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        Self {
            inner: self.inner.header(name, value),
        }
    }

    pub fn json(self, body: Value) -> Request<Body> {
        self.inner
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn empty(self) -> Request<Body> {
        self.inner.body(Body::empty()).unwrap()
    }
}

// ============================================================================
// Back-office handlers
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCheckRequest {
    amount_cents: i64,
}

async fn create_check(
    State(app): State<Backoffice>,
    context: RequestContext,
    headers: HeaderMap,
    Json(req): Json<CreateCheckRequest>,
) -> AccessResult<(StatusCode, Json<Value>)> {
    let principal = app
        .access
        .authorize(&headers, Requirement::Permission(Permission::CreateChecks), &context)
        .await?;
    app.access
        .guard_operation(&principal, &headers, None, Some(req.amount_cents), &context)
        .await?;

    let id = format!("chk-{}", app.checks.lock().await.len() + 1001);
    app.checks.lock().await.insert(id.clone(), "PENDING".into());
    app.access
        .record_audit(
            NewAuditEntry::new(principal.id, "check.create", "check", id.clone())
                .with_change(None, Some(json!({ "amountCents": req.amount_cents })))
                .with_context(&context),
        )
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn void_check(
    State(app): State<Backoffice>,
    Path(id): Path<String>,
    context: RequestContext,
    headers: HeaderMap,
) -> AccessResult<Json<Value>> {
    let principal = app
        .access
        .authorize(&headers, Requirement::Permission(Permission::VoidChecks), &context)
        .await?;
    app.access
        .require_step_up(&principal, &headers, SensitiveAction::VoidCheck, &context)
        .await?;

    let old_status = {
        let mut checks = app.checks.lock().await;
        let status = checks
            .get_mut(&id)
            .ok_or_else(|| AccessError::InvalidRequest(format!("unknown check {id}")))?;
        std::mem::replace(status, "VOIDED".to_string())
    };

    app.access
        .record_audit(
            NewAuditEntry::new(principal.id, "check.void", "check", id.clone())
                .with_change(
                    Some(json!({ "status": old_status })),
                    Some(json!({ "status": "VOIDED" })),
                )
                .with_context(&context),
        )
        .await;

    Ok(Json(json!({ "id": id, "status": "VOIDED" })))
}

async fn edit_bank_credentials(
    State(app): State<Backoffice>,
    Path(id): Path<String>,
    context: RequestContext,
    headers: HeaderMap,
) -> AccessResult<StatusCode> {
    let principal = app
        .access
        .authorize(
            &headers,
            Requirement::Permission(Permission::EditBankCredentials),
            &context,
        )
        .await?;
    app.access
        .require_step_up(&principal, &headers, SensitiveAction::EditBankCredentials, &context)
        .await?;

    app.access
        .record_audit(
            NewAuditEntry::new(principal.id, "bank.credentials.update", "bank", id)
                .with_context(&context),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn read_audit(
    State(app): State<Backoffice>,
    context: RequestContext,
    headers: HeaderMap,
) -> AccessResult<Json<Value>> {
    app.access
        .authorize(&headers, Requirement::MinimumRole(Role::Manager), &context)
        .await?;
    let count = app.access.repo.audit_entries().await.len();
    Ok(Json(json!({ "entries": count })))
}

async fn list_users(
    State(app): State<Backoffice>,
    context: RequestContext,
    headers: HeaderMap,
) -> AccessResult<Json<Value>> {
    app.access
        .authorize(&headers, Requirement::Role(Role::Admin), &context)
        .await?;
    Ok(Json(json!({ "users": [] })))
}

pub fn now(app: &TestApp) -> DateTime<Utc> {
    use platform::clock::Clock;
    app.clock.now()
}
