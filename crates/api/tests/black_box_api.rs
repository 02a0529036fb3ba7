use std::sync::{Arc, Mutex};

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use atrium_api::app::services::AppServices;
use atrium_api::notify::Notifier;
use atrium_auth::Claims;
use atrium_core::{TokenId, UserId};
use atrium_store::{InMemoryStore, Store};

/// Captures outbound notifications so tests can read recovery and
/// verification codes the way a mail inbox would.
#[derive(Default)]
struct RecordingNotifier {
    recovery: Mutex<Vec<(String, TokenId)>>,
    verification: Mutex<Vec<(String, TokenId)>>,
    credentials: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn last_recovery_code(&self, email: &str) -> Option<TokenId> {
        self.recovery
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, code)| *code)
    }

    fn last_verification_code(&self, email: &str) -> Option<TokenId> {
        self.verification
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, code)| *code)
    }

    fn verification_count(&self) -> usize {
        self.verification.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn password_recovery(&self, email: &str, code: TokenId) {
        self.recovery.lock().unwrap().push((email.to_string(), code));
    }

    fn email_verification(&self, email: &str, code: TokenId) {
        self.verification
            .lock()
            .unwrap()
            .push((email.to_string(), code));
    }

    fn credentials_issued(&self, email: &str) {
        self.credentials.lock().unwrap().push(email.to_string());
    }

    fn credentials_updated(&self, email: &str) {
        self.credentials.lock().unwrap().push(email.to_string());
    }
}

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    notifier: Arc<RecordingNotifier>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, but in-memory store + ephemeral port.
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let services = Arc::new(AppServices::with_notifier(
            store.clone(),
            jwt_secret,
            notifier.clone(),
        ));
        let app = atrium_api::app::router(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            notifier,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register_saas(client: &reqwest::Client, base_url: &str, name: &str, email: &str) {
    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "slug": "", "name": name, "email": email, "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn authenticate(
    client: &reqwest::Client,
    base_url: &str,
    scope: &str,
    slug: &str,
    email: &str,
    password: &str,
) -> String {
    let res = client
        .post(format!("{}{}/auth/sessions/password", base_url, scope))
        .json(&json!({ "slug": slug, "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Register an owner, create their workspace, return the owner's token.
/// The workspace slug is derived from the name ("Happy Paws" => "happy-paws").
async fn owner_with_workspace(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    workspace_name: &str,
) -> String {
    register_saas(client, base_url, "Owner", email).await;
    let token = authenticate(client, base_url, "", "", email, "secret1").await;

    let res = client
        .post(format!("{}/workspaces", base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": workspace_name }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["workspaceId"].as_str().is_some());

    token
}

/// Register an ERP member into an existing workspace and sign them in.
async fn erp_member(
    client: &reqwest::Client,
    base_url: &str,
    slug: &str,
    email: &str,
) -> String {
    let res = client
        .post(format!("{}/erp/auth/register", base_url))
        .json(&json!({ "slug": slug, "name": "Member", "email": email, "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    authenticate(client, base_url, "/erp", slug, email, "secret1").await
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    for path in ["/auth/profile", "/erp/auth/profile", "/portal/auth/profile"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {path}");
    }
}

#[tokio::test]
async fn token_minted_with_wrong_secret_is_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let now = Utc::now();
    let claims = Claims {
        sub: UserId::new(),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::days(1)).timestamp(),
    };
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"other-secret"),
    )
    .unwrap();

    let res = client
        .get(format!("{}/auth/profile", srv.base_url))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_then_authenticate_then_profile() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_saas(&client, &srv.base_url, "Ada", "ada@example.com").await;
    let token = authenticate(&client, &srv.base_url, "", "", "ada@example.com", "secret1").await;

    let res = client
        .get(format!("{}/auth/profile", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["name"], "Ada");
    assert_eq!(body["user"]["systemType"], "SAAS");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_saas(&client, &srv.base_url, "Ada", "ada@example.com").await;

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({ "slug": "", "name": "Ada 2", "email": "ada@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "User with same email already exists.");
}

#[tokio::test]
async fn login_failures_do_not_disclose_which_field_was_wrong() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_saas(&client, &srv.base_url, "Ada", "ada@example.com").await;

    let wrong_password = client
        .post(format!("{}/auth/sessions/password", srv.base_url))
        .json(&json!({ "slug": "", "email": "ada@example.com", "password": "not-it-1" }))
        .send()
        .await
        .unwrap();
    let no_such_user = client
        .post(format!("{}/auth/sessions/password", srv.base_url))
        .json(&json!({ "slug": "", "email": "nobody@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(no_such_user.status(), StatusCode::BAD_REQUEST);

    let a: serde_json::Value = wrong_password.json().await.unwrap();
    let b: serde_json::Value = no_such_user.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn one_workspace_per_owner() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let token = owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    let res = client
        .post(format!("{}/workspaces", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Second Shop" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "This user already has a workspace");
}

#[tokio::test]
async fn workspace_rename_and_billing() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let token = owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    let res = client
        .put(format!("{}/workspaces/happy-paws", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Happier Paws" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Rename keeps the slug, so billing stays addressable.
    let res = client
        .get(format!("{}/workspaces/happy-paws/billing", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["billing"]["employees"], 0);
    assert_eq!(body["billing"]["customers"], 0);
}

#[tokio::test]
async fn employee_lifecycle_create_list_update() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let token = owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    // Create
    let res = client
        .post(format!("{}/workspaces/happy-paws/employees", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Grace",
            "email": "grace@example.com",
            "phone": "555-0101",
            "address": { "street": "Main St", "number": "1", "city": "Springfield" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let employee_id = created["employeeId"].as_str().unwrap().to_string();

    // Same email again conflicts.
    let res = client
        .post(format!("{}/workspaces/happy-paws/employees", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Grace Again", "email": "grace@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email already exists.");

    // Update (new name + new email).
    let res = client
        .put(format!(
            "{}/workspaces/happy-paws/employees/{}",
            srv.base_url, employee_id
        ))
        .bearer_auth(&token)
        .json(&json!({ "name": "Grace H.", "email": "grace.h@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // List reflects the update.
    let res = client
        .get(format!("{}/workspaces/happy-paws/employees", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let employees = body["employees"].as_array().unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0]["id"].as_str().unwrap(), employee_id);
    assert_eq!(employees[0]["name"], "Grace H.");

    // Billing counts the employee.
    let res = client
        .get(format!("{}/workspaces/happy-paws/billing", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["billing"]["employees"], 1);
}

#[tokio::test]
async fn employee_update_cannot_steal_anothers_email() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let token = owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    for (name, email) in [("Grace", "grace@example.com"), ("Mary", "mary@example.com")] {
        let res = client
            .post(format!("{}/workspaces/happy-paws/employees", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "name": name, "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/workspaces/happy-paws/employees", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    // Newest first.
    let mary_id = body["employees"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["employees"][0]["name"], "Mary");

    let res = client
        .put(format!(
            "{}/workspaces/happy-paws/employees/{}",
            srv.base_url, mary_id
        ))
        .bearer_auth(&token)
        .json(&json!({ "name": "Mary", "email": "grace@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email already exists.");
}

#[tokio::test]
async fn deactivated_workspace_blocks_erp_but_not_saas_admin() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let owner_token = owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    // ERP self-registration into the workspace.
    let res = client
        .post(format!("{}/erp/auth/register", srv.base_url))
        .json(&json!({ "slug": "happy-paws", "name": "Vet", "email": "vet@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let erp_token = authenticate(
        &client,
        &srv.base_url,
        "/erp",
        "happy-paws",
        "vet@example.com",
        "secret1",
    )
    .await;

    // Works while active.
    let res = client
        .get(format!("{}/erp/workspaces/happy-paws/employees", srv.base_url))
        .bearer_auth(&erp_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let workspace = srv
        .store
        .workspace_by_slug("happy-paws")
        .await
        .unwrap()
        .unwrap();
    srv.store
        .set_workspace_active(workspace.id, false)
        .await
        .unwrap();

    // ERP access is now gated even with a valid token.
    let res = client
        .get(format!("{}/erp/workspaces/happy-paws/employees", srv.base_url))
        .bearer_auth(&erp_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Workspace is deactivated");

    // The owner can still reach SaaS administration to manage it.
    let res = client
        .put(format!("{}/workspaces/happy-paws", srv.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "name": "Happy Paws" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn second_recovery_request_invalidates_the_first_code() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_saas(&client, &srv.base_url, "Ada", "ada@example.com").await;

    let recover = || async {
        let res = client
            .post(format!("{}/auth/password/recover", srv.base_url))
            .json(&json!({ "slug": "", "email": "ada@example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    };

    recover().await;
    let first = srv
        .notifier
        .last_recovery_code("ada@example.com")
        .expect("first code delivered");

    recover().await;
    let second = srv
        .notifier
        .last_recovery_code("ada@example.com")
        .expect("second code delivered");
    assert_ne!(first, second);

    // The rotated-out code is dead.
    let res = client
        .post(format!("{}/auth/password/reset", srv.base_url))
        .json(&json!({ "code": first.to_string(), "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The live code resets the password.
    let res = client
        .post(format!("{}/auth/password/reset", srv.base_url))
        .json(&json!({ "code": second.to_string(), "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    authenticate(&client, &srv.base_url, "", "", "ada@example.com", "newpass1").await;
}

#[tokio::test]
async fn recovery_request_for_unknown_email_succeeds_silently() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/password/recover", srv.base_url))
        .json(&json!({ "slug": "", "email": "ghost@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(srv.notifier.last_recovery_code("ghost@example.com").is_none());
}

#[tokio::test]
async fn email_verification_confirms_once_then_goes_quiet() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    let res = client
        .post(format!("{}/erp/auth/register", srv.base_url))
        .json(&json!({ "slug": "happy-paws", "name": "Vet", "email": "vet@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let verify = || async {
        let res = client
            .post(format!(
                "{}/erp/auth/sessions/password/verify",
                srv.base_url
            ))
            .json(&json!({ "slug": "happy-paws", "email": "vet@example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    };

    verify().await;
    let code = srv
        .notifier
        .last_verification_code("vet@example.com")
        .expect("verification code delivered");

    let res = client
        .post(format!("{}/erp/auth/email/confirm", srv.base_url))
        .json(&json!({ "code": code.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Spent codes are rejected.
    let res = client
        .post(format!("{}/erp/auth/email/confirm", srv.base_url))
        .json(&json!({ "code": code.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Already verified: still 201, but nothing new goes out.
    let sent_before = srv.notifier.verification_count();
    verify().await;
    assert_eq!(srv.notifier.verification_count(), sent_before);
}

#[tokio::test]
async fn onboarded_customer_sets_first_password_and_logs_into_portal() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;
    let erp_token = erp_member(&client, &srv.base_url, "happy-paws", "vet@example.com").await;

    // ERP onboarding creates the customer's portal user without a password.
    let res = client
        .post(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&erp_token)
        .json(&json!({ "name": "Carol", "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // No password yet, so password login points at social/onboarding.
    let res = client
        .post(format!("{}/portal/auth/sessions/password", srv.base_url))
        .json(&json!({ "slug": "happy-paws", "email": "carol@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "User does not have a password, use social login."
    );

    // First password.
    let res = client
        .post(format!("{}/portal/auth/password", srv.base_url))
        .json(&json!({ "slug": "happy-paws", "email": "carol@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Second attempt is refused.
    let res = client
        .post(format!("{}/portal/auth/password", srv.base_url))
        .json(&json!({ "slug": "happy-paws", "email": "carol@example.com", "password": "other-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let token = authenticate(
        &client,
        &srv.base_url,
        "/portal",
        "happy-paws",
        "carol@example.com",
        "secret1",
    )
    .await;

    let res = client
        .get(format!("{}/portal/auth/profile", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "carol@example.com");
    assert_eq!(body["user"]["systemType"], "PORTAL");
}

#[tokio::test]
async fn customer_lifecycle_create_list_update() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    owner_with_workspace(&client, &srv.base_url, "owner@example.com", "Happy Paws").await;
    let erp_token = erp_member(&client, &srv.base_url, "happy-paws", "vet@example.com").await;

    // Create
    let res = client
        .post(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&erp_token)
        .json(&json!({
            "name": "Carol",
            "email": "carol@example.com",
            "phone": "555-0102",
            "address": { "street": "Elm St", "number": "7", "city": "Springfield" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let customer_id = created["customerId"].as_str().unwrap().to_string();

    // Same email again conflicts.
    let res = client
        .post(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&erp_token)
        .json(&json!({ "name": "Carol Again", "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email already exists.");

    // Update (new name + new email).
    let res = client
        .put(format!(
            "{}/erp/workspaces/happy-paws/customers/{}",
            srv.base_url, customer_id
        ))
        .bearer_auth(&erp_token)
        .json(&json!({ "name": "Carol B.", "email": "carol.b@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // List reflects the update.
    let res = client
        .get(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&erp_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let customers = body["customers"].as_array().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["id"].as_str().unwrap(), customer_id);
    assert_eq!(customers[0]["name"], "Carol B.");
}

#[tokio::test]
async fn customer_update_cannot_steal_anothers_email() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    owner_with_workspace(&client, &srv.base_url, "owner@example.com", "Happy Paws").await;
    let erp_token = erp_member(&client, &srv.base_url, "happy-paws", "vet@example.com").await;

    for (name, email) in [("Carol", "carol@example.com"), ("Dana", "dana@example.com")] {
        let res = client
            .post(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
            .bearer_auth(&erp_token)
            .json(&json!({ "name": name, "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&erp_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    // Newest first.
    let dana_id = body["customers"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["customers"][0]["name"], "Dana");

    let res = client
        .put(format!(
            "{}/erp/workspaces/happy-paws/customers/{}",
            srv.base_url, dana_id
        ))
        .bearer_auth(&erp_token)
        .json(&json!({ "name": "Dana", "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email already exists.");
}

#[tokio::test]
async fn saas_scope_edits_customers_but_does_not_onboard_them() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let owner_token =
        owner_with_workspace(&client, &srv.base_url, "owner@example.com", "Happy Paws").await;
    let erp_token = erp_member(&client, &srv.base_url, "happy-paws", "vet@example.com").await;

    // Onboarding and the directory live in the ERP, not the SaaS console.
    let res = client
        .post(format!("{}/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "name": "Carol", "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Editing an existing customer from the SaaS console still works.
    let res = client
        .post(format!("{}/erp/workspaces/happy-paws/customers", srv.base_url))
        .bearer_auth(&erp_token)
        .json(&json!({ "name": "Carol", "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let customer_id = created["customerId"].as_str().unwrap().to_string();

    let res = client
        .put(format!(
            "{}/workspaces/happy-paws/customers/{}",
            srv.base_url, customer_id
        ))
        .bearer_auth(&owner_token)
        .json(&json!({ "name": "Caroline", "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn scopes_partition_accounts_by_system_type() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    owner_with_workspace(
        &client,
        &srv.base_url,
        "owner@example.com",
        "Happy Paws",
    )
    .await;

    // The same email can exist once per system type inside the workspace.
    for scope in ["/erp", "/portal"] {
        let res = client
            .post(format!("{}{}/auth/register", srv.base_url, scope))
            .json(&json!({ "slug": "happy-paws", "name": "Sam", "email": "sam@example.com", "password": "secret1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED, "scope {scope}");
    }

    // An ERP token does not grant a portal profile.
    let erp_token = authenticate(
        &client,
        &srv.base_url,
        "/erp",
        "happy-paws",
        "sam@example.com",
        "secret1",
    )
    .await;
    let res = client
        .get(format!("{}/portal/auth/profile", srv.base_url))
        .bearer_auth(&erp_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
