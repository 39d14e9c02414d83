//! Integration tests against a stub diet-plan backend.
//!
//! Each test spins up an Axum server on a random port and drives the real
//! `ApiClient` (and the flows built on it) over HTTP.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use dietplan_client::api::{ApiClient, AuthApi, DietPlan, DietPlanApi, PlanRequest, UserApi};
use dietplan_client::auth::{
    LoginAlert, PasswordResetFlow, ResetStep, SessionManager, SessionState, SignupFlow,
    SignupStep,
};
use dietplan_client::config::ClientConfig;
use dietplan_client::connectivity::NetworkStatus;
use dietplan_client::error::{ApiError, FlowError, SessionError, SubmissionError};
use dietplan_client::navigation::{RecordingNavigator, Route, Terminal};
use dietplan_client::profile::{
    BodyStep, CompleteProfile, CuisineStep, GoalStep, ProfileWizard, RestrictionsStep,
    SubmissionOrchestrator, SubmissionPhase, WizardStep,
};
use dietplan_client::store::{MemoryStore, Storage, keys};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

const GOOD_PASSWORD: &str = "Secret1";
const GOOD_CODE: &str = "123456";

#[derive(Debug, Clone)]
struct Call {
    path: String,
    body: Value,
    bearer: Option<String>,
}

/// In-memory backend state shared with the handlers.
#[derive(Default)]
struct Backend {
    calls: Mutex<Vec<Call>>,
    registered: Mutex<HashSet<String>>,
    profiles: Mutex<HashMap<String, Value>>,
    token_expired: AtomicBool,
    fail_plan: AtomicBool,
    plan_delay_ms: AtomicU64,
}

impl Backend {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.calls.lock().unwrap().push(Call { path, body, bearer });
    }

    fn paths(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.path.clone()).collect()
    }

    fn last_call(&self, path: &str) -> Option<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.path == path)
            .cloned()
    }
}

type Reply = (StatusCode, Json<Value>);

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "success": false, "message": message })))
}

fn user_json(email: &str) -> Value {
    json!({ "_id": "u1", "email": email, "firstname": "Ann", "lastname": "Lee", "role": "user" })
}

fn plan_json() -> Value {
    json!({
        "bmi": 22.1,
        "bmi_category": "Normal",
        "calories": 1850,
        "dietPlan": {
            "breakfast": [{ "name": "Oatmeal", "amount": "1 cup", "calories": 300 }],
            "lunch": [{ "name": "Grilled chicken salad", "amount": "1 bowl", "calories": 450 }],
            "dinner": [{ "name": "Pasta primavera", "amount": "1 plate", "calories": 600 }],
            "snacks": [{ "name": "Greek yogurt", "amount": "150g", "calories": 150 }]
        }
    })
}

async fn check_email(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/auth/check-email".into(), &headers, body.clone());
    let email = body["email"].as_str().unwrap_or_default();
    let registered = b.registered.lock().unwrap().contains(email);
    ok(json!({ "isRegistered": registered }))
}

async fn signup(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/auth/signup".into(), &headers, body.clone());
    let email = body["email"].as_str().unwrap_or_default().to_string();
    b.registered.lock().unwrap().insert(email.clone());
    ok(json!({ "success": true, "token": format!("tok-{email}"), "user": user_json(&email) }))
}

async fn login(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/auth/login".into(), &headers, body.clone());
    let email = body["email"].as_str().unwrap_or_default();
    if !b.registered.lock().unwrap().contains(email) {
        return error(StatusCode::BAD_REQUEST, "Invalid credentials");
    }
    if body["password"] != GOOD_PASSWORD {
        return error(StatusCode::BAD_REQUEST, "Invalid password");
    }
    b.token_expired.store(false, Ordering::SeqCst);
    ok(json!({ "success": true, "token": format!("tok-{email}"), "user": user_json(email) }))
}

async fn logout(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/auth/logout".into(), &headers, body);
    ok(json!({ "success": true }))
}

async fn check_auth(State(b): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    b.record("/api/auth/check-auth".into(), &headers, Value::Null);
    let token = b
        .last_call("/api/auth/check-auth")
        .and_then(|c| c.bearer);
    match token {
        Some(token) if !b.token_expired.load(Ordering::SeqCst) => {
            let email = token.trim_start_matches("tok-");
            ok(json!({ "user": user_json(email) }))
        }
        Some(_) => error(StatusCode::UNAUTHORIZED, "Token expired"),
        None => error(StatusCode::UNAUTHORIZED, "Unauthorized - no token provided"),
    }
}

async fn verify_code(path: &'static str, b: Arc<Backend>, headers: HeaderMap, body: Value) -> Reply {
    b.record(path.into(), &headers, body.clone());
    if body["code"] == GOOD_CODE {
        ok(json!({ "success": true, "message": "Verified" }))
    } else {
        error(StatusCode::BAD_REQUEST, "Invalid or expired verification code")
    }
}

async fn send_token(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/auth/send-verification-token-mobile".into(), &headers, body);
    ok(json!({ "success": true, "message": "Verification code sent" }))
}

async fn reset_password(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/auth/reset-password-mobile".into(), &headers, body.clone());
    if body["password"] != body["confirmPassword"] {
        return error(StatusCode::BAD_REQUEST, "Passwords do not match");
    }
    ok(json!({ "success": true, "message": "Password reset successful" }))
}

async fn create_plan(
    State(b): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("/api/dietplan/dietplan".into(), &headers, body);
    let delay = b.plan_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if b.fail_plan.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Plan service down");
    }
    ok(plan_json())
}

async fn set_user_details(
    State(b): State<Arc<Backend>>,
    Path(email): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record(format!("/api/user/set-user-details/{email}"), &headers, body.clone());
    b.profiles.lock().unwrap().insert(email, body);
    ok(json!({ "message": "User details updated successfully" }))
}

async fn get_user_details(
    State(b): State<Arc<Backend>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Reply {
    b.record(format!("/api/user/get-user-details/{email}"), &headers, Value::Null);
    match b.profiles.lock().unwrap().get(&email) {
        Some(profile) => ok(profile.clone()),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

/// Start the stub backend on a random port, return (base url, state).
async fn start_backend() -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route("/api/auth/check-email", post(check_email))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/check-auth", get(check_auth))
        .route(
            "/api/auth/verify-email",
            post(
                |State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>| {
                    verify_code("/api/auth/verify-email", b, headers, body)
                },
            ),
        )
        .route("/api/auth/send-verification-token-mobile", post(send_token))
        .route(
            "/api/auth/verify-email-mobile",
            post(
                |State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>| {
                    verify_code("/api/auth/verify-email-mobile", b, headers, body)
                },
            ),
        )
        .route("/api/auth/reset-password-mobile", post(reset_password))
        .route("/api/dietplan/dietplan", post(create_plan))
        .route("/api/user/set-user-details/{email}", put(set_user_details))
        .route("/api/user/get-user-details/{email}", get(get_user_details))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), backend)
}

fn client_with(base_url: &str, request_timeout: Duration) -> (Arc<ApiClient>, Storage) {
    let storage = Storage::new(Arc::new(MemoryStore::new()));
    let config = ClientConfig {
        api_url: base_url.to_string(),
        request_timeout,
        ..ClientConfig::default()
    };
    let api = ApiClient::new(&config, storage.clone()).unwrap();
    (Arc::new(api), storage)
}

fn client(base_url: &str) -> (Arc<ApiClient>, Storage) {
    client_with(base_url, Duration::from_secs(5))
}

fn session_for(api: &Arc<ApiClient>, storage: &Storage) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        api.clone(),
        storage.clone(),
        Arc::new(NetworkStatus::new(true)),
    ))
}

/// Cross a screen boundary the way navigation would: through route params.
fn hop(wizard: &ProfileWizard) -> ProfileWizard {
    match wizard.route() {
        Route::Wizard { step, params } => ProfileWizard::from_route(step, &params).unwrap(),
        other => panic!("expected a wizard route, got {other:?}"),
    }
}

/// Drive every wizard screen with raw text input.
fn fill_wizard(email: &str) -> CompleteProfile {
    let mut wizard = ProfileWizard::new(email).unwrap();

    let mut body = BodyStep::from_draft(wizard.draft());
    body.set(BodyStep::GENDER, "Male");
    body.set(BodyStep::AGE, "25");
    body.set(BodyStep::WEIGHT, "70");
    body.set(BodyStep::HEIGHT, "175");
    body.set(BodyStep::ACTIVITY, "moderate");
    wizard.apply_body(body.submit().unwrap()).unwrap();
    let mut wizard = hop(&wizard);

    let mut cuisine = CuisineStep::from_draft(wizard.draft());
    cuisine.select("Italian");
    wizard.apply_cuisine(cuisine.submit().unwrap()).unwrap();
    let mut wizard = hop(&wizard);

    let mut restrictions = RestrictionsStep::from_draft(wizard.draft());
    restrictions.toggle("Dairy");
    wizard
        .apply_restrictions(restrictions.submit().unwrap())
        .unwrap();
    let mut wizard = hop(&wizard);

    let mut goal = GoalStep::from_draft(wizard.draft());
    goal.select("Fat Loss");
    wizard.apply_goal(goal.submit().unwrap()).unwrap();
    let wizard = hop(&wizard);

    assert_eq!(wizard.step(), WizardStep::Ready);
    wizard.finish().unwrap()
}

// ── Profile submission ───────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_profile_submission() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        let (api, storage) = client(&base);
        storage.save_auth_token("tok-a@b.com").await;

        let profile = fill_wizard("a@b.com");
        let nav = Arc::new(RecordingNavigator::new());
        let orchestrator =
            SubmissionOrchestrator::new(api.clone(), nav.clone(), Duration::from_millis(10));
        let mut updates = orchestrator.subscribe();

        let report = orchestrator
            .submit(profile, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            backend.paths(),
            vec!["/api/dietplan/dietplan", "/api/user/set-user-details/a@b.com"]
        );
        assert_eq!(orchestrator.phase().await, SubmissionPhase::Complete);
        assert_eq!(report.email, "a@b.com");
        assert_eq!(
            nav.history(),
            vec![Route::Terminal(Terminal::Success {
                email: "a@b.com".into()
            })]
        );

        let plan_call = backend.last_call("/api/dietplan/dietplan").unwrap();
        assert_eq!(plan_call.bearer.as_deref(), Some("tok-a@b.com"));
        let request: PlanRequest = serde_json::from_value(plan_call.body).unwrap();
        assert_eq!(request.age, 25);
        assert_eq!(request.weight, 70.0);
        assert_eq!(request.height, 175.0);
        assert_eq!(request.activity_factor, 1.7);
        assert_eq!(request.cuisine, "Italian");
        assert_eq!(request.restrictions, vec!["Dairy".to_string()]);

        let phases: Vec<SubmissionPhase> = std::iter::from_fn(|| updates.try_recv().ok())
            .map(|u| u.phase)
            .collect();
        assert_eq!(
            phases,
            vec![
                SubmissionPhase::CreatingPlan,
                SubmissionPhase::PersistingProfile,
                SubmissionPhase::Complete
            ]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn plan_output_is_threaded_into_profile_persistence() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        let (api, _storage) = client(&base);
        let nav = Arc::new(RecordingNavigator::new());
        let orchestrator = SubmissionOrchestrator::new(api.clone(), nav, Duration::ZERO);

        orchestrator
            .submit(fill_wizard("a@b.com"), &CancellationToken::new())
            .await
            .unwrap();

        let saved = backend
            .last_call("/api/user/set-user-details/a@b.com")
            .unwrap()
            .body;
        let expected = plan_json();
        assert_eq!(saved["bmi"], expected["bmi"]);
        assert_eq!(saved["bmi_category"], expected["bmi_category"]);
        assert_eq!(saved["email"], "a@b.com");
        assert_eq!(saved["goal"], "Fat Loss");

        let saved_plan: DietPlan = serde_json::from_value(saved["dietPlan"].clone()).unwrap();
        let expected_plan: DietPlan =
            serde_json::from_value(expected["dietPlan"].clone()).unwrap();
        assert_eq!(saved_plan, expected_plan);

        // the stored record reads back through the typed endpoint
        let record = api.get_user_details("a@b.com").await.unwrap();
        assert_eq!(record.bmi, 22.1);
        assert_eq!(record.diet_plan, expected_plan);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn plan_failure_routes_to_failure_screen() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.fail_plan.store(true, Ordering::SeqCst);
        let (api, _storage) = client(&base);
        let nav = Arc::new(RecordingNavigator::new());
        let orchestrator = SubmissionOrchestrator::new(api, nav.clone(), Duration::ZERO);

        let err = orchestrator
            .submit(fill_wizard("a@b.com"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            SubmissionError::CreatePlan(ApiError::Rejected { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Plan service down");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(backend.paths(), vec!["/api/dietplan/dietplan"]);
        assert_eq!(orchestrator.phase().await, SubmissionPhase::Failed);
        assert!(matches!(
            nav.last(),
            Some(Route::Terminal(Terminal::Failure { ref email, .. })) if email == "a@b.com"
        ));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn cancelling_mid_flight_skips_persistence() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.plan_delay_ms.store(2_000, Ordering::SeqCst);
        let (api, _storage) = client(&base);
        let nav = Arc::new(RecordingNavigator::new());
        let orchestrator = SubmissionOrchestrator::new(api, nav.clone(), Duration::ZERO);

        let token = CancellationToken::new();
        let screen_closed = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            screen_closed.cancel();
        });

        let err = orchestrator
            .submit(fill_wizard("a@b.com"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Cancelled));
        assert!(nav.history().is_empty());
        assert_eq!(backend.paths(), vec!["/api/dietplan/dietplan"]);
    })
    .await
    .expect("test timed out");
}

// ── Transport and session errors ─────────────────────────────────────

#[tokio::test]
async fn slow_backend_maps_to_timeout() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.plan_delay_ms.store(1_000, Ordering::SeqCst);
        let (api, _storage) = client_with(&base, Duration::from_millis(200));

        let request = PlanRequest::from(&fill_wizard("a@b.com"));
        let err = api.create_plan(&request).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout { .. }));
        assert_eq!(err.status(), Some(408));
        assert!(err.is_transport());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_backend_maps_to_network_error() {
    timeout(TEST_TIMEOUT, async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (api, _storage) = client(&format!("http://127.0.0.1:{port}"));
        let err = api.check_email("a@b.com").await.unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }));
        assert_eq!(
            LoginAlert::classify(&err),
            LoginAlert::Connection
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unauthorized_response_wipes_local_session() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.token_expired.store(true, Ordering::SeqCst);
        let (api, storage) = client(&base);
        storage.save_auth_token("tok-a@b.com").await;
        storage.save_remember_me(true).await;
        storage.set_has_seen_onboarding(true).await;

        let err = api.check_auth().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired { ref message } if message == "Token expired"));

        assert!(storage.auth_token().await.is_none());
        assert!(!storage.remember_me().await);
        assert!(storage.force_logout().await);
        assert!(storage.has_seen_onboarding().await);
    })
    .await
    .expect("test timed out");
}

// ── Login and restore ────────────────────────────────────────────────

#[tokio::test]
async fn login_errors_are_classified() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.registered.lock().unwrap().insert("a@b.com".into());
        let (api, storage) = client(&base);
        let session = session_for(&api, &storage);

        let err = session
            .login("nobody@b.com", SecretString::from(GOOD_PASSWORD), "user", false)
            .await
            .unwrap_err();
        assert_eq!(LoginAlert::from_session_error(&err), LoginAlert::EmailNotFound);

        let err = session
            .login("a@b.com", SecretString::from("Wrong12"), "user", false)
            .await
            .unwrap_err();
        let alert = LoginAlert::from_session_error(&err);
        assert_eq!(alert, LoginAlert::IncorrectPassword);
        assert_eq!(alert.field(), Some("password"));
        assert_eq!(session.state().await, SessionState::Unknown);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn remembered_login_is_restored_on_next_start() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.registered.lock().unwrap().insert("a@b.com".into());
        let (api, storage) = client(&base);

        let session = session_for(&api, &storage);
        session
            .login("a@b.com", SecretString::from(GOOD_PASSWORD), "user", true)
            .await
            .unwrap();
        let sent = backend.last_call("/api/auth/login").unwrap();
        assert_eq!(sent.body["password"], GOOD_PASSWORD);
        assert_eq!(sent.body["role"], "user");

        // next start
        let restarted = session_for(&api, &storage);
        assert_eq!(restarted.restore().await, SessionState::Authenticated);
        assert_eq!(restarted.user().await.unwrap().email, "a@b.com");
        let check = backend.last_call("/api/auth/check-auth").unwrap();
        assert_eq!(check.bearer.as_deref(), Some("tok-a@b.com"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn expired_token_falls_back_to_saved_credentials() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.registered.lock().unwrap().insert("a@b.com".into());
        let (api, storage) = client(&base);
        session_for(&api, &storage)
            .login("a@b.com", SecretString::from(GOOD_PASSWORD), "user", true)
            .await
            .unwrap();

        backend.token_expired.store(true, Ordering::SeqCst);
        let restarted = session_for(&api, &storage);
        assert_eq!(restarted.restore().await, SessionState::Authenticated);

        let paths = backend.paths();
        assert_eq!(
            &paths[paths.len() - 2..],
            &["/api/auth/check-auth", "/api/auth/login"]
        );
        assert!(!storage.force_logout().await);
        assert_eq!(storage.auth_token().await.as_deref(), Some("tok-a@b.com"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn logout_without_remember_me_forgets_the_user() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.registered.lock().unwrap().insert("a@b.com".into());
        let (api, storage) = client(&base);
        let session = session_for(&api, &storage);
        session
            .login("a@b.com", SecretString::from(GOOD_PASSWORD), "user", false)
            .await
            .unwrap();

        session.logout().await;
        assert!(!session.is_authenticated().await);
        assert!(storage.auth_token().await.is_none());

        let restarted = session_for(&api, &storage);
        assert_eq!(restarted.restore().await, SessionState::Anonymous);
    })
    .await
    .expect("test timed out");
}

// ── Signup and password reset ────────────────────────────────────────

#[tokio::test]
async fn signup_flow_ends_at_profile_wizard() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        let (api, storage) = client(&base);
        let session = session_for(&api, &storage);
        let mut flow = SignupFlow::new(api.clone(), session.clone(), 6);

        flow.set(SignupFlow::EMAIL, "new@b.com");
        assert_eq!(
            flow.next().await.unwrap(),
            Route::SignupDetails {
                email: "new@b.com".into()
            }
        );

        flow.set(SignupFlow::FIRSTNAME, "Ann");
        flow.set(SignupFlow::LASTNAME, "Lee");
        flow.set(SignupFlow::PASSWORD, "Secret1");
        flow.set(SignupFlow::CONFIRM, "Secret2");
        let err = flow.next().await.unwrap_err();
        match err {
            FlowError::Invalid(rejection) => assert_eq!(
                rejection.error_for(SignupFlow::CONFIRM),
                Some("Passwords do not match")
            ),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(flow.step(), SignupStep::Details);

        flow.set(SignupFlow::CONFIRM, "Secret1");
        assert_eq!(
            flow.next().await.unwrap(),
            Route::VerifyEmail {
                email: "new@b.com".into()
            }
        );
        assert!(session.is_authenticated().await);

        flow.set(SignupFlow::CODE, "000000");
        assert!(matches!(
            flow.next().await,
            Err(FlowError::Api(ApiError::Rejected { status: 400, .. }))
        ));

        flow.set(SignupFlow::CODE, GOOD_CODE);
        match flow.next().await.unwrap() {
            Route::Wizard { step, params } => {
                assert_eq!(step, WizardStep::Body);
                assert_eq!(params.get("email"), Some("new@b.com"));
            }
            other => panic!("unexpected route {other:?}"),
        }
        assert_eq!(flow.step(), SignupStep::Done);
        assert_eq!(
            backend.paths(),
            vec![
                "/api/auth/check-email",
                "/api/auth/signup",
                "/api/auth/verify-email",
                "/api/auth/verify-email"
            ]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn signup_blocks_registered_email() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        backend.registered.lock().unwrap().insert("a@b.com".into());
        let (api, storage) = client(&base);
        let mut flow = SignupFlow::new(api.clone(), session_for(&api, &storage), 6);

        flow.set(SignupFlow::EMAIL, "a@b.com");
        assert!(matches!(
            flow.next().await,
            Err(FlowError::AlreadyRegistered(ref email)) if email == "a@b.com"
        ));
        assert_eq!(flow.step(), SignupStep::Email);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn signup_refused_while_offline() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        let (api, storage) = client(&base);
        let offline = Arc::new(SessionManager::new(
            api.clone(),
            storage.clone(),
            Arc::new(NetworkStatus::new(false)),
        ));
        let mut flow = SignupFlow::new(api.clone(), offline, 6);

        flow.set(SignupFlow::EMAIL, "new@b.com");
        flow.next().await.unwrap();
        flow.set(SignupFlow::FIRSTNAME, "Ann");
        flow.set(SignupFlow::LASTNAME, "Lee");
        flow.set(SignupFlow::PASSWORD, "Secret1");
        flow.set(SignupFlow::CONFIRM, "Secret1");
        assert!(matches!(
            flow.next().await,
            Err(FlowError::Session(SessionError::Offline))
        ));
        assert!(!backend.paths().contains(&"/api/auth/signup".to_string()));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn password_reset_flow() {
    timeout(TEST_TIMEOUT, async {
        let (base, backend) = start_backend().await;
        let (api, storage) = client(&base);
        let mut flow = PasswordResetFlow::new(api.clone(), storage.clone(), 6);

        flow.set(PasswordResetFlow::EMAIL, "not-an-email");
        assert!(matches!(flow.next().await, Err(FlowError::Invalid(_))));
        assert!(backend.paths().is_empty());

        flow.set(PasswordResetFlow::EMAIL, "a@b.com");
        assert_eq!(
            flow.next().await.unwrap(),
            Route::ResetVerify {
                email: "a@b.com".into()
            }
        );
        assert_eq!(storage.get(keys::RESET_EMAIL).await.as_deref(), Some("a@b.com"));

        // cooldown just started
        match flow.resend().await {
            Err(FlowError::Rejected(message)) => {
                assert!(message.starts_with("You can request a new code in"))
            }
            other => panic!("unexpected resend result {other:?}"),
        }

        // an interrupted reset resumes at code entry
        let resumed = PasswordResetFlow::resume(api.clone(), storage.clone(), 6).await;
        assert_eq!(resumed.step(), ResetStep::Code);
        assert_eq!(resumed.email(), Some("a@b.com"));

        flow.set(PasswordResetFlow::CODE, "12-34-56");
        assert_eq!(
            flow.next().await.unwrap(),
            Route::ResetNewPassword {
                email: "a@b.com".into()
            }
        );
        assert_eq!(
            storage.get(keys::VERIFICATION_CODE).await.as_deref(),
            Some(GOOD_CODE)
        );

        flow.set(PasswordResetFlow::PASSWORD, "Newpass1");
        flow.set(PasswordResetFlow::CONFIRM, "Newpass1");
        assert_eq!(flow.next().await.unwrap(), Route::Login);
        assert_eq!(flow.step(), ResetStep::Done);

        let reset = backend.last_call("/api/auth/reset-password-mobile").unwrap();
        assert_eq!(reset.body["email"], "a@b.com");
        assert_eq!(reset.body["confirmPassword"], "Newpass1");
        assert!(storage.get(keys::RESET_EMAIL).await.is_none());
        assert!(storage.get(keys::VERIFICATION_CODE).await.is_none());
        assert!(storage.has_seen_onboarding().await);
    })
    .await
    .expect("test timed out");
}
