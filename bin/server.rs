// Bank Management API - Web Server
// Thin REST transport over the domain operations: extract, verify the
// caller, call into the library, map the typed error to a status code.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use bank_management::{
    coerce_amount, create_account, credit_interest, deposit, ensure_seed_accounts, list_accounts,
    open_store, search, simulate_interest, withdraw, Account, AccountKind, AccountStore,
    AuthProvider, BankError, Config, CreateAccountRequest, Identity, TokenAuthProvider, UserTable,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<dyn AccountStore>,
    auth: Arc<TokenAuthProvider>,
    users: Arc<UserTable>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Account response (serialized view of the entity)
#[derive(Serialize)]
struct AccountResponse {
    owner: String,
    balance: f64,
    account_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    overdraft_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interest_rate: Option<f64>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let (account_type, overdraft_limit, interest_rate) = match account.kind() {
            AccountKind::Checking { overdraft_limit } => {
                ("Checking", Some(*overdraft_limit), None)
            }
            AccountKind::Savings { interest_rate } => ("Savings", None, Some(*interest_rate)),
        };
        Self {
            owner: account.owner().to_string(),
            balance: account.balance(),
            account_type,
            overdraft_limit,
            interest_rate,
        }
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    access_token: String,
    token_type: String,
}

#[derive(Deserialize)]
struct AmountRequest {
    /// Accepted as a number or a numeric string
    amount: serde_json::Value,
}

#[derive(Deserialize)]
struct SearchParams {
    name: String,
}

#[derive(Deserialize)]
struct SimulateParams {
    rate: f64,
}

// ============================================================================
// Error mapping & auth plumbing
// ============================================================================

fn failure(status: StatusCode, message: String) -> Response {
    let body = ApiResponse::<Option<()>> {
        success: false,
        data: None,
        error: Some(message),
    };
    (status, Json(body)).into_response()
}

fn error_response(err: BankError) -> Response {
    let status = match &err {
        BankError::Validation(_) | BankError::DomainRule(_) | BankError::DuplicateName { .. } => {
            StatusCode::BAD_REQUEST
        }
        BankError::NotFound { .. } => StatusCode::NOT_FOUND,
        // Role rejections; invalid tokens are handled in bearer_identity
        BankError::Auth(_) => StatusCode::FORBIDDEN,
        BankError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    failure(status, err.to_string())
}

/// Pull the bearer token from the Authorization header and verify it.
fn bearer_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "missing bearer token".to_string()))?;

    state
        .auth
        .verify_token(token)
        .map_err(|e| failure(StatusCode::UNAUTHORIZED, e.to_string()))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /login - Authenticate and receive a bearer token
async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    match state.users.authenticate(&body.username, &body.password) {
        Some((username, role)) => {
            let token = state.auth.issue_token(username, role);
            tracing::info!(user = username, role = role.as_str(), "login successful");
            Json(ApiResponse::ok(LoginResponse {
                access_token: token,
                token_type: "bearer".to_string(),
            }))
            .into_response()
        }
        None => {
            tracing::warn!(user = %body.username, "failed login attempt");
            failure(StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
        }
    }
}

/// GET /accounts - List all accounts (unauthenticated)
async fn list_accounts_handler(State(state): State<AppState>) -> Response {
    match list_accounts(state.store.as_ref()) {
        Ok(accounts) => {
            let response: Vec<AccountResponse> =
                accounts.into_iter().map(AccountResponse::from).collect();
            Json(ApiResponse::ok(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /accounts - Create a new account (admin)
async fn create_account_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateAccountRequest>,
) -> Response {
    let identity = match bearer_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match create_account(state.store.as_ref(), &identity, &request) {
        Ok(account) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(AccountResponse::from(account))),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /accounts/:name/deposit - Deposit (admin/viewer)
async fn deposit_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AmountRequest>,
) -> Response {
    let identity = match bearer_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let amount = match coerce_amount(&body.amount) {
        Ok(amount) => amount,
        Err(e) => return error_response(e),
    };

    match deposit(state.store.as_ref(), &identity, &name, amount) {
        Ok(receipt) => Json(ApiResponse::ok(receipt)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /accounts/:name/withdraw - Withdraw (admin/viewer)
async fn withdraw_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AmountRequest>,
) -> Response {
    let identity = match bearer_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let amount = match coerce_amount(&body.amount) {
        Ok(amount) => amount,
        Err(e) => return error_response(e),
    };

    match withdraw(state.store.as_ref(), &identity, &name, amount) {
        Ok(receipt) => Json(ApiResponse::ok(receipt)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /search?name= - Substring search over owner names (unauthenticated)
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    match search(state.store.as_ref(), &params.name) {
        Ok(hits) => {
            let response: Vec<AccountResponse> =
                hits.into_iter().map(AccountResponse::from).collect();
            Json(ApiResponse::ok(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /accounts/:name/interest - Permanently credit interest (admin)
async fn credit_interest_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let identity = match bearer_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match credit_interest(state.store.as_ref(), &identity, &name) {
        Ok(receipt) => Json(ApiResponse::ok(receipt)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /accounts/:name/interest/simulate?rate= - Dry-run interest
/// computation (unauthenticated; never changes stored state)
async fn simulate_interest_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<SimulateParams>,
) -> Response {
    match simulate_interest(state.store.as_ref(), &name, params.rate) {
        Ok(message) => Json(ApiResponse::ok(message)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Request log line for every inbound call
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "inbound request"
    );
    response
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("🌐 Bank Management API - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env();
    let store: Arc<dyn AccountStore> = Arc::from(open_store(&config)?);
    println!("✓ Store opened ({:?} backend)", config.backend);

    if ensure_seed_accounts(store.as_ref())? {
        println!("☁️  Seeded default accounts (Tom, Jim)");
    }

    let state = AppState {
        store,
        auth: Arc::new(TokenAuthProvider::new(config.secret_key.clone())),
        users: Arc::new(UserTable::from_config(&config)),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/accounts", get(list_accounts_handler).post(create_account_handler))
        .route("/accounts/:name/deposit", post(deposit_handler))
        .route("/accounts/:name/withdraw", post(withdraw_handler))
        .route("/accounts/:name/interest", post(credit_interest_handler))
        .route(
            "/accounts/:name/interest/simulate",
            post(simulate_interest_handler),
        )
        .route("/search", get(search_handler))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   Accounts: GET /accounts");
    println!("   Login:    POST /login");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
