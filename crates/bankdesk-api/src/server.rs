//! Lookup service HTTP server — Axum-based JSON endpoints

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use bankdesk_core::lookup::{ACCOUNT_NOT_FOUND, Endpoint, LOAN_NOT_FOUND, LookupRequest, LookupResponse};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::records::CustomerBook;

/// Shared state for all requests
#[derive(Clone)]
pub struct ServerState {
    pub book: Arc<CustomerBook>,
    pub start_time: std::time::Instant,
}

/// The mock lookup service
pub struct LookupServer {
    state: ServerState,
    bind: SocketAddr,
}

impl LookupServer {
    pub fn new(bind: SocketAddr, book: CustomerBook) -> Self {
        let state = ServerState {
            book: Arc::new(book),
            start_time: std::time::Instant::now(),
        };
        Self { state, bind }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route(Endpoint::BalanceEnquiry.path(), post(balance_enquiry_handler))
            .route(Endpoint::LoanBalance.path(), post(loan_balance_handler))
            .route(Endpoint::LoanStatus.path(), post(loan_status_handler))
            .route("/api/status", get(status_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.router();
        info!(
            "Lookup service listening on {} ({} customers)",
            listener.local_addr()?,
            self.state.book.len()
        );
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Lookup service stopped");
        Ok(())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind).await?;
        self.serve(listener, shutdown).await
    }

    /// Start the server in the background, returning a handle
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run(std::future::pending()).await })
    }
}

// ── HTTP Handlers ──

fn found(text: String) -> (StatusCode, Json<LookupResponse>) {
    (StatusCode::OK, Json(LookupResponse { response: text }))
}

fn not_found(message: &str) -> (StatusCode, Json<LookupResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(LookupResponse {
            response: message.to_string(),
        }),
    )
}

async fn balance_enquiry_handler(
    State(state): State<ServerState>,
    Json(req): Json<LookupRequest>,
) -> impl IntoResponse {
    let account = req.param(Endpoint::BalanceEnquiry.param_key());
    debug!("balance_enquiry for {:?}", account);
    match account.and_then(|a| state.book.find_by_account(a)) {
        Some(customer) => found(format!(
            "Available account balance for {} is ${}",
            customer.account_number, customer.account_balance
        )),
        None => not_found(ACCOUNT_NOT_FOUND),
    }
}

async fn loan_balance_handler(
    State(state): State<ServerState>,
    Json(req): Json<LookupRequest>,
) -> impl IntoResponse {
    let account = req.param(Endpoint::LoanBalance.param_key());
    debug!("loan_balance for {:?}", account);
    match account.and_then(|a| state.book.find_by_account(a)) {
        Some(customer) => found(format!(
            "Loan balance for account {} is ${}",
            customer.account_number, customer.loan_balance
        )),
        None => not_found(ACCOUNT_NOT_FOUND),
    }
}

async fn loan_status_handler(
    State(state): State<ServerState>,
    Json(req): Json<LookupRequest>,
) -> impl IntoResponse {
    let loan_id = req.param(Endpoint::LoanStatus.param_key());
    debug!("loan_status for {:?}", loan_id);
    match loan_id.and_then(|l| state.book.find_by_loan(l)) {
        Some(customer) => found(format!(
            "Loan ID {} is currently '{}'.",
            customer.loan_id, customer.loan_status
        )),
        None => not_found(LOAN_NOT_FOUND),
    }
}

async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "customers": state.book.len(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}
