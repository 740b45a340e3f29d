//! REST surface for the wallet ledger.
//!
//! Decodes and validates requests, invokes the ledger service, and maps the
//! error taxonomy to client-facing statuses: unknown wallet → 404,
//! insufficient funds → 409, malformed input → 400, anything else → 500.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use walletd_common::{Amount, Balance, LedgerError, WalletId};
use walletd_ledger::{BalanceCache, LedgerStore, WalletService};

use crate::metrics::SharedMetrics;

/// Shared application state: the ledger service plus the metrics registry.
pub struct AppState<S, C> {
    service: Arc<WalletService<S, C>>,
    metrics: SharedMetrics,
}

impl<S, C> AppState<S, C> {
    pub fn new(service: Arc<WalletService<S, C>>, metrics: SharedMetrics) -> Self {
        Self { service, metrics }
    }
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Build the application router.
pub fn router<S, C>(state: AppState<S, C>, metrics_enabled: bool) -> Router
where
    S: LedgerStore + 'static,
    C: BalanceCache + 'static,
{
    let mut router = Router::new()
        .route("/api/v1/wallet", post(wallet_operation::<S, C>))
        .route("/api/v1/wallets/:id", get(wallet_balance::<S, C>))
        .route("/health", get(health));

    if metrics_enabled {
        router = router.route("/metrics", get(export_metrics::<S, C>));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Central error type for the REST surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ApiError::Ledger(err) => {
                let status = match err {
                    LedgerError::WalletNotFound(_) => StatusCode::NOT_FOUND,
                    LedgerError::InsufficientFunds { .. } => StatusCode::CONFLICT,
                    LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                // Storage detail is for the logs, not for clients.
                let message = match err {
                    LedgerError::Storage(_) => "internal server error".to_string(),
                    other => other.to_string(),
                };
                (status, err.error_code(), message)
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

/// Requested mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Deposit,
    Withdraw,
}

/// Body of `POST /api/v1/wallet`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOperationRequest {
    pub wallet_id: Uuid,
    pub operation_type: OperationType,
    pub amount: Amount,
}

/// Balance payload returned by both endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResponse {
    pub wallet_id: Uuid,
    pub balance: Balance,
}

async fn wallet_operation<S, C>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<WalletOperationRequest>, JsonRejection>,
) -> Result<Json<WalletBalanceResponse>, ApiError>
where
    S: LedgerStore + 'static,
    C: BalanceCache + 'static,
{
    let Json(req) = payload.map_err(|rejection| {
        state.metrics.request_invalid();
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    if req.amount <= 0 {
        state.metrics.request_invalid();
        return Err(ApiError::InvalidRequest(
            "amount must be positive".to_string(),
        ));
    }

    let wallet_id = WalletId::from_uuid(req.wallet_id);
    let result = match req.operation_type {
        OperationType::Deposit => state.service.deposit(wallet_id, req.amount).await,
        OperationType::Withdraw => state.service.withdraw(wallet_id, req.amount).await,
    };

    match &result {
        Ok(_) => match req.operation_type {
            OperationType::Deposit => state.metrics.deposit_ok(),
            OperationType::Withdraw => state.metrics.withdrawal_ok(),
        },
        Err(LedgerError::InsufficientFunds { .. }) => state.metrics.withdrawal_rejected(),
        Err(LedgerError::WalletNotFound(_)) => state.metrics.wallet_not_found(),
        Err(LedgerError::Storage(_)) => match req.operation_type {
            OperationType::Deposit => state.metrics.deposit_failed(),
            OperationType::Withdraw => state.metrics.withdrawal_failed(),
        },
    }

    let balance = result?;
    Ok(Json(WalletBalanceResponse {
        wallet_id: req.wallet_id,
        balance,
    }))
}

async fn wallet_balance<S, C>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<WalletBalanceResponse>, ApiError>
where
    S: LedgerStore + 'static,
    C: BalanceCache + 'static,
{
    let wallet_id = WalletId::parse(&id).map_err(|_| {
        state.metrics.request_invalid();
        ApiError::InvalidRequest(format!("malformed wallet id: {id}"))
    })?;

    let result = state.service.get_balance(wallet_id).await;
    match &result {
        Ok(_) => state.metrics.balance_read_ok(),
        Err(LedgerError::WalletNotFound(_)) => state.metrics.wallet_not_found(),
        Err(_) => state.metrics.balance_read_failed(),
    }

    let balance = result?;
    Ok(Json(WalletBalanceResponse {
        wallet_id: *wallet_id.as_uuid(),
        balance,
    }))
}

async fn export_metrics<S, C>(State(state): State<AppState<S, C>>) -> Response
where
    S: LedgerStore + 'static,
    C: BalanceCache + 'static,
{
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
