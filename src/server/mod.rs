//! HTTP surface: carrier webhooks, send endpoints and the balance query.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};

use crate::carrier::{ChuanglanProvider, YunpianProvider};
use crate::orchestrator::SendOrchestrator;
use crate::reconcile::ReceiptReconciler;

mod error;
mod handlers;

pub use error::{Ack, ApiError};

/// Header carrying the tenant of a marketing send.
pub const COMPANY_HEADER: &str = "x-company-id";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SendOrchestrator>,
    pub chuanglan: Arc<ChuanglanProvider>,
    pub yunpian: Arc<YunpianProvider>,
    pub reconciler: Arc<ReceiptReconciler>,
}

pub fn build_router(state: AppState) -> Router {
    let sms = Router::new()
        .route("/chuanglan/callback", get(handlers::chuanglan_callback))
        .route("/chuanglan/querybalance", get(handlers::chuanglan_balance))
        .route("/yunpian/callback", post(handlers::yunpian_callback))
        .route("/marketing", post(handlers::send_marketing))
        .route(
            "/mobile_verification_code",
            post(handlers::send_verification_code),
        )
        .route(
            "/mobile_verification_code/match",
            post(handlers::match_verification_code),
        );

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/v1/sms", sms)
        .with_state(state)
}

/// `GET /healthz`
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
