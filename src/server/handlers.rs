use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, RawQuery, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::carrier::{Provider, ReceiptBatch};
use crate::client::GatewayError;
use crate::domain::{
    AccountClass, Carrier, CompanyId, Mobile, PhoneNumber, TemplateId, ValidationError,
};
use crate::orchestrator::MarketingRequest;
use crate::server::{Ack, ApiError, AppState, COMPANY_HEADER};

/// Body the Yunpian push expects back.
const YUNPIAN_ACK: &str = "SUCCESS";

fn ingest(state: &AppState, carrier: Carrier, batch: Result<ReceiptBatch, GatewayError>) {
    let batch = match batch {
        Ok(batch) => batch,
        Err(err) => {
            warn!(%carrier, error = %err, "discarding undecodable receipt payload");
            return;
        }
    };
    // A store failure is logged by the reconciler; the carrier is acknowledged regardless.
    if let Ok(report) = state.reconciler.reconcile(carrier, batch) {
        info!(
            %carrier,
            stored = report.stored,
            nominal = report.nominal,
            skipped = report.skipped,
            "receipts reconciled"
        );
    }
}

// ── GET /v1/sms/chuanglan/callback ──────────────────────────────────────────

pub async fn chuanglan_callback(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<Ack> {
    let query = query.unwrap_or_default();
    ingest(&state, Carrier::Chuanglan, state.chuanglan.parse_receipt(&query));
    Json(Ack::ok())
}

// ── POST /v1/sms/yunpian/callback ───────────────────────────────────────────

pub async fn yunpian_callback(State(state): State<AppState>, body: Bytes) -> &'static str {
    // Invalid UTF-8 must still be acknowledged; lossy text fails to decode and is logged.
    let body = String::from_utf8_lossy(&body);
    ingest(&state, Carrier::Yunpian, state.yunpian.parse_receipt(&body));
    YUNPIAN_ACK
}

// ── GET /v1/sms/chuanglan/querybalance ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BalanceParams {
    account_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    #[serde(flatten)]
    ack: Ack,
    remaining_count: i64,
}

pub async fn chuanglan_balance(
    State(state): State<AppState>,
    Query(params): Query<BalanceParams>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let code = params
        .account_type
        .as_deref()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0);
    let class = AccountClass::from_code(code).map_err(GatewayError::from)?;
    let report = state.chuanglan.query_balance(class).await?;
    Ok(Json(BalanceResponse {
        ack: Ack::ok(),
        remaining_count: report.remaining_count,
    }))
}

// ── POST /v1/sms/marketing ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MarketingBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    mobiles: Vec<String>,
    #[serde(default)]
    template_id: i64,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MarketingResponse {
    #[serde(flatten)]
    ack: Ack,
    record_id: i64,
    count: u32,
    count_per_content: u32,
    message_id: String,
}

fn company_from(headers: &HeaderMap) -> Result<CompanyId, ValidationError> {
    let raw = headers
        .get(COMPANY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::Empty {
            field: COMPANY_HEADER,
        })?;
    let value = raw.parse().unwrap_or(0);
    CompanyId::tenant(value)
}

pub async fn send_marketing(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<MarketingBody>, JsonRejection>,
) -> Result<Json<MarketingResponse>, ApiError> {
    let Json(body) = body?;
    let company = company_from(&headers).map_err(GatewayError::from)?;
    let mobiles = Mobile::list(body.mobiles).map_err(GatewayError::from)?;

    let outcome = state
        .orchestrator
        .send_marketing(MarketingRequest {
            company,
            template: TemplateId::new(body.template_id),
            content: body.content,
            mobiles,
            args: body.args,
        })
        .await?;

    let segmentation = outcome.attempt.segmentation;
    Ok(Json(MarketingResponse {
        ack: Ack::ok(),
        record_id: outcome.record_id,
        count: segmentation.billable_units,
        count_per_content: segmentation.segments_per_recipient,
        message_id: outcome.attempt.recorded_message_id(),
    }))
}

// ── POST /v1/sms/mobile_verification_code ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MobileBody {
    #[serde(default)]
    mobile: String,
}

pub async fn send_verification_code(
    State(state): State<AppState>,
    body: Result<Json<MobileBody>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(body) = body?;
    let mobile = PhoneNumber::parse_cn(body.mobile).map_err(GatewayError::from)?;
    state.orchestrator.issue_verification_code(&mobile).await?;
    Ok(Json(Ack::ok()))
}

// ── POST /v1/sms/mobile_verification_code/match ─────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchBody {
    #[serde(default)]
    mobile: String,
    #[serde(default)]
    code: String,
}

pub async fn match_verification_code(
    State(state): State<AppState>,
    body: Result<Json<MatchBody>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(body) = body?;
    let mobile = PhoneNumber::parse_cn(body.mobile).map_err(GatewayError::from)?;
    state
        .orchestrator
        .match_verification_code(&mobile, body.code.trim())?;
    Ok(Json(Ack::ok()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::authority::SmsCounts;
    use crate::authority::fake::FakeAuthority;
    use crate::carrier::{ChuanglanProvider, YunpianProvider};
    use crate::client::fake::FakeTransport;
    use crate::domain::{Carrier, ReceiptStatus};
    use crate::ledger::QuotaLedger;
    use crate::orchestrator::{SendOrchestrator, VERIFICATION_TEMPLATE_NAME};
    use crate::reconcile::ReceiptReconciler;
    use crate::registry::ProviderRegistry;
    use crate::registry::test_support::{chuanglan_info, provider_row};
    use crate::server::{AppState, COMPANY_HEADER, build_router};
    use crate::store::{InMemoryStore, STATUS_VALID, SeedData, TEMPLATE_APPROVED, Template};
    use crate::verification::VerificationCodes;

    struct TestApp {
        router: Router,
        transport: FakeTransport,
        authority: FakeAuthority,
        store: Arc<InMemoryStore>,
    }

    fn app(company_balance: i64) -> TestApp {
        let transport = FakeTransport::new();
        let authority = FakeAuthority::new()
            .with_chuanglan(chuanglan_info())
            .with_balances(SmsCounts {
                platform_verification_count: 100,
                platform_marketing_count: 100,
                company_sms_remaining_count: company_balance,
            });
        let store = Arc::new(InMemoryStore::seeded(SeedData {
            providers: vec![provider_row(Carrier::Chuanglan, 1, 70)],
            templates: vec![Template {
                template_id: 10,
                provider_id: 1,
                template_name: VERIFICATION_TEMPLATE_NAME.to_owned(),
                template_content: "【%s】验证码%s".to_owned(),
                check_status: TEMPLATE_APPROVED,
                status: STATUS_VALID,
            }],
        }));
        let registry = Arc::new(ProviderRegistry::new(
            Arc::new(authority.clone()),
            store.clone(),
        ));
        let http = Arc::new(transport.clone());
        let chuanglan = Arc::new(ChuanglanProvider::new(registry.clone(), http.clone()));
        let yunpian = Arc::new(YunpianProvider::new(registry, http));
        let orchestrator = Arc::new(SendOrchestrator::new(
            chuanglan.clone(),
            QuotaLedger::new(Arc::new(authority.clone())),
            store.clone(),
            store.clone(),
            Arc::new(VerificationCodes::default()),
        ));
        let state = AppState {
            orchestrator,
            chuanglan,
            yunpian,
            reconciler: Arc::new(ReceiptReconciler::new(store.clone())),
        };
        TestApp {
            router: build_router(state),
            transport,
            authority,
            store,
        }
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn json(body: &str) -> serde_json::Value {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = app(10);
        let (status, _) = call(
            &app.router,
            Request::get("/healthz").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn chuanglan_callback_stores_failures_and_always_acks() {
        let app = app(10);
        let (status, body) = call(
            &app.router,
            Request::get(
                "/v1/sms/chuanglan/callback?msgid=1610&reportTime=1610251710&mobile=15205201314&status=DTBLACK",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({"err_code": 0, "err_msg": ""}));

        let (_, body) = call(
            &app.router,
            Request::get("/v1/sms/chuanglan/callback?msgid=1611&reportTime=1610251710&mobile=15205201314&status=DELIVRD")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(json(&body)["err_code"], 0);

        let (status, _) = call(
            &app.router,
            Request::get("/v1/sms/chuanglan/callback")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let receipts = app.store.receipts().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].status, ReceiptStatus::BlacklistedRecipient);
    }

    #[tokio::test]
    async fn yunpian_callback_acks_even_garbage() {
        let app = app(10);
        let payload = r#"{"sms_status":[{"sid":9527,"user_receive_time":"2014-03-17 22:55:21","mobile":"15205201314","report_status":"SUCCESS"}]}"#;
        let (status, body) = call(
            &app.router,
            Request::post("/v1/sms/yunpian/callback")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "SUCCESS");
        assert_eq!(app.store.receipts().unwrap().len(), 1);

        let (_, body) = call(
            &app.router,
            Request::post("/v1/sms/yunpian/callback")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(body, "SUCCESS");
        assert_eq!(app.store.receipts().unwrap().len(), 1);

        let (status, body) = call(
            &app.router,
            Request::post("/v1/sms/yunpian/callback")
                .body(Body::from(vec![0xff, 0xfe, b'{']))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "SUCCESS");
        assert_eq!(app.store.receipts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn balance_query_validates_account_type() {
        let app = app(10);
        let (status, body) = call(
            &app.router,
            Request::get("/v1/sms/chuanglan/querybalance?account_type=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["err_code"], 1001);
        assert_eq!(app.transport.call_count(), 0);

        app.transport
            .push_response(200, "20130303180000,0\nN5455565,12345");
        let (status, body) = call(
            &app.router,
            Request::get("/v1/sms/chuanglan/querybalance?account_type=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body),
            serde_json::json!({"err_code": 0, "err_msg": "", "remaining_count": 12345})
        );
        assert_eq!(app.transport.requests()[0].param("account"), Some("M001"));
    }

    #[tokio::test]
    async fn marketing_requires_company_header_and_quota() {
        let app = app(0);
        let request = r#"{"content":"周末五折","mobiles":["13800000001"],"template_id":0}"#;

        let (status, body) = call(&app.router, json_post("/v1/sms/marketing", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["err_code"], 1001);

        let mut with_company = json_post("/v1/sms/marketing", request);
        with_company
            .headers_mut()
            .insert(COMPANY_HEADER, "42".parse().unwrap());
        let (status, body) = call(&app.router, with_company).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(json(&body)["err_code"], 1005);
        assert_eq!(app.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn marketing_send_reports_units() {
        let app = app(10);
        app.transport
            .push_response(200, "20161025170822,0\n16102517082223817");
        let mut request = json_post(
            "/v1/sms/marketing",
            r#"{"content":"周末五折","mobiles":["13800000001","13800000002"]}"#,
        );
        request
            .headers_mut()
            .insert(COMPANY_HEADER, "42".parse().unwrap());

        let (status, body) = call(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["err_code"], 0);
        assert_eq!(body["count"], 2);
        assert_eq!(body["message_id"], "16102517082223817");
        assert_eq!(app.authority.adjustments().len(), 1);
    }

    #[tokio::test]
    async fn verification_code_flow() {
        let app = app(10);
        let (status, body) = call(
            &app.router,
            json_post("/v1/sms/mobile_verification_code", r#"{"mobile":"12345"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["err_code"], 1001);

        let (status, _) = call(
            &app.router,
            json_post("/v1/sms/mobile_verification_code", "{"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        app.transport
            .push_response(200, "20161025170822,0\n16102517082223817");
        let (status, body) = call(
            &app.router,
            json_post(
                "/v1/sms/mobile_verification_code",
                r#"{"mobile":"13812345678"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let sent = app.transport.requests()[0].param("msg").unwrap().to_owned();
        let code = sent.trim_start_matches("【Acme】验证码").to_owned();
        assert_eq!(code.len(), 4);

        let (status, _) = call(
            &app.router,
            json_post(
                "/v1/sms/mobile_verification_code/match",
                &format!(r#"{{"mobile":"13812345678","code":"{code}"}}"#),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
