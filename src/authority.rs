//! Client for the account authority: carrier credentials and SMS balances live there.
//!
//! Procedures are called as JSON over HTTP: `POST {base}/rpc/accounts.<Method>` with the
//! argument object as body, answered by `{"result": ...}` or `{"error": "..."}`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::{BoxFuture, GatewayError, HttpTransport};
use crate::domain::CompanyId;

pub const GET_CHUANGLAN_ACCOUNT_INFO: &str = "GetChuanglanAccountInfo";
pub const GET_YUNPIAN_ACCOUNT_INFO: &str = "GetYunpianAccountInfo";
pub const GET_CHUANGLAN_REMAINING_SMS: &str = "GetChuanglanRemainingSMS";
pub const UPDATE_CHUANGLAN_SMS_COUNT: &str = "UpdateChuanglanSmsCount";

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChuanglanAccountInfo {
    pub verification_account: String,
    pub verification_password: String,
    pub marketing_account: String,
    pub marketing_password: String,
    pub http_api: String,
    pub query_balance_http_api: String,
    pub receiver_http_api: String,
}

impl std::fmt::Debug for ChuanglanAccountInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChuanglanAccountInfo")
            .field("verification_account", &self.verification_account)
            .field("marketing_account", &self.marketing_account)
            .field("http_api", &self.http_api)
            .field("query_balance_http_api", &self.query_balance_http_api)
            .field("receiver_http_api", &self.receiver_http_api)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct YunpianAccountInfo {
    pub single_api_key: String,
    pub group_api_key: String,
    pub http_api: String,
    pub receiver_http_api: String,
}

impl std::fmt::Debug for YunpianAccountInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YunpianAccountInfo")
            .field("http_api", &self.http_api)
            .field("receiver_http_api", &self.receiver_http_api)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Balance counters; also used as the delta set of an adjustment.
pub struct SmsCounts {
    #[serde(default)]
    pub platform_verification_count: i64,
    #[serde(default)]
    pub platform_marketing_count: i64,
    #[serde(default)]
    pub company_sms_remaining_count: i64,
}

#[derive(Debug, Serialize)]
struct CompanyArgs {
    company_id: i64,
}

#[derive(Debug, Serialize)]
struct AdjustArgs {
    company_id: i64,
    #[serde(flatten)]
    delta: SmsCounts,
}

#[derive(Debug, Deserialize)]
struct RpcReply<T> {
    result: Option<T>,
    error: Option<String>,
}

/// Remote account authority.
pub trait AccountAuthority: Send + Sync {
    fn chuanglan_account_info(&self) -> BoxFuture<'_, Result<ChuanglanAccountInfo, GatewayError>>;

    fn yunpian_account_info(&self) -> BoxFuture<'_, Result<YunpianAccountInfo, GatewayError>>;

    fn remaining_sms(&self, company: CompanyId) -> BoxFuture<'_, Result<SmsCounts, GatewayError>>;

    /// Apply signed deltas to the platform and company counters.
    fn update_sms_count(
        &self,
        company: CompanyId,
        delta: SmsCounts,
    ) -> BoxFuture<'_, Result<(), GatewayError>>;
}

#[derive(Clone)]
pub struct HttpAccountAuthority {
    base_url: String,
    http: Arc<dyn HttpTransport>,
}

impl HttpAccountAuthority {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/rpc/accounts.{method}", self.base_url)
    }

    async fn call<A, R>(&self, method: &'static str, args: A) -> Result<R, GatewayError>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        self.call_optional(method, args)
            .await?
            .ok_or_else(|| GatewayError::Authority {
                method,
                message: "empty reply".to_owned(),
            })
    }

    /// Like `call`, for procedures whose `result` may be `null`.
    async fn call_optional<A, R>(
        &self,
        method: &'static str,
        args: A,
    ) -> Result<Option<R>, GatewayError>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(&args).map_err(GatewayError::parse)?;
        let url = self.endpoint(method);
        let response = self
            .http
            .post_json(&url, body)
            .await
            .map_err(GatewayError::Transport)?;
        let body = response.into_success_body()?;

        let reply: RpcReply<R> = serde_json::from_str(&body).map_err(GatewayError::parse)?;
        if let Some(message) = reply.error.filter(|message| !message.is_empty()) {
            return Err(GatewayError::Authority { method, message });
        }
        Ok(reply.result)
    }
}

impl AccountAuthority for HttpAccountAuthority {
    fn chuanglan_account_info(&self) -> BoxFuture<'_, Result<ChuanglanAccountInfo, GatewayError>> {
        Box::pin(self.call(GET_CHUANGLAN_ACCOUNT_INFO, serde_json::json!({})))
    }

    fn yunpian_account_info(&self) -> BoxFuture<'_, Result<YunpianAccountInfo, GatewayError>> {
        Box::pin(self.call(GET_YUNPIAN_ACCOUNT_INFO, serde_json::json!({})))
    }

    fn remaining_sms(&self, company: CompanyId) -> BoxFuture<'_, Result<SmsCounts, GatewayError>> {
        Box::pin(async move {
            let args = CompanyArgs {
                company_id: company.value(),
            };
            self.call(GET_CHUANGLAN_REMAINING_SMS, args).await
        })
    }

    fn update_sms_count(
        &self,
        company: CompanyId,
        delta: SmsCounts,
    ) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(async move {
            let args = AdjustArgs {
                company_id: company.value(),
                delta,
            };
            let _: Option<serde_json::Value> =
                self.call_optional(UPDATE_CHUANGLAN_SMS_COUNT, args).await?;
            Ok(())
        })
    }
}


#[cfg(test)]
mod tests {
    use crate::client::fake::{FakeTransport, RecordedBody};

    use super::*;

    fn authority(transport: &FakeTransport) -> HttpAccountAuthority {
        HttpAccountAuthority::new("https://accounts.example/", Arc::new(transport.clone()))
    }

    #[tokio::test]
    async fn fetches_chuanglan_account_info() {
        let transport = FakeTransport::with_response(
            200,
            r#"{"result":{"verification_account":"V1","verification_password":"vp","marketing_account":"M1","marketing_password":"mp","http_api":"https://cl.example/send","query_balance_http_api":"https://cl.example/balance"}}"#,
        );
        let info = authority(&transport).chuanglan_account_info().await.unwrap();
        assert_eq!(info.verification_account, "V1");
        assert_eq!(info.marketing_password, "mp");
        assert_eq!(info.receiver_http_api, "");
        assert!(!format!("{info:?}").contains("vp"));

        let requests = transport.requests();
        assert_eq!(
            requests[0].url,
            "https://accounts.example/rpc/accounts.GetChuanglanAccountInfo"
        );
    }

    #[tokio::test]
    async fn update_sms_count_sends_flat_deltas() {
        let transport = FakeTransport::with_response(200, r#"{"result":null}"#);
        authority(&transport)
            .update_sms_count(
                CompanyId::new(9),
                SmsCounts {
                    platform_verification_count: 0,
                    platform_marketing_count: -2,
                    company_sms_remaining_count: -2,
                },
            )
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].body,
            RecordedBody::Json(serde_json::json!({
                "company_id": 9,
                "platform_verification_count": 0,
                "platform_marketing_count": -2,
                "company_sms_remaining_count": -2,
            }))
        );
    }

    #[tokio::test]
    async fn authority_errors_surface() {
        let transport = FakeTransport::with_response(200, r#"{"error":"company not found"}"#);
        let err = authority(&transport)
            .remaining_sms(CompanyId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Authority { method: GET_CHUANGLAN_REMAINING_SMS, ref message } if message == "company not found"
        ));

        let transport = FakeTransport::new();
        transport.push_failure("connection refused");
        let err = authority(&transport)
            .remaining_sms(CompanyId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));

        let transport = FakeTransport::with_response(503, "");
        let err = authority(&transport)
            .yunpian_account_info()
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::HttpStatus { status: 503, .. }));
    }
}
