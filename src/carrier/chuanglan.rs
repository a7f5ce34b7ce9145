use std::sync::Arc;

use tracing::{debug, warn};

use crate::carrier::{Provider, ReceiptBatch, SendAttemptResult, rejected, require_recipients};
use crate::client::{BoxFuture, GatewayError, HttpTransport};
use crate::domain::{
    AccountClass, BalanceReport, Carrier, CarrierMessageId, MaxLength, MessageText, Mobile,
    segment,
};
use crate::registry::{ChuanglanConfig, ProviderProfile, ProviderRegistry};
use crate::transport::chuanglan as wire;

const CARRIER: Carrier = Carrier::Chuanglan;

/// Two-line text protocol over `GET`.
pub struct ChuanglanProvider {
    registry: Arc<ProviderRegistry>,
    http: Arc<dyn HttpTransport>,
}

impl ChuanglanProvider {
    pub fn new(registry: Arc<ProviderRegistry>, http: Arc<dyn HttpTransport>) -> Self {
        Self { registry, http }
    }

    async fn config(&self) -> Result<Arc<ChuanglanConfig>, GatewayError> {
        self.registry
            .chuanglan()
            .await?
            .ok_or(GatewayError::ProviderUnavailable { carrier: CARRIER })
    }

    async fn send(
        &self,
        class: AccountClass,
        text: &MessageText,
        recipients: &[Mobile],
    ) -> Result<SendAttemptResult, GatewayError> {
        require_recipients(recipients)?;
        let config = self.config().await?;
        let max_length = MaxLength::new(config.profile.max_length)?;
        let segmentation = segment(
            text.as_str(),
            i64::from(max_length.value()),
            recipients.len(),
        );

        let pair = config.credentials.pair(class);
        let query = wire::encode_send_query(&pair.account, &pair.password, recipients, text);
        debug!(
            ?class,
            recipients = recipients.len(),
            units = segmentation.billable_units,
            "submitting to chuanglan"
        );

        let response = match self.http.get(&config.credentials.send_url, query).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "chuanglan request failed");
                return Ok(SendAttemptResult::failed(
                    segmentation,
                    GatewayError::Transport(err),
                ));
            }
        };
        let body = match response.into_success_body() {
            Ok(body) => body,
            Err(err) => return Ok(SendAttemptResult::failed(segmentation, err)),
        };

        let reply = wire::decode_send_reply(&body);
        if !reply.status_code.is_ok() {
            let code = reply.status_code;
            warn!(code = code.as_i32(), message = ?code.message(), "chuanglan rejected submission");
            return Ok(SendAttemptResult::failed(
                segmentation,
                rejected(CARRIER, code.as_i32(), code.message()),
            ));
        }

        Ok(SendAttemptResult::accepted(
            segmentation,
            CarrierMessageId::non_empty(&reply.message_id),
        ))
    }
}

impl Provider for ChuanglanProvider {
    fn carrier(&self) -> Carrier {
        CARRIER
    }

    fn profile(&self) -> BoxFuture<'_, Result<ProviderProfile, GatewayError>> {
        Box::pin(async move { Ok(self.config().await?.profile.clone()) })
    }

    fn send_verification<'a>(
        &'a self,
        text: &'a MessageText,
        recipients: &'a [Mobile],
    ) -> BoxFuture<'a, Result<SendAttemptResult, GatewayError>> {
        Box::pin(self.send(AccountClass::Verification, text, recipients))
    }

    fn send_marketing<'a>(
        &'a self,
        text: &'a MessageText,
        recipients: &'a [Mobile],
    ) -> BoxFuture<'a, Result<SendAttemptResult, GatewayError>> {
        Box::pin(self.send(AccountClass::Marketing, text, recipients))
    }

    fn query_balance(
        &self,
        class: AccountClass,
    ) -> BoxFuture<'_, Result<BalanceReport, GatewayError>> {
        Box::pin(async move {
            let config = self.config().await?;
            let pair = config.credentials.pair(class);
            let query = wire::encode_balance_query(&pair.account, &pair.password);

            let body = self
                .http
                .get(&config.credentials.balance_url, query)
                .await
                .map_err(GatewayError::Transport)?
                .into_success_body()?;
            let balance = wire::decode_balance_reply(&body).map_err(GatewayError::parse)?;

            let code = balance.status_code;
            match balance.remaining {
                Some(remaining_count) if code.is_ok() => Ok(BalanceReport {
                    remaining_count,
                    status_code: code.as_i32(),
                }),
                _ => Err(rejected(CARRIER, code.as_i32(), code.message())),
            }
        })
    }

    fn parse_receipt(&self, payload: &str) -> Result<ReceiptBatch, GatewayError> {
        let receipt = wire::decode_callback_query(payload).map_err(GatewayError::parse);
        Ok(Box::new(std::iter::once(receipt)))
    }
}
