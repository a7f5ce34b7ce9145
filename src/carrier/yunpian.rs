use std::sync::Arc;

use tracing::{debug, warn};

use crate::carrier::{Provider, ReceiptBatch, SendAttemptResult, rejected, require_recipients};
use crate::client::{BoxFuture, GatewayError, HttpTransport};
use crate::domain::{
    AccountClass, BalanceReport, BatchSend, Carrier, MaxLength, MessageText, Mobile, Segmentation,
    YunpianCode, segment,
};
use crate::registry::{ProviderProfile, ProviderRegistry, YunpianConfig};
use crate::transport::yunpian::{self as wire, ReceiptEntry, SINGLE_SEND_PATH};

const CARRIER: Carrier = Carrier::Yunpian;

fn rejection(code: YunpianCode) -> GatewayError {
    rejected(CARRIER, code.as_i32(), code.message())
}

/// JSON protocol: `single_send` for one recipient, `batch_send` / `multi_send` otherwise.
pub struct YunpianProvider {
    registry: Arc<ProviderRegistry>,
    http: Arc<dyn HttpTransport>,
}

impl YunpianProvider {
    pub fn new(registry: Arc<ProviderRegistry>, http: Arc<dyn HttpTransport>) -> Self {
        Self { registry, http }
    }

    async fn config(&self) -> Result<Arc<YunpianConfig>, GatewayError> {
        self.registry
            .yunpian()
            .await?
            .ok_or(GatewayError::ProviderUnavailable { carrier: CARRIER })
    }

    async fn post(
        &self,
        config: &YunpianConfig,
        path: &str,
        body: &wire::SendBody,
    ) -> Result<String, GatewayError> {
        let url = format!("{}{path}", config.credentials.api_base);
        let body = serde_json::to_value(body).map_err(GatewayError::parse)?;
        self.http
            .post_json(&url, body)
            .await
            .map_err(GatewayError::Transport)?
            .into_success_body()
    }

    /// Send one message to one recipient with the single-send key.
    pub async fn send_single(
        &self,
        mobile: &Mobile,
        text: &MessageText,
    ) -> Result<SendAttemptResult, GatewayError> {
        let config = self.config().await?;
        let max_length = MaxLength::new(config.profile.max_length)?;
        let segmentation = segment(text.as_str(), i64::from(max_length.value()), 1);

        let body = wire::encode_single_send(
            &config.credentials.single_api_key,
            mobile,
            text,
            &config.credentials.callback_url,
        );
        debug!(units = segmentation.billable_units, "submitting yunpian single send");

        let reply = match self.post(&config, SINGLE_SEND_PATH, &body).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "yunpian single send failed");
                return Ok(SendAttemptResult::failed(segmentation, err));
            }
        };
        let result = match wire::decode_single_send(&reply) {
            Ok(result) => result,
            Err(err) => {
                return Ok(SendAttemptResult::failed(
                    segmentation,
                    GatewayError::parse(err),
                ));
            }
        };

        if !result.code.is_ok() {
            warn!(code = result.code.as_i32(), msg = ?result.msg, "yunpian rejected single send");
            let mut attempt = SendAttemptResult::failed(segmentation, rejection(result.code));
            attempt.recipients.push(result);
            return Ok(attempt);
        }

        let mut attempt = SendAttemptResult::accepted(segmentation, result.message_id.clone());
        attempt.recipients.push(result);
        Ok(attempt)
    }

    /// Send a batch with the group key.
    ///
    /// Per-recipient outcomes are kept in the result. When any recipient is rejected, the first
    /// rejection (in response order) becomes the attempt's error while accepted entries remain
    /// listed.
    pub async fn send_batch(&self, batch: &BatchSend) -> Result<SendAttemptResult, GatewayError> {
        let config = self.config().await?;
        let max_length = i64::from(MaxLength::new(config.profile.max_length)?.value());
        let segmentation = match batch {
            BatchSend::SameContent(same) => {
                segment(same.text().as_str(), max_length, same.recipients().len())
            }
            BatchSend::PerRecipient(per_recipient) => per_recipient.messages().iter().fold(
                Segmentation::default(),
                |total, (_, text)| {
                    let one = segment(text.as_str(), max_length, 1);
                    Segmentation {
                        segments_per_recipient: total
                            .segments_per_recipient
                            .max(one.segments_per_recipient),
                        billable_units: total.billable_units.saturating_add(one.billable_units),
                    }
                },
            ),
        };

        let (path, body) = wire::encode_batch_send(
            &config.credentials.group_api_key,
            batch,
            &config.credentials.callback_url,
        );
        debug!(
            path,
            recipients = batch.recipient_count(),
            units = segmentation.billable_units,
            "submitting yunpian batch"
        );

        let reply = match self.post(&config, path, &body).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, path, "yunpian batch send failed");
                return Ok(SendAttemptResult::failed(segmentation, err));
            }
        };
        let response = match wire::decode_batch_send(&reply) {
            Ok(response) => response,
            Err(err) => {
                return Ok(SendAttemptResult::failed(
                    segmentation,
                    GatewayError::parse(err),
                ));
            }
        };

        let mut attempt = match response.first_rejection() {
            Some(first) => {
                warn!(
                    code = first.code.as_i32(),
                    accepted = response.accepted().count(),
                    total = response.results.len(),
                    "yunpian rejected part of a batch"
                );
                SendAttemptResult::failed(segmentation, rejection(first.code))
            }
            None => SendAttemptResult::accepted(segmentation, None),
        };
        attempt.recipients = response.results;
        Ok(attempt)
    }

    async fn send(
        &self,
        text: &MessageText,
        recipients: &[Mobile],
    ) -> Result<SendAttemptResult, GatewayError> {
        require_recipients(recipients)?;
        match recipients {
            [mobile] => self.send_single(mobile, text).await,
            _ => {
                let batch = BatchSend::same_content(recipients.to_vec(), text.clone())?;
                self.send_batch(&batch).await
            }
        }
    }
}

impl Provider for YunpianProvider {
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
        Box::pin(self.send(text, recipients))
    }

    fn send_marketing<'a>(
        &'a self,
        text: &'a MessageText,
        recipients: &'a [Mobile],
    ) -> BoxFuture<'a, Result<SendAttemptResult, GatewayError>> {
        Box::pin(self.send(text, recipients))
    }

    fn query_balance(
        &self,
        _class: AccountClass,
    ) -> BoxFuture<'_, Result<BalanceReport, GatewayError>> {
        Box::pin(async move {
            Err(GatewayError::Unsupported {
                carrier: CARRIER,
                operation: "balance query",
            })
        })
    }

    fn parse_receipt(&self, payload: &str) -> Result<ReceiptBatch, GatewayError> {
        let entries = wire::decode_receipts(payload).map_err(GatewayError::parse)?;
        Ok(Box::new(
            entries
                .into_iter()
                .map(|entry| ReceiptEntry::decode(entry).map_err(GatewayError::parse)),
        ))
    }
}
