//! Carrier providers behind one capability set.

use crate::client::{BoxFuture, GatewayError};
use crate::domain::{
    AccountClass, BalanceReport, Carrier, CarrierMessageId, DeliveryReceipt, MessageText, Mobile,
    Segmentation, ValidationError, YunpianSendResult,
};
use crate::registry::ProviderProfile;

mod chuanglan;
mod yunpian;

pub use chuanglan::ChuanglanProvider;
pub use yunpian::YunpianProvider;

/// Lazily decoded receipts of one callback payload; each item fails on its own.
pub type ReceiptBatch = Box<dyn Iterator<Item = Result<DeliveryReceipt, GatewayError>> + Send>;

#[derive(Debug)]
/// Outcome of one carrier submission.
///
/// A result is produced whenever a request reached (or was attempted against) the carrier;
/// failures before that point are returned as `Err` from the send call instead.
pub struct SendAttemptResult {
    pub segmentation: Segmentation,
    pub message_id: Option<CarrierMessageId>,
    /// `0` on success, otherwise the carrier or canonical error code.
    pub status_code: i32,
    pub error: Option<GatewayError>,
    /// Per-recipient outcomes for carriers that report them.
    pub recipients: Vec<YunpianSendResult>,
}

impl SendAttemptResult {
    pub fn accepted(segmentation: Segmentation, message_id: Option<CarrierMessageId>) -> Self {
        Self {
            segmentation,
            message_id,
            status_code: 0,
            error: None,
            recipients: Vec::new(),
        }
    }

    pub fn failed(segmentation: Segmentation, error: GatewayError) -> Self {
        Self {
            segmentation,
            message_id: None,
            status_code: error.code(),
            error: Some(error),
            recipients: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }

    /// Message id(s) to store with the send record: the single id, or the accepted
    /// per-recipient ids comma-joined.
    pub fn recorded_message_id(&self) -> String {
        if let Some(id) = &self.message_id {
            return id.as_str().to_owned();
        }
        self.recipients
            .iter()
            .filter(|result| result.code.is_ok())
            .filter_map(|result| result.message_id.as_ref())
            .map(CarrierMessageId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Capability set shared by all carriers.
pub trait Provider: Send + Sync {
    fn carrier(&self) -> Carrier;

    /// Capability row of the active configuration, or `ProviderUnavailable`.
    fn profile(&self) -> BoxFuture<'_, Result<ProviderProfile, GatewayError>>;

    fn send_verification<'a>(
        &'a self,
        text: &'a MessageText,
        recipients: &'a [Mobile],
    ) -> BoxFuture<'a, Result<SendAttemptResult, GatewayError>>;

    fn send_marketing<'a>(
        &'a self,
        text: &'a MessageText,
        recipients: &'a [Mobile],
    ) -> BoxFuture<'a, Result<SendAttemptResult, GatewayError>>;

    fn query_balance(
        &self,
        class: AccountClass,
    ) -> BoxFuture<'_, Result<BalanceReport, GatewayError>>;

    /// Split a raw callback payload into receipts.
    fn parse_receipt(&self, payload: &str) -> Result<ReceiptBatch, GatewayError>;
}

fn require_recipients(recipients: &[Mobile]) -> Result<(), ValidationError> {
    if recipients.is_empty() {
        return Err(ValidationError::Empty {
            field: Mobile::FIELD,
        });
    }
    Ok(())
}

fn rejected(carrier: Carrier, code: i32, message: Option<&'static str>) -> GatewayError {
    GatewayError::CarrierRejected {
        carrier,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YunpianCode;

    fn result(code: i32, sid: &str) -> YunpianSendResult {
        YunpianSendResult {
            code: YunpianCode::new(code),
            msg: None,
            count: 1,
            fee_minor: 5,
            message_id: CarrierMessageId::non_empty(sid),
            mobile: None,
        }
    }

    #[test]
    fn recorded_message_id_prefers_single_id() {
        let attempt = SendAttemptResult::accepted(
            Segmentation::default(),
            CarrierMessageId::non_empty("161025"),
        );
        assert_eq!(attempt.recorded_message_id(), "161025");

        let mut batch = SendAttemptResult::accepted(Segmentation::default(), None);
        batch.recipients = vec![result(0, "1"), result(8, "2"), result(0, "3")];
        assert_eq!(batch.recorded_message_id(), "1,3");
    }

    #[test]
    fn failed_attempt_carries_code() {
        let attempt = SendAttemptResult::failed(
            Segmentation::default(),
            rejected(Carrier::Chuanglan, 104, Some("system busy")),
        );
        assert!(!attempt.is_accepted());
        assert_eq!(attempt.status_code, 104);
        assert_eq!(attempt.recorded_message_id(), "");
    }
}
