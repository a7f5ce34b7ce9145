//! Domain layer: strong types with validation and invariants (no I/O).

mod code;
mod receipt;
mod request;
mod response;
mod segment;
mod template;
mod validation;
mod value;

pub use code::{ChuanglanCode, KnownChuanglanCode, KnownYunpianCode, Severity, YunpianCode};
pub use receipt::{DeliveryReceipt, ReceiptStatus};
pub use request::{
    AccountClass, BATCH_SEND_MAX_RECIPIENTS, BatchSend, OutboundMessage, PerRecipient,
    SameContent, TrafficClass,
};
pub use response::{
    BalanceReport, ChuanglanBalance, ChuanglanReply, YunpianBatchResponse, YunpianSendResult,
};
pub use segment::{Segmentation, segment};
pub use template::{marketing_freeform, render as render_template};
pub use validation::ValidationError;
pub use value::{
    Account, ApiKey, Carrier, CarrierMessageId, CompanyId, MaxLength, MessageText, Mobile,
    Password, PhoneNumber, TemplateId,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn mobiles(count: usize) -> Vec<Mobile> {
        (0..count)
            .map(|idx| Mobile::new(format!("138{:08}", idx)).unwrap())
            .collect()
    }

    fn texts(count: usize) -> Vec<MessageText> {
        (0..count)
            .map(|idx| MessageText::new(format!("hello {idx}")).unwrap())
            .collect()
    }

    #[test]
    fn outbound_message_requires_recipients() {
        let msg = MessageText::new("hi").unwrap();
        let err = OutboundMessage::marketing(msg.clone(), Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Empty {
                field: Mobile::FIELD
            }
        ));

        let out = OutboundMessage::verification(msg, mobiles(2)).unwrap();
        assert_eq!(out.class(), TrafficClass::Verification);
        assert_eq!(out.recipients().len(), 2);
    }

    #[test]
    fn batch_per_recipient_rejects_length_mismatch() {
        let err = BatchSend::per_recipient(texts(2), mobiles(3)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::LengthMismatch {
                contents: 2,
                mobiles: 3
            }
        );
    }

    #[test]
    fn batch_recipient_limit_is_enforced() {
        let text = MessageText::new("hi").unwrap();
        let err = BatchSend::same_content(mobiles(BATCH_SEND_MAX_RECIPIENTS + 1), text.clone())
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooManyRecipients { .. }));

        let err = BatchSend::per_recipient(
            texts(BATCH_SEND_MAX_RECIPIENTS + 1),
            mobiles(BATCH_SEND_MAX_RECIPIENTS + 1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooManyRecipients {
                max: BATCH_SEND_MAX_RECIPIENTS,
                ..
            }
        ));

        let ok = BatchSend::same_content(mobiles(BATCH_SEND_MAX_RECIPIENTS), text).unwrap();
        assert_eq!(ok.recipient_count(), BATCH_SEND_MAX_RECIPIENTS);
    }

    #[test]
    fn batch_rejects_empty_lists() {
        let err = BatchSend::per_recipient(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn account_class_codes() {
        assert_eq!(
            AccountClass::from_code(1).unwrap(),
            AccountClass::Verification
        );
        assert_eq!(AccountClass::from_code(2).unwrap().code(), 2);
        assert!(AccountClass::from_code(0).is_err());
        assert_eq!(
            AccountClass::from(TrafficClass::Marketing),
            AccountClass::Marketing
        );
    }
}
