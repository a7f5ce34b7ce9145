use crate::domain::value::{CarrierMessageId, Mobile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Canonical delivery-receipt status shared by all carriers.
pub enum ReceiptStatus {
    Delivered,
    Expired,
    Undeliverable,
    Unknown,
    RejectedByCenter,
    BlacklistedRecipient,
    CarrierBusy,
    Rejected,
    /// Gateway-internal or unrecognized carrier status.
    Other,
}

impl ReceiptStatus {
    pub fn code(self) -> i16 {
        match self {
            Self::Delivered => 0,
            Self::Expired => 11,
            Self::Undeliverable => 12,
            Self::Unknown => 13,
            Self::RejectedByCenter => 14,
            Self::BlacklistedRecipient => 15,
            Self::CarrierBusy => 16,
            Self::Rejected => 17,
            Self::Other => 18,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Some(match code {
            0 => Self::Delivered,
            11 => Self::Expired,
            12 => Self::Undeliverable,
            13 => Self::Unknown,
            14 => Self::RejectedByCenter,
            15 => Self::BlacklistedRecipient,
            16 => Self::CarrierBusy,
            17 => Self::Rejected,
            18 => Self::Other,
            _ => return None,
        })
    }

    /// Nominal receipts are not persisted.
    pub fn is_nominal(self) -> bool {
        self == Self::Delivered
    }

    /// Map a Chuanglan report status (`DELIVRD`, `EXPIRED`, ...).
    pub fn from_chuanglan(status: &str) -> Self {
        match status.trim() {
            "DELIVRD" => Self::Delivered,
            "EXPIRED" => Self::Expired,
            "UNDELIV" => Self::Undeliverable,
            "UNKNOWN" => Self::Unknown,
            "REJECTD" => Self::RejectedByCenter,
            "DTBLACK" => Self::BlacklistedRecipient,
            "ERR:104" => Self::CarrierBusy,
            "REJECT" => Self::Rejected,
            _ => Self::Other,
        }
    }

    /// Map a Yunpian `report_status` (`SUCCESS` / `FAIL`).
    ///
    /// `SUCCESS` is recorded as undeliverable and every other value as nominal. Stored
    /// receipt rows have always been written with this polarity and consumers read them
    /// that way.
    pub fn from_yunpian(report_status: &str) -> Self {
        if report_status.trim() == "SUCCESS" {
            Self::Undeliverable
        } else {
            Self::Delivered
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One delivery outcome reported by a carrier.
pub struct DeliveryReceipt {
    pub message_id: CarrierMessageId,
    pub mobile: Mobile,
    pub status: ReceiptStatus,
    /// `yyyyMMddHHmm[ss]` as reported, without separators.
    pub receipt_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chuanglan_statuses_map_to_canonical_codes() {
        let cases = [
            ("DELIVRD", 0),
            ("EXPIRED", 11),
            ("UNDELIV", 12),
            ("UNKNOWN", 13),
            ("REJECTD", 14),
            ("DTBLACK", 15),
            ("ERR:104", 16),
            ("REJECT", 17),
            ("MK:0001", 18),
            ("", 18),
        ];
        for (status, code) in cases {
            assert_eq!(ReceiptStatus::from_chuanglan(status).code(), code, "{status}");
        }
    }

    #[test]
    fn only_delivered_is_nominal() {
        assert!(ReceiptStatus::Delivered.is_nominal());
        for code in 11..=18 {
            let status = ReceiptStatus::from_code(code).unwrap();
            assert!(!status.is_nominal());
            assert_eq!(status.code(), code);
        }
        assert_eq!(ReceiptStatus::from_code(5), None);
    }

    #[test]
    fn yunpian_success_is_recorded_as_undeliverable() {
        assert_eq!(
            ReceiptStatus::from_yunpian("SUCCESS"),
            ReceiptStatus::Undeliverable
        );
        assert!(ReceiptStatus::from_yunpian("FAIL").is_nominal());
    }
}
