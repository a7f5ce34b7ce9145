//! Delivery receipt ingestion.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::carrier::ReceiptBatch;
use crate::client::GatewayError;
use crate::domain::Carrier;
use crate::store::ReceiptStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Non-nominal receipts written.
    pub stored: usize,
    /// Delivered receipts, not written.
    pub nominal: usize,
    /// Entries that failed to decode.
    pub skipped: usize,
}

pub struct ReceiptReconciler {
    receipts: Arc<dyn ReceiptStore>,
}

impl ReceiptReconciler {
    pub fn new(receipts: Arc<dyn ReceiptStore>) -> Self {
        Self { receipts }
    }

    /// Persist every non-nominal receipt of a callback.
    ///
    /// Undecodable entries are logged and skipped. The first persistence failure stops the
    /// batch and is returned; receipts before it stay written.
    pub fn reconcile(
        &self,
        carrier: Carrier,
        batch: ReceiptBatch,
    ) -> Result<ReconcileReport, GatewayError> {
        let mut report = ReconcileReport::default();
        for receipt in batch {
            let receipt = match receipt {
                Ok(receipt) => receipt,
                Err(err) => {
                    warn!(%carrier, error = %err, "skipping undecodable receipt");
                    report.skipped += 1;
                    continue;
                }
            };

            if receipt.status.is_nominal() {
                report.nominal += 1;
                continue;
            }

            if let Err(err) = self.receipts.insert_receipt(&receipt) {
                error!(
                    %carrier,
                    message_id = receipt.message_id.as_str(),
                    error = %err,
                    "failed to store receipt, dropping the rest of the batch"
                );
                return Err(err.into());
            }
            debug!(
                %carrier,
                message_id = receipt.message_id.as_str(),
                status = receipt.status.code(),
                "stored receipt"
            );
            report.stored += 1;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{CarrierMessageId, DeliveryReceipt, Mobile, ReceiptStatus};
    use crate::store::{InMemoryStore, StoreError};

    fn receipt(id: &str, status: ReceiptStatus) -> Result<DeliveryReceipt, GatewayError> {
        Ok(DeliveryReceipt {
            message_id: CarrierMessageId::new(id).unwrap(),
            mobile: Mobile::new("15205201314").unwrap(),
            status,
            receipt_at: "201610251710".to_owned(),
        })
    }

    /// Accepts `capacity` writes, then fails.
    struct FlakyStore {
        capacity: Mutex<usize>,
    }

    impl ReceiptStore for FlakyStore {
        fn insert_receipt(&self, _receipt: &DeliveryReceipt) -> Result<(), StoreError> {
            let mut capacity = self.capacity.lock().unwrap();
            if *capacity == 0 {
                return Err(StoreError::Unavailable("disk full".to_owned()));
            }
            *capacity -= 1;
            Ok(())
        }
    }

    #[test]
    fn delivered_receipts_are_not_stored() {
        let store = Arc::new(InMemoryStore::new());
        let reconciler = ReceiptReconciler::new(store.clone());
        let batch: ReceiptBatch = Box::new(
            vec![
                receipt("1", ReceiptStatus::Delivered),
                receipt("2", ReceiptStatus::BlacklistedRecipient),
            ]
            .into_iter(),
        );

        let report = reconciler.reconcile(Carrier::Chuanglan, batch).unwrap();
        assert_eq!(report, ReconcileReport { stored: 1, nominal: 1, skipped: 0 });
        let stored = store.receipts().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status.code(), 15);
    }

    #[test]
    fn undecodable_entries_are_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let reconciler = ReceiptReconciler::new(store.clone());
        let bad = GatewayError::parse(crate::domain::ValidationError::Empty { field: "sid" });
        let batch: ReceiptBatch = Box::new(
            vec![Err(bad), receipt("2", ReceiptStatus::Expired)].into_iter(),
        );

        let report = reconciler.reconcile(Carrier::Yunpian, batch).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.stored, 1);
    }

    #[test]
    fn persistence_failure_aborts_the_rest() {
        let store = Arc::new(FlakyStore {
            capacity: Mutex::new(1),
        });
        let reconciler = ReceiptReconciler::new(store.clone());
        let batch: ReceiptBatch = Box::new(
            vec![
                receipt("1", ReceiptStatus::Undeliverable),
                receipt("2", ReceiptStatus::Undeliverable),
                receipt("3", ReceiptStatus::Undeliverable),
            ]
            .into_iter(),
        );

        let err = reconciler.reconcile(Carrier::Yunpian, batch).unwrap_err();
        assert!(matches!(err, GatewayError::Persistence(_)));
        assert_eq!(*store.capacity.lock().unwrap(), 0);
    }
}
