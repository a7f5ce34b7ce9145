//! Persistence seams for provider rows, templates, send records and receipts.
//!
//! The gateway only needs a handful of reads and appends, so each concern is a small trait.
//! [`InMemoryStore`] implements all of them and can be seeded from a JSON file.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Carrier, CompanyId, DeliveryReceipt, TemplateId};

/// Row status for live (not soft-deleted) records.
pub const STATUS_VALID: i16 = 0;
/// `is_valid` value of an enabled provider.
pub const PROVIDER_ENABLED: i16 = 20;
/// `check_status` value of an approved template.
pub const TEMPLATE_APPROVED: i16 = 20;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read seed file {path}: {source}")]
    SeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed data: {0}")]
    SeedJson(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Carrier capability row (`sms_service_providers`).
pub struct ProviderRow {
    pub provider_id: i64,
    #[serde(rename = "type")]
    pub provider_type: i16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub sign_name: String,
    #[serde(default)]
    pub single_sms_max_length: i64,
    #[serde(default = "enabled")]
    pub is_valid: i16,
    #[serde(default)]
    pub status: i16,
}

fn enabled() -> i16 {
    PROVIDER_ENABLED
}

fn approved() -> i16 {
    TEMPLATE_APPROVED
}

impl ProviderRow {
    pub fn is_enabled_for(&self, carrier: Carrier) -> bool {
        self.provider_type == carrier.provider_type()
            && self.status == STATUS_VALID
            && self.is_valid == PROVIDER_ENABLED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Message template with positional `%s`/`%d`/`%v` placeholders.
pub struct Template {
    pub template_id: i64,
    pub provider_id: i64,
    pub template_name: String,
    pub template_content: String,
    #[serde(default = "approved")]
    pub check_status: i16,
    #[serde(default)]
    pub status: i16,
}

impl Template {
    pub fn id(&self) -> TemplateId {
        TemplateId::new(self.template_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One send attempt, written whether or not the carrier accepted it.
pub struct SendRecord {
    pub template_id: TemplateId,
    pub company_id: CompanyId,
    pub content: String,
    pub receiver_mobiles: String,
    /// Carrier status code as text (`"0"` on success).
    pub send_status: String,
    pub count: u32,
    pub count_per_content: u32,
    pub message_id: String,
    pub send_at: DateTime<Utc>,
}

pub trait ProviderStore: Send + Sync {
    /// First enabled row for the carrier, if any.
    fn enabled_provider(&self, carrier: Carrier) -> Result<Option<ProviderRow>, StoreError>;
}

pub trait TemplateStore: Send + Sync {
    fn template(&self, id: TemplateId) -> Result<Option<Template>, StoreError>;

    /// Approved, live template of a provider by name.
    fn template_by_name(
        &self,
        provider_id: i64,
        name: &str,
    ) -> Result<Option<Template>, StoreError>;
}

pub trait SendRecordStore: Send + Sync {
    /// Append a record and return its id.
    fn insert_send_record(&self, record: SendRecord) -> Result<i64, StoreError>;
}

pub trait ReceiptStore: Send + Sync {
    fn insert_receipt(&self, receipt: &DeliveryReceipt) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Initial contents of an [`InMemoryStore`].
pub struct SeedData {
    #[serde(default)]
    pub providers: Vec<ProviderRow>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::SeedIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Default)]
struct Inner {
    providers: Vec<ProviderRow>,
    templates: Vec<Template>,
    send_records: Vec<(i64, SendRecord)>,
    receipts: Vec<DeliveryReceipt>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: SeedData) -> Self {
        Self {
            inner: Mutex::new(Inner {
                providers: seed.providers,
                templates: seed.templates,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn send_records(&self) -> Result<Vec<SendRecord>, StoreError> {
        Ok(self
            .lock()?
            .send_records
            .iter()
            .map(|(_, record)| record.clone())
            .collect())
    }

    pub fn receipts(&self) -> Result<Vec<DeliveryReceipt>, StoreError> {
        Ok(self.lock()?.receipts.clone())
    }
}

impl ProviderStore for InMemoryStore {
    fn enabled_provider(&self, carrier: Carrier) -> Result<Option<ProviderRow>, StoreError> {
        Ok(self
            .lock()?
            .providers
            .iter()
            .find(|row| row.is_enabled_for(carrier))
            .cloned())
    }
}

impl TemplateStore for InMemoryStore {
    fn template(&self, id: TemplateId) -> Result<Option<Template>, StoreError> {
        Ok(self
            .lock()?
            .templates
            .iter()
            .find(|template| template.template_id == id.value())
            .cloned())
    }

    fn template_by_name(
        &self,
        provider_id: i64,
        name: &str,
    ) -> Result<Option<Template>, StoreError> {
        Ok(self
            .lock()?
            .templates
            .iter()
            .find(|template| {
                template.provider_id == provider_id
                    && template.template_name == name
                    && template.check_status == TEMPLATE_APPROVED
                    && template.status == STATUS_VALID
            })
            .cloned())
    }
}

impl SendRecordStore for InMemoryStore {
    fn insert_send_record(&self, record: SendRecord) -> Result<i64, StoreError> {
        let mut inner = self.lock()?;
        let id = i64::try_from(inner.send_records.len()).unwrap_or(i64::MAX - 1) + 1;
        inner.send_records.push((id, record));
        Ok(id)
    }
}

impl ReceiptStore for InMemoryStore {
    fn insert_receipt(&self, receipt: &DeliveryReceipt) -> Result<(), StoreError> {
        self.lock()?.receipts.push(receipt.clone());
        Ok(())
    }
}
