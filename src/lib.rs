//! SMS dispatch gateway for the Chuanglan and Yunpian carriers.
//!
//! Layers, bottom up: `domain` holds strong types with validation and no I/O, `transport`
//! encodes and decodes each carrier's wire format, and `client` is the HTTP seam plus the
//! pipeline error. On top sit the carrier providers, the provider registry, the quota ledger,
//! the receipt reconciler and the send orchestrator, exposed over HTTP by `server`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sms_gateway::authority::HttpAccountAuthority;
//! use sms_gateway::carrier::{ChuanglanProvider, Provider};
//! use sms_gateway::client::ReqwestTransport;
//! use sms_gateway::registry::ProviderRegistry;
//! use sms_gateway::store::InMemoryStore;
//! use sms_gateway::{AccountClass, GatewayError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GatewayError> {
//!     let http = Arc::new(ReqwestTransport::new());
//!     let authority = Arc::new(HttpAccountAuthority::new("http://accounts:9000", http.clone()));
//!     let registry = Arc::new(ProviderRegistry::new(authority, Arc::new(InMemoryStore::new())));
//!     let chuanglan = ChuanglanProvider::new(registry, http);
//!     let balance = chuanglan.query_balance(AccountClass::Marketing).await?;
//!     println!("{} messages left", balance.remaining_count);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod authority;
pub mod carrier;
pub mod client;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod orchestrator;
pub mod reconcile;
pub mod registry;
pub mod server;
pub mod store;
mod transport;
pub mod verification;

pub use client::{ErrorKind, GatewayError};
pub use config::{ConfigError, GatewayConfig};
pub use domain::{
    AccountClass, Carrier, CarrierMessageId, CompanyId, DeliveryReceipt, MessageText, Mobile,
    PhoneNumber, ReceiptStatus, Segmentation, TemplateId, ValidationError,
};
pub use orchestrator::{MarketingRequest, SendOrchestrator, SendOutcome};
