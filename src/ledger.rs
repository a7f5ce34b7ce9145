//! Sending quota held by the account authority.
//!
//! Reads and writes are two separate remote calls with no lock in between; concurrent sends can
//! both pass the gate before either debit lands.

use std::sync::Arc;

use tracing::debug;

use crate::authority::{AccountAuthority, SmsCounts};
use crate::client::GatewayError;
use crate::domain::CompanyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    pub platform_verification: i64,
    pub platform_marketing: i64,
    pub company_remaining: i64,
}

impl From<SmsCounts> for Balances {
    fn from(counts: SmsCounts) -> Self {
        Self {
            platform_verification: counts.platform_verification_count,
            platform_marketing: counts.platform_marketing_count,
            company_remaining: counts.company_sms_remaining_count,
        }
    }
}

#[derive(Clone)]
pub struct QuotaLedger {
    authority: Arc<dyn AccountAuthority>,
}

impl QuotaLedger {
    pub fn new(authority: Arc<dyn AccountAuthority>) -> Self {
        Self { authority }
    }

    pub async fn balances(&self, company: CompanyId) -> Result<Balances, GatewayError> {
        Ok(self.authority.remaining_sms(company).await?.into())
    }

    /// Apply signed deltas.
    pub async fn adjust(
        &self,
        company: CompanyId,
        verification: i64,
        marketing: i64,
        company_delta: i64,
    ) -> Result<(), GatewayError> {
        debug!(
            company = company.value(),
            verification, marketing, company_delta, "adjusting sms balances"
        );
        self.authority
            .update_sms_count(
                company,
                SmsCounts {
                    platform_verification_count: verification,
                    platform_marketing_count: marketing,
                    company_sms_remaining_count: company_delta,
                },
            )
            .await
    }

    /// Fail with [`GatewayError::QuotaExhausted`] unless both the platform marketing pool and
    /// the company balance are positive.
    pub async fn ensure_marketing_quota(
        &self,
        company: CompanyId,
    ) -> Result<Balances, GatewayError> {
        let balances = self.balances(company).await?;
        if balances.platform_marketing <= 0 || balances.company_remaining <= 0 {
            return Err(GatewayError::QuotaExhausted { company });
        }
        Ok(balances)
    }

    pub async fn debit_marketing(
        &self,
        company: CompanyId,
        units: u32,
    ) -> Result<(), GatewayError> {
        let units = i64::from(units);
        self.adjust(company, 0, -units, -units).await
    }

    /// Verification traffic is drawn from the platform marketing pool under the system company.
    pub async fn debit_verification(&self, units: u32) -> Result<(), GatewayError> {
        self.adjust(CompanyId::SYSTEM, 0, -i64::from(units), 0).await
    }
}
