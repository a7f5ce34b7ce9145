//! Per-carrier configuration, resolved once and memoized.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::authority::{AccountAuthority, ChuanglanAccountInfo, YunpianAccountInfo};
use crate::client::GatewayError;
use crate::domain::{Account, AccountClass, ApiKey, Carrier, Password, ValidationError};
use crate::store::{ProviderRow, ProviderStore};
use crate::transport::yunpian::DEFAULT_API_BASE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPair {
    pub account: Account,
    pub password: Password,
}

impl AccountPair {
    fn new(account: String, password: String) -> Result<Self, ValidationError> {
        Ok(Self {
            account: Account::new(account)?,
            password: Password::new(password)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChuanglanCredentials {
    pub verification: AccountPair,
    pub marketing: AccountPair,
    pub send_url: String,
    pub balance_url: String,
}

impl ChuanglanCredentials {
    pub fn pair(&self, class: AccountClass) -> &AccountPair {
        match class {
            AccountClass::Verification => &self.verification,
            AccountClass::Marketing => &self.marketing,
        }
    }
}

impl TryFrom<ChuanglanAccountInfo> for ChuanglanCredentials {
    type Error = ValidationError;

    fn try_from(info: ChuanglanAccountInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            verification: AccountPair::new(info.verification_account, info.verification_password)?,
            marketing: AccountPair::new(info.marketing_account, info.marketing_password)?,
            send_url: info.http_api,
            balance_url: info.query_balance_http_api,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YunpianCredentials {
    /// Key for single sends.
    pub single_api_key: ApiKey,
    /// Key for batch and multi sends.
    pub group_api_key: ApiKey,
    pub api_base: String,
    pub callback_url: String,
}

impl TryFrom<YunpianAccountInfo> for YunpianCredentials {
    type Error = ValidationError;

    fn try_from(info: YunpianAccountInfo) -> Result<Self, Self::Error> {
        let api_base = if info.http_api.trim().is_empty() {
            DEFAULT_API_BASE.to_owned()
        } else {
            info.http_api.trim().trim_end_matches('/').to_owned()
        };
        Ok(Self {
            single_api_key: ApiKey::new(info.single_api_key)?,
            group_api_key: ApiKey::new(info.group_api_key)?,
            api_base,
            callback_url: info.receiver_http_api,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Capability row fields a provider needs.
pub struct ProviderProfile {
    pub provider_id: i64,
    pub sign_name: String,
    /// Characters per segment; always positive once resolved.
    pub max_length: i64,
}

impl From<ProviderRow> for ProviderProfile {
    fn from(row: ProviderRow) -> Self {
        Self {
            provider_id: row.provider_id,
            sign_name: row.sign_name,
            max_length: row.single_sms_max_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig<C> {
    pub credentials: C,
    pub profile: ProviderProfile,
}

pub type ChuanglanConfig = ProviderConfig<ChuanglanCredentials>;
pub type YunpianConfig = ProviderConfig<YunpianCredentials>;

/// Memo slot guarded by an async mutex. Absent configurations are not cached.
struct ConfigCell<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> ConfigCell<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    async fn get_or_resolve<F, Fut>(&self, resolve: F) -> Result<Option<Arc<T>>, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, GatewayError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(config) = slot.as_ref() {
            return Ok(Some(Arc::clone(config)));
        }

        let Some(config) = resolve().await? else {
            return Ok(None);
        };
        let config = Arc::new(config);
        *slot = Some(Arc::clone(&config));
        Ok(Some(config))
    }
}

/// Resolves carrier configuration from the account authority and the provider store.
pub struct ProviderRegistry {
    authority: Arc<dyn AccountAuthority>,
    providers: Arc<dyn ProviderStore>,
    chuanglan: ConfigCell<ChuanglanConfig>,
    yunpian: ConfigCell<YunpianConfig>,
}

impl ProviderRegistry {
    pub fn new(authority: Arc<dyn AccountAuthority>, providers: Arc<dyn ProviderStore>) -> Self {
        Self {
            authority,
            providers,
            chuanglan: ConfigCell::new(),
            yunpian: ConfigCell::new(),
        }
    }

    /// Enabled row for `carrier`, or `None` when absent or without a positive max length.
    fn usable_row(&self, carrier: Carrier) -> Result<Option<ProviderRow>, GatewayError> {
        let Some(row) = self.providers.enabled_provider(carrier)? else {
            warn!(%carrier, "no enabled provider row");
            return Ok(None);
        };
        if row.single_sms_max_length <= 0 {
            warn!(
                %carrier,
                provider_id = row.provider_id,
                "provider row has no usable max length"
            );
            return Ok(None);
        }
        Ok(Some(row))
    }

    /// Chuanglan configuration, or `None` while no enabled row with a positive max length exists.
    pub async fn chuanglan(&self) -> Result<Option<Arc<ChuanglanConfig>>, GatewayError> {
        self.chuanglan
            .get_or_resolve(|| async {
                let info = self.authority.chuanglan_account_info().await?;
                let Some(row) = self.usable_row(Carrier::Chuanglan)? else {
                    return Ok(None);
                };
                let config = ProviderConfig {
                    credentials: ChuanglanCredentials::try_from(info)?,
                    profile: ProviderProfile::from(row),
                };
                info!(
                    provider_id = config.profile.provider_id,
                    max_length = config.profile.max_length,
                    "resolved chuanglan configuration"
                );
                Ok::<_, GatewayError>(Some(config))
            })
            .await
    }

    /// Yunpian configuration, or `None` while no enabled row with a positive max length exists.
    pub async fn yunpian(&self) -> Result<Option<Arc<YunpianConfig>>, GatewayError> {
        self.yunpian
            .get_or_resolve(|| async {
                let info = self.authority.yunpian_account_info().await?;
                let Some(row) = self.usable_row(Carrier::Yunpian)? else {
                    return Ok(None);
                };
                let config = ProviderConfig {
                    credentials: YunpianCredentials::try_from(info)?,
                    profile: ProviderProfile::from(row),
                };
                info!(
                    provider_id = config.profile.provider_id,
                    max_length = config.profile.max_length,
                    "resolved yunpian configuration"
                );
                Ok::<_, GatewayError>(Some(config))
            })
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::authority::fake::FakeAuthority;

    #[tokio::test]
    async fn resolves_once_and_memoizes() {
        let authority = FakeAuthority::new().with_chuanglan(chuanglan_info());
        let registry = ProviderRegistry::new(
            Arc::new(authority.clone()),
            store_with(vec![provider_row(Carrier::Chuanglan, 7, 70)]),
        );

        let first = registry.chuanglan().await.unwrap().unwrap();
        let second = registry.chuanglan().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(authority.info_calls(), 1);
        assert_eq!(first.profile.provider_id, 7);
        assert_eq!(
            first.credentials.pair(AccountClass::Marketing).account.as_str(),
            "M001"
        );
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_resolution() {
        let authority = FakeAuthority::new().with_chuanglan(chuanglan_info());
        let registry = Arc::new(ProviderRegistry::new(
            Arc::new(authority.clone()),
            store_with(vec![provider_row(Carrier::Chuanglan, 7, 70)]),
        ));

        let handles = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.chuanglan().await.unwrap().unwrap() })
            })
            .collect::<Vec<_>>();
        let mut configs = Vec::new();
        for handle in handles {
            configs.push(handle.await.unwrap());
        }
        assert!(configs.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(authority.info_calls(), 1);
    }

    #[tokio::test]
    async fn missing_row_is_not_cached() {
        let authority = FakeAuthority::new().with_chuanglan(chuanglan_info());
        let registry = ProviderRegistry::new(Arc::new(authority.clone()), store_with(Vec::new()));

        assert!(registry.chuanglan().await.unwrap().is_none());
        assert!(registry.chuanglan().await.unwrap().is_none());
        assert_eq!(authority.info_calls(), 2);
    }

    #[tokio::test]
    async fn authority_failure_surfaces_and_is_not_cached() {
        let authority = FakeAuthority::new();
        let registry = ProviderRegistry::new(
            Arc::new(authority.clone()),
            store_with(vec![provider_row(Carrier::Yunpian, 3, 70)]),
        );

        let err = registry.yunpian().await.unwrap_err();
        assert_eq!(err.kind(), crate::client::ErrorKind::TransportFailure);
        let _ = registry.yunpian().await;
        assert_eq!(authority.info_calls(), 2);
    }

    #[tokio::test]
    async fn yunpian_without_max_length_is_unavailable() {
        let authority = FakeAuthority::new().with_yunpian(yunpian_info());
        let registry = ProviderRegistry::new(
            Arc::new(authority),
            store_with(vec![provider_row(Carrier::Yunpian, 3, 0)]),
        );
        assert!(registry.yunpian().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn chuanglan_without_max_length_is_unavailable_and_not_cached() {
        let authority = FakeAuthority::new().with_chuanglan(chuanglan_info());
        let registry = ProviderRegistry::new(
            Arc::new(authority.clone()),
            store_with(vec![provider_row(Carrier::Chuanglan, 1, 0)]),
        );
        assert!(registry.chuanglan().await.unwrap().is_none());
        assert!(registry.chuanglan().await.unwrap().is_none());
        assert_eq!(authority.info_calls(), 2);
    }

    #[test]
    fn yunpian_api_base_defaults() {
        let mut info = yunpian_info();
        info.http_api = " ".to_owned();
        let credentials = YunpianCredentials::try_from(info).unwrap();
        assert_eq!(credentials.api_base, DEFAULT_API_BASE);
    }
}
