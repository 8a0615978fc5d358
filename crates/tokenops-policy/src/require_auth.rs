//! RequireAuth verification against the ledger.
//!
//! Both entry points report failures inside the result. A caller rendering
//! a readiness screen always gets a value back, with `error` set when the
//! ledger or store could not answer.

use serde::Serialize;

use tokenops_core::{AssetId, LedgerAddress};
use tokenops_ledger::{AccountInfo, LedgerAdapter};
use tokenops_store::Store;

/// Outcome of reading an account's RequireAuth flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequireAuthCheck {
    pub has_require_auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_info: Option<AccountInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequireAuthCheck {
    fn failed(error: String) -> Self {
        Self {
            has_require_auth: false,
            account_info: None,
            error: Some(error),
        }
    }
}

/// Read `address`'s account flags and test the RequireAuth bit.
pub async fn check_require_auth(
    ledger: &dyn LedgerAdapter,
    address: &LedgerAddress,
) -> RequireAuthCheck {
    match ledger.account_info(address).await {
        Ok(info) => RequireAuthCheck {
            has_require_auth: info.require_auth(),
            account_info: Some(info),
            error: None,
        },
        Err(e) => {
            tracing::warn!(address = %address, error = %e, "RequireAuth check failed");
            RequireAuthCheck::failed(e.to_string())
        }
    }
}

/// RequireAuth check for an asset's issuing address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequireAuthValidation {
    pub asset_id: AssetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_address: Option<LedgerAddress>,
    pub has_require_auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_info: Option<AccountInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequireAuthValidation {
    fn failed(asset_id: AssetId, error: impl Into<String>) -> Self {
        Self {
            asset_id,
            issuer_address: None,
            has_require_auth: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Resolve an asset's issuing address and check its RequireAuth flag.
///
/// Missing records and store failures come back as `error`, never `Err`.
pub async fn validate_asset_require_auth(
    store: &dyn Store,
    ledger: &dyn LedgerAdapter,
    asset_id: AssetId,
) -> RequireAuthValidation {
    let asset = match store.get_asset(asset_id).await {
        Ok(Some(asset)) => asset,
        Ok(None) => return RequireAuthValidation::failed(asset_id, "Asset not found"),
        Err(e) => {
            tracing::warn!(asset_id = %asset_id, error = %e, "failed to load asset");
            return RequireAuthValidation::failed(asset_id, format!("Failed to load asset: {e}"));
        }
    };

    let Some(issuer_id) = asset.issuing_address_id else {
        return RequireAuthValidation::failed(asset_id, "Asset has no issuing address");
    };
    let issuer = match store.get_issuing_address(issuer_id).await {
        Ok(Some(issuer)) => issuer,
        Ok(None) => {
            return RequireAuthValidation::failed(
                asset_id,
                format!("Issuing address {issuer_id} not found"),
            )
        }
        Err(e) => {
            tracing::warn!(asset_id = %asset_id, error = %e, "failed to load issuing address");
            return RequireAuthValidation::failed(
                asset_id,
                format!("Failed to load issuing address: {e}"),
            );
        }
    };

    let check = check_require_auth(ledger, &issuer.address).await;
    RequireAuthValidation {
        asset_id,
        issuer_address: Some(issuer.address),
        has_require_auth: check.has_require_auth,
        account_info: check.account_info,
        error: check.error,
    }
}
