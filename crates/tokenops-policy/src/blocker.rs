//! Readiness blockers.
//!
//! A blocker is a named reason an asset is not ready for a gated operation.
//! Blockers are transient data, never persisted and never errors.

use serde::{Deserialize, Serialize};

/// Stable blocker codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockerCode {
    AssetNotFound,
    IssuerNotApproved,
    XrplRequireAuthDisabled,
    EvmAllowlistDisabled,
}

impl BlockerCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetNotFound => "ASSET_NOT_FOUND",
            Self::IssuerNotApproved => "ISSUER_NOT_APPROVED",
            Self::XrplRequireAuthDisabled => "XRPL_REQUIRE_AUTH_DISABLED",
            Self::EvmAllowlistDisabled => "EVM_ALLOWLIST_DISABLED",
        }
    }
}

impl std::fmt::Display for BlockerCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reason an asset is not ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessBlocker {
    pub code: BlockerCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ReadinessBlocker {
    pub fn asset_not_found() -> Self {
        Self {
            code: BlockerCode::AssetNotFound,
            message: "Asset not found".to_string(),
            hint: None,
        }
    }

    pub fn issuer_not_approved() -> Self {
        Self {
            code: BlockerCode::IssuerNotApproved,
            message: "Asset has no approved issuing address".to_string(),
            hint: Some("Link an issuing address to the asset and complete its approval".to_string()),
        }
    }

    pub fn xrpl_require_auth_disabled() -> Self {
        Self {
            code: BlockerCode::XrplRequireAuthDisabled,
            message: "Gated XRPL assets require RequireAuth".to_string(),
            hint: Some(
                "Set requireAuth in the asset controls and enable RequireAuth on the issuing account"
                    .to_string(),
            ),
        }
    }

    pub fn evm_allowlist_disabled() -> Self {
        Self {
            code: BlockerCode::EvmAllowlistDisabled,
            message: "Gated EVM assets require a holder allowlist".to_string(),
            hint: Some("Set allowlistEnabled in the asset controls".to_string()),
        }
    }
}
