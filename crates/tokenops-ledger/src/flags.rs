//! Account flag decoding.
//!
//! `account_info` returns the account root's `Flags` as a bitmask. Only the
//! bits TokenOps makes decisions on are named here.

use serde::{Deserialize, Serialize};

/// Account requires explicit authorization of trustlines before holders
/// can receive its issued currencies.
pub const REQUIRE_AUTH: u32 = 0x0001_0000;

/// Issuer has given up the ability to freeze trustlines.
pub const NO_FREEZE: u32 = 0x0020_0000;

/// All trustlines to the issuer are frozen.
pub const GLOBAL_FREEZE: u32 = 0x0040_0000;

/// Rippling is enabled by default on the account's trustlines.
pub const DEFAULT_RIPPLE: u32 = 0x0080_0000;

/// `TrustSet` transaction flag authorizing the counterparty's trustline.
pub const TF_SETF_AUTH: u32 = 0x0001_0000;

/// A decoded account flags bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountFlags(pub u32);

impl AccountFlags {
    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn require_auth(&self) -> bool {
        self.contains(REQUIRE_AUTH)
    }

    pub fn global_freeze(&self) -> bool {
        self.contains(GLOBAL_FREEZE)
    }
}

impl From<u32> for AccountFlags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_auth_bit() {
        assert!(AccountFlags(REQUIRE_AUTH).require_auth());
        assert!(AccountFlags(REQUIRE_AUTH | DEFAULT_RIPPLE).require_auth());
        assert!(!AccountFlags(0).require_auth());
        assert!(!AccountFlags(DEFAULT_RIPPLE | GLOBAL_FREEZE).require_auth());
    }

    #[test]
    fn test_other_bits_do_not_leak() {
        let flags = AccountFlags(NO_FREEZE);
        assert!(!flags.global_freeze());
        assert!(flags.contains(NO_FREEZE));
    }
}
