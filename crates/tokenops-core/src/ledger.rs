//! # Ledgers, Networks, and Addresses
//!
//! `Ledger` names the distributed ledger an asset lives on; `Network`
//! distinguishes production from test deployments of that ledger.
//! `LedgerAddress` is an account address validated against its ledger's
//! address format at construction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The distributed ledgers TokenOps can issue on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ledger {
    /// XRP Ledger (issued currencies / trustlines).
    Xrpl,
    /// EVM-compatible chains (ERC-20 style contracts).
    Evm,
}

impl Ledger {
    /// Stable string identifier, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xrpl => "XRPL",
            Self::Evm => "EVM",
        }
    }
}

impl std::fmt::Display for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ledger {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XRPL" => Ok(Self::Xrpl),
            "EVM" => Ok(Self::Evm),
            other => Err(ValidationError::UnknownVariant {
                kind: "ledger",
                value: other.to_string(),
            }),
        }
    }
}

/// Deployment network of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET",
            Self::Testnet => "TESTNET",
            Self::Devnet => "DEVNET",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAINNET" => Ok(Self::Mainnet),
            "TESTNET" => Ok(Self::Testnet),
            "DEVNET" => Ok(Self::Devnet),
            other => Err(ValidationError::UnknownVariant {
                kind: "network",
                value: other.to_string(),
            }),
        }
    }
}

/// The XRPL base58 alphabet (differs from Bitcoin's ordering).
const XRPL_ALPHABET: &str = "rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

/// An account address on a specific ledger.
///
/// Serializes as the bare address string. Construct with
/// [`LedgerAddress::parse`], which validates the format for the ledger.
/// The checksum is not verified here; the ledger rejects unknown accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LedgerAddress(String);

impl LedgerAddress {
    /// Validate `raw` as an address on `ledger`.
    ///
    /// - XRPL classic addresses start with `r`, are 25 to 35 characters,
    ///   and use the XRPL base58 alphabet.
    /// - EVM addresses are `0x` followed by 40 hex digits (any case).
    pub fn parse(ledger: Ledger, raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let invalid = |reason: &str| ValidationError::InvalidAddress {
            ledger,
            address: raw.to_string(),
            reason: reason.to_string(),
        };

        match ledger {
            Ledger::Xrpl => {
                if !raw.starts_with('r') {
                    return Err(invalid("classic address must start with 'r'"));
                }
                if !(25..=35).contains(&raw.len()) {
                    return Err(invalid("classic address must be 25-35 characters"));
                }
                if let Some(c) = raw.chars().find(|c| !XRPL_ALPHABET.contains(*c)) {
                    return Err(invalid(&format!("character {c:?} is not in the XRPL alphabet")));
                }
            }
            Ledger::Evm => {
                let Some(hex) = raw.strip_prefix("0x") else {
                    return Err(invalid("address must start with 0x"));
                };
                if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid("address must be 40 hex digits after 0x"));
                }
            }
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn test_xrpl_classic_address_accepted() {
        let addr = LedgerAddress::parse(Ledger::Xrpl, GENESIS).unwrap();
        assert_eq!(addr.as_str(), GENESIS);
    }

    #[test]
    fn test_xrpl_address_is_trimmed() {
        let addr = LedgerAddress::parse(Ledger::Xrpl, &format!("  {GENESIS}\n")).unwrap();
        assert_eq!(addr.as_str(), GENESIS);
    }

    #[test]
    fn test_xrpl_address_wrong_prefix_rejected() {
        let err = LedgerAddress::parse(Ledger::Xrpl, "xHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap_err();
        assert!(err.to_string().contains("must start with 'r'"));
    }

    #[test]
    fn test_xrpl_address_bad_alphabet_rejected() {
        // '0' and 'l' are not in the XRPL alphabet.
        assert!(LedgerAddress::parse(Ledger::Xrpl, "rHb9CJAWyB4rj91VRWn96DkukG4bwdty0l").is_err());
    }

    #[test]
    fn test_xrpl_address_too_short_rejected() {
        assert!(LedgerAddress::parse(Ledger::Xrpl, "rHb9CJ").is_err());
    }

    #[test]
    fn test_evm_address_accepted() {
        let raw = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert!(LedgerAddress::parse(Ledger::Evm, raw).is_ok());
    }

    #[test]
    fn test_evm_address_rejected_on_xrpl() {
        let raw = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert!(LedgerAddress::parse(Ledger::Xrpl, raw).is_err());
        assert!(LedgerAddress::parse(Ledger::Evm, GENESIS).is_err());
    }

    #[test]
    fn test_ledger_serde_matches_as_str() {
        for ledger in [Ledger::Xrpl, Ledger::Evm] {
            let json = serde_json::to_string(&ledger).unwrap();
            assert_eq!(json, format!("\"{}\"", ledger.as_str()));
            assert_eq!(ledger.as_str().parse::<Ledger>().unwrap(), ledger);
        }
    }

    #[test]
    fn test_network_from_str_is_case_sensitive() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert!("testnet".parse::<Network>().is_err());
    }
}
