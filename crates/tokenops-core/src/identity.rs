//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every persistent record identifier in TokenOps.
//! These prevent accidental identifier confusion: an `IssuanceId` cannot be
//! passed where an `AssetId` is expected, even though both are UUIDs.
//!
//! All identifiers serialize transparently as their UUID string so the JSON
//! shapes stay `{"assetId": "6f1c…"}` rather than a nested object.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            /// Accepts either the bare UUID or the prefixed display form.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a tenant organization.
    OrganizationId,
    "org"
);

uuid_identifier!(
    /// Unique identifier for a tokenizable asset.
    AssetId,
    "asset"
);

uuid_identifier!(
    /// Unique identifier for an issuing address record.
    IssuingAddressId,
    "issuer"
);

uuid_identifier!(
    /// Unique identifier for a submitted issuance transaction.
    IssuanceId,
    "issuance"
);

uuid_identifier!(
    /// Unique identifier for a regulatory requirement template.
    TemplateId,
    "template"
);

uuid_identifier!(
    /// Unique identifier for a per-asset requirement instance.
    RequirementInstanceId,
    "requirement"
);
