//! Account and asset identifiers.
//!
//! Both are 20-byte addresses. The all-zero value is the null address and is
//! rejected wherever a real counterparty or asset is required.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::OpenbondError;

/// Number of bytes in an address.
pub const ADDRESS_LEN: usize = 20;

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
        pub struct $name(pub [u8; ADDRESS_LEN]);

        impl $name {
            /// The null address.
            pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

            #[must_use]
            pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
                Self(bytes)
            }

            /// Build an address whose low 8 bytes hold `n` big-endian.
            /// Handy for fixtures and configuration.
            #[must_use]
            pub fn from_low_u64(n: u64) -> Self {
                let mut bytes = [0u8; ADDRESS_LEN];
                bytes[ADDRESS_LEN - 8..].copy_from_slice(&n.to_be_bytes());
                Self(bytes)
            }

            #[must_use]
            pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
                &self.0
            }

            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; ADDRESS_LEN]
            }

            /// First four bytes, hex encoded. For log lines.
            #[must_use]
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = OpenbondError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                let decoded = hex::decode(raw).map_err(|e| {
                    OpenbondError::Serialization(format!("bad address {s}: {e}"))
                })?;
                let bytes: [u8; ADDRESS_LEN] = decoded.try_into().map_err(|_| {
                    OpenbondError::Serialization(format!(
                        "bad address {s}: expected {ADDRESS_LEN} bytes"
                    ))
                })?;
                Ok(Self(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

address_type!(
    /// An account: a buyer, seller, trader, or one of the engines' own
    /// custody accounts.
    AccountId
);

address_type!(
    /// Identifier of a fungible asset tracked by the external ledger.
    AssetId
);

#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// Random non-null account for tests.
    #[must_use]
    pub fn random() -> Self {
        let mut bytes: [u8; ADDRESS_LEN] = rand::random();
        bytes[0] |= 1;
        Self(bytes)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AssetId {
    /// Random non-null asset for tests.
    #[must_use]
    pub fn random() -> Self {
        let mut bytes: [u8; ADDRESS_LEN] = rand::random();
        bytes[0] |= 1;
        Self(bytes)
    }
}
