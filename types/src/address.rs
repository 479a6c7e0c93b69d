//! Participant address type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 20-byte participant identity, rendered as `0x`-prefixed lowercase hex.
///
/// Verifiers, administrators and collaborating components (the staking
/// ledger, the token) are all identified by an `Address`. The all-zero
/// address is the null identity and is never a valid owner.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    /// The null identity.
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// An address with every byte set to `byte`. Handy for fixtures.
    pub fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| TypesError::InvalidAddress(format!("{s}: {e}")))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidAddress(format!("{s}: expected 20 bytes")))?;
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_lowercase_hex() {
        let addr = Address::repeat_byte(0xab);
        assert_eq!(addr.to_string(), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn parse_accepts_with_and_without_prefix() {
        let with: Address = format!("0x{}", "11".repeat(20)).parse().unwrap();
        let without: Address = "11".repeat(20).parse().unwrap();
        assert_eq!(with, without);
        assert_eq!(with, Address::repeat_byte(0x11));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!(format!("0x{}", "11".repeat(21)).parse::<Address>().is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(format!("0x{}", "zz".repeat(20)).parse::<Address>().is_err());
    }

    #[test]
    fn zero_is_null_identity() {
        assert!(Address::ZERO.is_zero());
        assert!(Address::default().is_zero());
        assert!(!Address::repeat_byte(1).is_zero());
    }
}
