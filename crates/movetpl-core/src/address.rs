//! Adresses de compte : 32 octets, affichées en `0x` + 64 chiffres hex.

use core::{fmt, str::FromStr};

use thiserror::Error;

/// Largeur d'une adresse en octets.
pub const ADDRESS_LENGTH: usize = 32;

/// Adresse Move (ordre des octets = ordre d'affichage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountAddress([u8; ADDRESS_LENGTH]);

/// Texte qui n'est pas une adresse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address `{0}`")]
pub struct AddressParseError(pub String);

impl AccountAddress {
    /// Adresse nulle.
    pub const ZERO: Self = Self([0; ADDRESS_LENGTH]);

    /// Construit depuis 32 octets.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self { Self(bytes) }

    /// Octets bruts.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] { &self.0 }

    /// Hex sans préfixe, longueur fixe (64).
    pub fn to_hex(&self) -> String { hex::encode(self.0) }

    /// Forme stricte : exactement 64 chiffres hex, préfixe `0x` facultatif.
    pub fn from_hex_literal(s: &str) -> Result<Self, AddressParseError> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(AddressParseError(s.to_string()));
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut out).map_err(|_| AddressParseError(s.to_string()))?;
        Ok(Self(out))
    }

    /// Forme courte (`0x2`, `0x1a`…) complétée à gauche par des zéros.
    pub fn from_short_hex(s: &str) -> Result<Self, AddressParseError> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.is_empty() || digits.len() > ADDRESS_LENGTH * 2 {
            return Err(AddressParseError(s.to_string()));
        }
        let padded = format!("{digits:0>64}");
        Self::from_hex_literal(&padded)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "0x{}", self.to_hex()) }
}

impl FromStr for AccountAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_hex_literal(s) }
}

impl From<[u8; ADDRESS_LENGTH]> for AccountAddress {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self { Self(bytes) }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AccountAddress {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.collect_str(self) }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AccountAddress {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_short_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_is_fixed_width() {
        let mut b = [0u8; ADDRESS_LENGTH];
        b[31] = 2;
        let a = AccountAddress::new(b);
        assert_eq!(a.to_string(), format!("0x{}02", "0".repeat(62)));
        assert_eq!(a.to_string().parse::<AccountAddress>(), Ok(a));
    }

    #[test]
    fn strict_parse_wants_64_digits() {
        let ok = "ab".repeat(32);
        assert!(AccountAddress::from_hex_literal(&ok).is_ok());
        assert!(AccountAddress::from_hex_literal(&format!("0x{ok}")).is_ok());
        assert!(AccountAddress::from_hex_literal(&ok[1..]).is_err());
        assert!(AccountAddress::from_hex_literal(&format!("{}zz", &ok[2..])).is_err());
    }

    #[test]
    fn short_form_is_left_padded() {
        let a = AccountAddress::from_short_hex("0x2").unwrap();
        assert_eq!(a.as_bytes()[31], 2);
        assert!(a.as_bytes()[..31].iter().all(|b| *b == 0));
        assert!(AccountAddress::from_short_hex("0x").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_display_form() {
        let a = AccountAddress::from_short_hex("0x1").unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}01\"", "0".repeat(62)));
        let back: AccountAddress = serde_json::from_str("\"0x1\"").unwrap();
        assert_eq!(back, a);
    }
}
