use derive_more::Display;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Direction;

/// Deterministic 16-hex-char identifier of an (account, instrument, currency,
/// direction) quadruple (spec §4.1).
///
/// A direction flip on an existing position always resolves to a different
/// key: the new position is a distinct entity with its own UTI.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct PositionKey(pub String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `hash(account, instrument, currency, direction)`: first 8 bytes of
    /// SHA-256 over `UPPER(account)|UPPER(instrument)|UPPER(currency)|UPPER(direction)`.
    pub fn generate(account: &str, instrument: &str, currency: &str, direction: Direction) -> Self {
        let input = format!(
            "{}|{}|{}|{}",
            account.to_uppercase(),
            instrument.to_uppercase(),
            currency.to_uppercase(),
            direction.as_key_str()
        );

        let digest = Sha256::digest(input.as_bytes());
        Self(hex::encode(&digest[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_deterministic_and_case_insensitive() {
        let a = PositionKey::generate("acct1", "aapl", "usd", Direction::Long);
        let b = PositionKey::generate("ACCT1", "AAPL", "USD", Direction::Long);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn different_direction_yields_different_key() {
        let long = PositionKey::generate("acct1", "aapl", "usd", Direction::Long);
        let short = PositionKey::generate("acct1", "aapl", "usd", Direction::Short);
        assert_ne!(long, short);
    }
}
