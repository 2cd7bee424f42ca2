//! # Token Registry
//!
//! Tokens on VELA are referenced by a compact numeric id on the wire and
//! by symbol everywhere humans look. The mapping between the two — plus
//! the decimals needed to render minor-unit amounts — lives off-ledger in
//! a metadata service. [`TokenRegistry`] is the in-process mirror of that
//! service: the message codec resolves through it when it renders the
//! human-readable authorization text.
//!
//! Amounts are integers in the token's minor unit, always. Formatting to
//! decimal strings happens at the display boundary and nowhere else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors from token resolution.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The id is not present in the registry. Either the registry is stale
    /// or the transaction references a token this network never listed.
    #[error("unknown token id: {0}")]
    UnknownToken(u32),

    /// Symbol lookup failed.
    #[error("unknown token symbol: {0}")]
    UnknownSymbol(String),
}

/// Compact numeric token identifier used in the wire format.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TokenId(pub u32);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listed-token metadata: everything needed to render an amount of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Wire identifier.
    pub id: TokenId,
    /// Display ticker, e.g. `VUSD`.
    pub symbol: String,
    /// Number of minor-unit decimal places.
    pub decimals: u8,
}

impl TokenInfo {
    /// Convenience constructor.
    pub fn new(id: u32, symbol: &str, decimals: u8) -> Self {
        Self {
            id: TokenId(id),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// In-process mirror of the token metadata service.
///
/// Cheap to clone around test setups; in production it is populated once
/// from the network's listing endpoint and treated as read-only.
#[derive(Clone, Debug, Default)]
pub struct TokenRegistry {
    by_id: HashMap<TokenId, TokenInfo>,
    by_symbol: HashMap<String, TokenId>,
}

impl TokenRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the devnet listing. Token 0 is the
    /// native gas token, the rest are the usual suspects.
    pub fn devnet() -> Self {
        let mut registry = Self::new();
        registry.register(TokenInfo::new(0, "VETH", 18));
        registry.register(TokenInfo::new(1, "VUSD", 6));
        registry.register(TokenInfo::new(2, "VBTC", 8));
        registry
    }

    /// Add or replace a listing.
    pub fn register(&mut self, info: TokenInfo) {
        self.by_symbol.insert(info.symbol.clone(), info.id);
        self.by_id.insert(info.id, info);
    }

    /// Resolve by wire id.
    pub fn resolve(&self, id: TokenId) -> Result<&TokenInfo, TokenError> {
        self.by_id.get(&id).ok_or(TokenError::UnknownToken(id.0))
    }

    /// Resolve by display symbol.
    pub fn resolve_symbol(&self, symbol: &str) -> Result<&TokenInfo, TokenError> {
        let id = self
            .by_symbol
            .get(symbol)
            .ok_or_else(|| TokenError::UnknownSymbol(symbol.to_string()))?;
        self.resolve(*id)
    }

    /// Render a minor-unit amount of a token as its canonical decimal
    /// string, e.g. `1500000` of a 6-decimal token becomes `"1.5"`.
    pub fn format_amount(&self, id: TokenId, amount: u128) -> Result<String, TokenError> {
        let info = self.resolve(id)?;
        Ok(format_units(amount, info.decimals))
    }
}

/// Format a minor-unit amount with the given number of decimals.
///
/// The output is canonical: trailing zeros in the fractional part are
/// trimmed, but one digit always remains (`"1.0"`, never `"1."` or `"1"`),
/// except for zero-decimal tokens which render as plain integers. The
/// canonical form matters because this string is embedded in signed
/// authorization messages — two clients rendering the same amount
/// differently would produce different signatures.
pub fn format_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let divisor = 10u128.pow(decimals as u32);
    let whole = amount / divisor;
    let frac = amount % divisor;
    let mut frac_str = format!("{:0>width$}", frac, width = decimals as usize);
    while frac_str.len() > 1 && frac_str.ends_with('0') {
        frac_str.pop();
    }
    format!("{}.{}", whole, frac_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devnet_listing_resolves_both_ways() {
        let registry = TokenRegistry::devnet();
        let by_id = registry.resolve(TokenId(1)).unwrap();
        assert_eq!(by_id.symbol, "VUSD");
        let by_symbol = registry.resolve_symbol("VUSD").unwrap();
        assert_eq!(by_symbol.id, TokenId(1));
    }

    #[test]
    fn unknown_token_errors() {
        let registry = TokenRegistry::devnet();
        assert!(matches!(
            registry.resolve(TokenId(999)),
            Err(TokenError::UnknownToken(999))
        ));
        assert!(registry.resolve_symbol("DOGE").is_err());
    }

    #[test]
    fn format_units_canonical() {
        assert_eq!(format_units(1_500_000, 6), "1.5");
        assert_eq!(format_units(1_000_000, 6), "1.0");
        assert_eq!(format_units(1, 6), "0.000001");
        assert_eq!(format_units(0, 6), "0.0");
        assert_eq!(format_units(12_345_678, 6), "12.345678");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn format_units_eighteen_decimals() {
        // One full unit of an 18-decimal token.
        assert_eq!(format_units(1_000_000_000_000_000_000, 18), "1.0");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
    }

    #[test]
    fn registry_format_amount() {
        let registry = TokenRegistry::devnet();
        assert_eq!(
            registry.format_amount(TokenId(1), 2_500_000).unwrap(),
            "2.5"
        );
    }

    #[test]
    fn reregistering_replaces() {
        let mut registry = TokenRegistry::devnet();
        registry.register(TokenInfo::new(1, "VUSD", 8));
        assert_eq!(registry.resolve(TokenId(1)).unwrap().decimals, 8);
    }
}
