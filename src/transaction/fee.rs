//! Reduced-precision fee encoding.
//!
//! Fees travel the wire packed into sixteen bits: an 11-bit mantissa and a
//! 5-bit base-10 exponent. Not every integer survives that — `12_345` does,
//! `123_456_789` does not — so fee amounts must be *packable* before a
//! transaction is built. [`closest_packable_fee`] rounds an arbitrary quote
//! down to the nearest representable value; the wallet layer applies it to
//! every oracle quote before signing.
//!
//! Rounding is always downward. Rounding a fee up without asking is how a
//! client ends up signing for more than the user approved.

use crate::config;

/// Largest mantissa representable in the packed encoding.
const MAX_MANTISSA: u128 = (1 << config::FEE_MANTISSA_BITS) - 1;

/// Largest exponent representable in the packed encoding.
const MAX_EXPONENT: u32 = (1 << config::FEE_EXPONENT_BITS) - 1;

/// Pack a fee into its 16-bit wire form: `mantissa << 5 | exponent`.
///
/// Returns `None` when the value is not exactly representable; callers
/// that want a best-effort value go through [`closest_packable_fee`] first.
pub fn pack_fee(fee: u128) -> Option<u16> {
    let (mantissa, exponent) = decompose(fee)?;
    Some(((mantissa as u16) << config::FEE_EXPONENT_BITS) | exponent as u16)
}

/// Expand a packed fee back to its integer value.
pub fn unpack_fee(packed: u16) -> u128 {
    let mantissa = (packed >> config::FEE_EXPONENT_BITS) as u128;
    let exponent = (packed & MAX_EXPONENT as u16) as u32;
    mantissa * config::FEE_EXPONENT_BASE.pow(exponent)
}

/// Whether a fee amount survives the packed encoding exactly.
pub fn is_packable_fee(fee: u128) -> bool {
    decompose(fee).is_some()
}

/// Round a fee down to the closest packable amount.
///
/// Idempotent, and never exceeds the input. For values whose leading
/// digits fit the mantissa this is the identity; otherwise the excess
/// precision is truncated, e.g. `123_456_789` becomes `123_400_000`
/// (mantissa `1234`, exponent `5`).
pub fn closest_packable_fee(fee: u128) -> u128 {
    if fee == 0 {
        return 0;
    }
    let mut mantissa = fee;
    let mut exponent = 0u32;
    while mantissa > MAX_MANTISSA {
        mantissa /= config::FEE_EXPONENT_BASE;
        exponent += 1;
    }
    // Exponent overflow cannot happen for u128 inputs: 2^128 < 10^39 and
    // the exponent field holds up to 31.
    mantissa * config::FEE_EXPONENT_BASE.pow(exponent)
}

/// Split a fee into (mantissa, exponent) with the smallest exponent that
/// fits, or `None` if no exact representation exists.
fn decompose(fee: u128) -> Option<(u128, u32)> {
    if fee == 0 {
        return Some((0, 0));
    }
    let mut mantissa = fee;
    let mut exponent = 0u32;
    while mantissa % config::FEE_EXPONENT_BASE == 0 && mantissa > MAX_MANTISSA {
        mantissa /= config::FEE_EXPONENT_BASE;
        exponent += 1;
    }
    if mantissa > MAX_MANTISSA || exponent > MAX_EXPONENT {
        return None;
    }
    Some((mantissa, exponent))
}
