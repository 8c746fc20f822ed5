//! Decimal string grammar.
//!
//! ```text
//! decimal  := sign? mantissa exponent?
//! sign     := '+' | '-'
//! mantissa := digits ('.' digits?)? | '.' digits
//! exponent := ('e' | 'E') sign? digits
//! ```
//!
//! The coefficient keeps every mantissa digit; `scale` is the number of
//! fraction digits minus the exponent. A negative scale is folded into the
//! coefficient. Precision is the count of significant coefficient digits,
//! raised to the scale when the scale is larger, and capped at 38.

use crate::error::{PlanError, Result};

/// Largest precision a 128-bit decimal can carry.
pub const MAX_DECIMAL_PRECISION: usize = 38;

/// Parsed decimal: unscaled value plus precision and scale.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DecimalParts {
    /// Unscaled two's-complement value.
    pub value: i128,
    /// Total significant digits, 1..=38.
    pub precision: u8,
    /// Digits after the decimal point, 0..=precision.
    pub scale: u8,
}

impl DecimalParts {
    /// Little-endian two's-complement bytes of the unscaled value.
    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.value.to_le_bytes()
    }
}

/// Parses a decimal-formatted string.
pub fn parse_decimal(input: &str) -> Result<DecimalParts> {
    let invalid = || PlanError::invalid_arg(format!("invalid decimal literal '{input}'"));

    let (negative, rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], parse_exponent(&rest[pos + 1..]).ok_or_else(invalid)?),
        None => (rest, 0i64),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part.trim_start_matches('0'));
    if digits.is_empty() {
        digits.push_str(frac_part.trim_start_matches('0'));
    } else {
        digits.push_str(frac_part);
    }

    let mut scale = frac_part.len() as i64 - exponent;
    if scale < 0 {
        if !digits.is_empty() {
            let shift = (-scale) as usize;
            if digits.len() + shift > MAX_DECIMAL_PRECISION {
                return Err(precision_error(input));
            }
            digits.extend(std::iter::repeat('0').take(shift));
        }
        scale = 0;
    }
    if digits.len() > MAX_DECIMAL_PRECISION || scale > MAX_DECIMAL_PRECISION as i64 {
        return Err(precision_error(input));
    }

    let coefficient: i128 = if digits.is_empty() {
        0
    } else {
        digits.parse().map_err(|_| invalid())?
    };
    let precision = digits.len().max(scale as usize).max(1);
    Ok(DecimalParts {
        value: if negative { -coefficient } else { coefficient },
        precision: precision as u8,
        scale: scale as u8,
    })
}

fn parse_exponent(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.len() > 6 {
        return None;
    }
    text.parse().ok()
}

fn precision_error(input: &str) -> PlanError {
    PlanError::invalid_arg(format!(
        "decimal literal '{input}' exceeds precision {MAX_DECIMAL_PRECISION}"
    ))
}
