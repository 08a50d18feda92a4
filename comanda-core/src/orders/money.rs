//! Money arithmetic using rust_decimal for precision
//!
//! Totals are computed in `Decimal` and converted back to `f64` for storage
//! and serialization, rounded to 2 decimal places.

use crate::common::error::{CoreError, CoreResult};
use rust_decimal::prelude::*;
use shared::order::OrderLine;

const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i32 = 9999;
/// Maximum allowed tip
const MAX_TIP: f64 = 1_000_000.0;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> CoreResult<()> {
    if !value.is_finite() {
        return Err(CoreError::InvalidInput(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a captured unit price before it enters an order line
pub fn validate_price(price: f64) -> CoreResult<()> {
    require_finite(price, "price")?;
    if price < 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(CoreError::InvalidInput(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate a requested line quantity
pub fn validate_quantity(quantity: i32) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(CoreError::InvalidInput(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(CoreError::InvalidInput(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Validate a tip amount
pub fn validate_tip(tip: f64) -> CoreResult<()> {
    require_finite(tip, "tip_amount")?;
    if tip < 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "tip_amount must be non-negative, got {}",
            tip
        )));
    }
    if tip > MAX_TIP {
        return Err(CoreError::InvalidInput(format!(
            "tip_amount exceeds maximum allowed ({}), got {}",
            MAX_TIP, tip
        )));
    }
    Ok(())
}

/// Recompute an order total from its stored line prices plus the tip
///
/// Always uses the price captured on the line, never a live catalog price.
pub fn recompute_total(lines: &[OrderLine], tip_amount: f64) -> f64 {
    let lines_total: Decimal = lines
        .iter()
        .map(|line| to_decimal(line.unit_price) * Decimal::from(line.quantity))
        .sum();
    to_f64(lines_total + to_decimal(tip_amount))
}
