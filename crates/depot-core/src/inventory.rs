//! # Inventory Rules
//!
//! Stock arithmetic shared by every stock-affecting operation.
//!
//! ## Movement Model
//! ```text
//! stock(t) = Σ movement.quantity   (signed, from product creation)
//!
//!   entry          +n   initial stock, manual entry, purchase
//!   sale           -n   invoice line
//!   route_dispatch -n   route line
//!   route_return   ±n   return reconciliation delta
//!   adjustment     ±n   physical count correction
//! ```
//!
//! Every movement carries `stock_after`, so the history can be checked
//! against the running sum without reading the product row.

use crate::error::{CoreError, CoreResult};
use crate::types::{InventoryMovement, Product};

/// Computes the stock after applying `delta`, or fails if it would go negative.
pub fn apply_delta(product: &Product, delta: i64) -> CoreResult<i64> {
    let next = product.stock + delta;
    if next < 0 {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            requested: -delta,
        });
    }
    Ok(next)
}

/// Signed delta that brings `current` to an absolute `target` count.
#[inline]
pub fn adjustment_delta(current: i64, target: i64) -> i64 {
    target - current
}

/// Sums quantities per product, keeping first-seen order.
///
/// Repeated product lines on one document are allowed; stock is checked on
/// the aggregate.
pub fn aggregate_quantities<'a, I>(lines: I) -> Vec<(&'a str, i64)>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut totals: Vec<(&'a str, i64)> = Vec::new();
    for (product_id, quantity) in lines {
        match totals.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, total)) => *total += quantity,
            None => totals.push((product_id, quantity)),
        }
    }
    totals
}

/// Replays movements (oldest first) and returns the resulting stock.
pub fn replay(movements: &[InventoryMovement]) -> i64 {
    movements.iter().map(|m| m.quantity).sum()
}

/// Checks that every movement's `stock_after` matches the running sum.
///
/// Returns the id of the first movement that disagrees.
pub fn first_inconsistent(movements: &[InventoryMovement]) -> Option<&str> {
    let mut running = 0;
    for movement in movements {
        running += movement.quantity;
        if movement.stock_after != running {
            return Some(movement.id.as_str());
        }
    }
    None
}

// =============================================================================
// Unit Tests
// =============================================================================
