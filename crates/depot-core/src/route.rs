//! # Route Rules
//!
//! Delivery runs: dispatch checks, return planning and valuation.
//!
//! ## Route Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_route          stock -= sent          (route_dispatch)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Dispatched ──record_returns──► PartiallyReconciled ◄─┐                │
//! │                                        │              │ re-submit      │
//! │                                        └──────────────┘                │
//! │                                                                         │
//! │  each return: delta = new_returned - previous_returned                 │
//! │               stock += delta                  (route_return)           │
//! │                                                                         │
//! │  value_route: sold = sent - returned                                   │
//! │               value = sold × CURRENT catalogue price                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Out-of-range return quantities are rejected, never clamped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::aggregate_quantities;
use crate::money::Money;
use crate::types::{Product, RouteHeader, RouteLine};
use crate::validation::{
    ensure_unique, validate_line_count, validate_optional_text, validate_quantity,
};

// =============================================================================
// Dispatch
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteLineRequest {
    pub product_id: String,
    pub quantity_sent: i64,
}

/// Normalises the header text fields and checks the lines.
pub fn validate_route_request(
    header: &RouteHeader,
    lines: &[RouteLineRequest],
) -> CoreResult<RouteHeader> {
    validate_line_count("lines", lines.len())?;
    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "productId".to_string(),
            }
            .into());
        }
        validate_quantity(line.quantity_sent)?;
    }

    Ok(RouteHeader {
        date: header.date,
        driver: validate_optional_text("driver", header.driver.as_deref())?,
        driver_license: validate_optional_text("driverLicense", header.driver_license.as_deref())?,
        vehicle_plate: validate_optional_text("vehiclePlate", header.vehicle_plate.as_deref())?,
        vehicle_condition: validate_optional_text(
            "vehicleCondition",
            header.vehicle_condition.as_deref(),
        )?,
        destination_name: validate_optional_text(
            "destinationName",
            header.destination_name.as_deref(),
        )?,
        destination_address: validate_optional_text(
            "destinationAddress",
            header.destination_address.as_deref(),
        )?,
        notes: validate_optional_text("notes", header.notes.as_deref())?,
    })
}

/// Checks that every dispatched product exists, is active and has stock
/// for the aggregated quantity.
pub fn check_dispatch(
    lines: &[RouteLineRequest],
    products: &HashMap<String, Product>,
) -> CoreResult<()> {
    for (product_id, requested) in
        aggregate_quantities(lines.iter().map(|l| (l.product_id.as_str(), l.quantity_sent)))
    {
        let product = products
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if !product.is_active() {
            return Err(CoreError::ProductInactive(product.name.clone()));
        }

        if !product.has_stock_for(requested) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Returns
// =============================================================================

/// New absolute returned quantity for one route line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnEntry {
    pub route_line_id: String,
    pub quantity_returned: i64,
}

/// Planned change for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnDelta {
    pub line_id: String,
    pub product_id: String,
    pub previous_returned: i64,
    pub new_returned: i64,
}

impl ReturnDelta {
    /// Stock change: positive puts goods back, negative takes them out.
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        self.new_returned - self.previous_returned
    }
}

/// Plans a batch of returns against the route's current lines.
///
/// ## Errors
/// - empty batch or the same line twice: `Validation`
/// - line not on this route: `RouteLineNotFound`
/// - quantity outside `[0, quantity_sent]`: `Validation(OutOfRange)`
pub fn plan_returns(
    route_id: &str,
    lines: &[RouteLine],
    entries: &[ReturnEntry],
) -> CoreResult<Vec<ReturnDelta>> {
    validate_line_count("entries", entries.len())?;
    ensure_unique("routeLineId", entries.iter().map(|e| e.route_line_id.as_str()))?;

    let by_id: HashMap<&str, &RouteLine> = lines.iter().map(|l| (l.id.as_str(), l)).collect();

    entries
        .iter()
        .map(|entry| {
            let line = by_id.get(entry.route_line_id.as_str()).ok_or_else(|| {
                CoreError::RouteLineNotFound {
                    route_id: route_id.to_string(),
                    line_id: entry.route_line_id.clone(),
                }
            })?;

            if !(0..=line.quantity_sent).contains(&entry.quantity_returned) {
                return Err(ValidationError::OutOfRange {
                    field: "quantityReturned".to_string(),
                    min: 0,
                    max: line.quantity_sent,
                }
                .into());
            }

            Ok(ReturnDelta {
                line_id: line.id.clone(),
                product_id: line.product_id.clone(),
                previous_returned: line.quantity_returned,
                new_returned: entry.quantity_returned,
            })
        })
        .collect()
}

/// Deltas that change stock, in the order they must be applied: stock going
/// back in before stock coming out, so a batch that moves units between two
/// lines of the same product never dips below zero midway.
pub fn application_order(deltas: &[ReturnDelta]) -> Vec<&ReturnDelta> {
    let mut ordered: Vec<&ReturnDelta> = deltas.iter().filter(|d| d.stock_delta() != 0).collect();
    ordered.sort_by_key(|d| std::cmp::Reverse(d.stock_delta()));
    ordered
}

// =============================================================================
// Valuation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteValueLine {
    pub route_line_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity_sent: i64,
    pub quantity_returned: i64,
    pub sold: i64,
    pub unit_price_cents: i64,
    pub line_value_cents: i64,
}

/// Sold value of a route, per line and in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteValue {
    pub route_id: String,
    pub lines: Vec<RouteValueLine>,
    pub total_sent: i64,
    pub total_returned: i64,
    pub total_sold: i64,
    pub total_cents: i64,
}

/// Values a route at the current catalogue prices.
pub fn value_route(
    route_id: &str,
    lines: &[RouteLine],
    products: &HashMap<String, Product>,
) -> CoreResult<RouteValue> {
    let mut valued = Vec::with_capacity(lines.len());
    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let sold = line.sold();
        valued.push(RouteValueLine {
            route_line_id: line.id.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity_sent: line.quantity_sent,
            quantity_returned: line.quantity_returned,
            sold,
            unit_price_cents: product.price_cents,
            line_value_cents: product.price().multiply_quantity(sold).cents(),
        });
    }

    let total: Money = valued
        .iter()
        .map(|l| Money::from_cents(l.line_value_cents))
        .sum();

    Ok(RouteValue {
        route_id: route_id.to_string(),
        total_sent: valued.iter().map(|l| l.quantity_sent).sum(),
        total_returned: valued.iter().map(|l| l.quantity_returned).sum(),
        total_sold: valued.iter().map(|l| l.sold).sum(),
        total_cents: total.cents(),
        lines: valued,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
