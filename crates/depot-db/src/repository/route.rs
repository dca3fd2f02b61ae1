//! # Route Repository
//!
//! Delivery routes: dispatch, returns and the sold-value report.
//!
//! ## Return Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_returns(route, [{line, returned}, ...])                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    load route + lines                      RouteNotFound               │
//! │    plan_returns()                          unknown line / out of range │
//! │    for delta in application_order()        positives first             │
//! │        UPDATE route_lines SET returned = new                           │
//! │         WHERE id = ? AND returned = previous                           │
//! │        apply_movement(delta, route_return)  InsufficientStock          │
//! │  COMMIT                                     (any error: nothing kept)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Submitting the same batch twice is a no-op the second time: every delta
//! is zero.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{apply_movement, load_products};
use crate::repository::{new_id, Tx};
use depot_core::route::{
    application_order, check_dispatch, plan_returns, validate_route_request, value_route,
    ReturnEntry, RouteLineRequest, RouteValue,
};
use depot_core::{CoreError, MovementKind, Route, RouteHeader, RouteLine, RouteState};

const SELECT_ROUTE: &str = "SELECT id, date, driver, driver_license, vehicle_plate, vehicle_condition, destination_name, destination_address, notes, created_at FROM routes";

// =============================================================================
// Read models
// =============================================================================

/// Route line with its product name.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteLineView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity_sent: i64,
    pub quantity_returned: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetail {
    pub route: Route,
    pub state: RouteState,
    pub lines: Vec<RouteLineView>,
}

/// Row of the route list.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub driver: Option<String>,
    pub destination_name: Option<String>,
    pub total_sent: i64,
    pub total_returned: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct RouteRepository {
    pool: SqlitePool,
}

impl RouteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RouteRepository { pool }
    }

    /// Dispatches a route: every line leaves stock now.
    pub async fn create(
        &self,
        header: &RouteHeader,
        lines: &[RouteLineRequest],
    ) -> DbResult<RouteDetail> {
        let header = validate_route_request(header, lines)?;

        debug!(date = %header.date, lines = lines.len(), "Dispatching route");

        let mut tx = self.pool.begin().await?;

        let ids: Vec<&str> = lines.iter().map(|l| l.product_id.as_str()).collect();
        let products = load_products(&mut tx, &ids).await?;
        if let Err(err) = check_dispatch(lines, &products) {
            warn!(error = %err, "Route rejected");
            return Err(err.into());
        }

        let route = Route {
            id: new_id(),
            date: header.date,
            driver: header.driver,
            driver_license: header.driver_license,
            vehicle_plate: header.vehicle_plate,
            vehicle_condition: header.vehicle_condition,
            destination_name: header.destination_name,
            destination_address: header.destination_address,
            notes: header.notes,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO routes (id, date, driver, driver_license, vehicle_plate, vehicle_condition, \
                                 destination_name, destination_address, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&route.id)
        .bind(route.date)
        .bind(&route.driver)
        .bind(&route.driver_license)
        .bind(&route.vehicle_plate)
        .bind(&route.vehicle_condition)
        .bind(&route.destination_name)
        .bind(&route.destination_address)
        .bind(&route.notes)
        .bind(route.created_at)
        .execute(&mut *tx)
        .await?;

        let note = format!("route {}", route.date);
        for line in lines {
            sqlx::query(
                "INSERT INTO route_lines (id, route_id, product_id, quantity_sent, quantity_returned) \
                 VALUES (?1, ?2, ?3, ?4, 0)",
            )
            .bind(new_id())
            .bind(&route.id)
            .bind(&line.product_id)
            .bind(line.quantity_sent)
            .execute(&mut *tx)
            .await?;

            apply_movement(
                &mut tx,
                &line.product_id,
                -line.quantity_sent,
                MovementKind::RouteDispatch,
                Some(&note),
            )
            .await?;
        }

        let detail = detail_in_tx(&mut tx, route).await?;
        tx.commit().await?;

        info!(id = %detail.route.id, lines = detail.lines.len(), "Route dispatched");
        Ok(detail)
    }

    /// Records a batch of returned quantities. All or nothing.
    pub async fn record_returns(
        &self,
        route_id: &str,
        entries: &[ReturnEntry],
    ) -> DbResult<Vec<RouteLine>> {
        debug!(route_id = %route_id, entries = entries.len(), "Recording route returns");

        let mut tx = self.pool.begin().await?;

        fetch_route(&mut tx, route_id).await?;
        let lines = lines_of(&mut tx, route_id).await?;
        let plan = match plan_returns(route_id, &lines, entries) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(route_id = %route_id, error = %err, "Returns rejected");
                return Err(err.into());
            }
        };

        let note = format!("route {route_id}");
        for delta in application_order(&plan) {
            let result = sqlx::query(
                "UPDATE route_lines SET quantity_returned = ?2 \
                 WHERE id = ?1 AND quantity_returned = ?3",
            )
            .bind(&delta.line_id)
            .bind(delta.new_returned)
            .bind(delta.previous_returned)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::QueryFailed(format!(
                    "route line {} changed while recording returns",
                    delta.line_id
                )));
            }

            apply_movement(
                &mut tx,
                &delta.product_id,
                delta.stock_delta(),
                MovementKind::RouteReturn,
                Some(&note),
            )
            .await?;
        }

        let updated = lines_of(&mut tx, route_id).await?;
        tx.commit().await?;

        info!(
            route_id = %route_id,
            changed = plan.iter().filter(|d| d.stock_delta() != 0).count(),
            "Route returns recorded"
        );
        Ok(updated)
    }

    /// Sold value per line and in total, at current catalogue prices.
    pub async fn compute_value(&self, route_id: &str) -> DbResult<RouteValue> {
        let mut tx = self.pool.begin().await?;
        fetch_route(&mut tx, route_id).await?;
        let lines = lines_of(&mut tx, route_id).await?;
        let ids: Vec<&str> = lines.iter().map(|l| l.product_id.as_str()).collect();
        let products = load_products(&mut tx, &ids).await?;
        tx.commit().await?;

        Ok(value_route(route_id, &lines, &products)?)
    }

    pub async fn get(&self, route_id: &str) -> DbResult<RouteDetail> {
        let mut tx = self.pool.begin().await?;
        let route = fetch_route(&mut tx, route_id).await?;
        let detail = detail_in_tx(&mut tx, route).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Routes newest first.
    pub async fn list(&self) -> DbResult<Vec<RouteSummary>> {
        let routes = sqlx::query_as::<_, RouteSummary>(
            "SELECT r.id, r.date, r.driver, r.destination_name, \
                    COALESCE(SUM(l.quantity_sent), 0) AS total_sent, \
                    COALESCE(SUM(l.quantity_returned), 0) AS total_returned, \
                    r.created_at \
             FROM routes r \
             LEFT JOIN route_lines l ON l.route_id = r.id \
             GROUP BY r.id \
             ORDER BY r.date DESC, r.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn fetch_route(tx: &mut Tx<'_>, route_id: &str) -> DbResult<Route> {
    let sql = format!("{SELECT_ROUTE} WHERE id = ?1");
    sqlx::query_as::<_, Route>(&sql)
        .bind(route_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::RouteNotFound(route_id.to_string()).into())
}

async fn lines_of(tx: &mut Tx<'_>, route_id: &str) -> DbResult<Vec<RouteLine>> {
    let lines = sqlx::query_as::<_, RouteLine>(
        "SELECT id, route_id, product_id, quantity_sent, quantity_returned \
         FROM route_lines WHERE route_id = ?1 ORDER BY rowid",
    )
    .bind(route_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(lines)
}

async fn detail_in_tx(tx: &mut Tx<'_>, route: Route) -> DbResult<RouteDetail> {
    let lines = lines_of(tx, &route.id).await?;
    let state = RouteState::of(&lines);

    let views = sqlx::query_as::<_, RouteLineView>(
        "SELECT l.id, l.product_id, p.name AS product_name, l.quantity_sent, l.quantity_returned \
         FROM route_lines l \
         INNER JOIN products p ON p.id = l.product_id \
         WHERE l.route_id = ?1 \
         ORDER BY l.rowid",
    )
    .bind(&route.id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(RouteDetail {
        route,
        state,
        lines: views,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
