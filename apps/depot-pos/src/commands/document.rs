//! # Document Data
//!
//! Data handed to the external ticket / route-sheet renderer. Layout belongs
//! to the renderer; amounts come both as cents and pre-formatted with the
//! configured currency symbol.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::state::AppState;
use depot_core::route::RouteValue;
use depot_core::{Money, PaymentKind, RouteHeader};
use depot_db::InvoiceLineView;

/// Store identity printed at the top of every document.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreHeader {
    pub name: String,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

impl StoreHeader {
    fn from_config(config: &AppConfig) -> Self {
        StoreHeader {
            name: config.store_name.clone(),
            address: config.store_address.clone(),
            tax_id: config.store_tax_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub store: StoreHeader,
    pub receipt_label: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub payment_kind: PaymentKind,
    pub customer_name: String,
    pub customer_tax_id: Option<String>,
    pub lines: Vec<DocumentLine>,
    pub total_cents: i64,
    pub total: String,
    pub tendered: Option<String>,
    pub change: Option<String>,
    /// Outstanding balance on credit invoices.
    pub remaining: Option<String>,
}

fn document_line(line: &InvoiceLineView, symbol: &str) -> DocumentLine {
    DocumentLine {
        product_name: line.product_name.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price_cents,
        line_total_cents: line.line_total_cents,
        unit_price: Money::from_cents(line.unit_price_cents).format_with(symbol),
        line_total: Money::from_cents(line.line_total_cents).format_with(symbol),
    }
}

pub async fn invoice_document(state: &AppState, invoice_id: &str) -> Result<InvoiceDocument, ApiError> {
    let detail = state.db.invoices().get(invoice_id).await?;
    let symbol = state.config.currency_symbol.as_str();

    let remaining = match detail.invoice.payment_kind {
        PaymentKind::Credit => state
            .db
            .receivables()
            .get_by_invoice(invoice_id)
            .await?
            .map(|r| r.remaining().format_with(symbol)),
        PaymentKind::Cash => None,
    };

    let invoice = &detail.invoice;
    Ok(InvoiceDocument {
        store: StoreHeader::from_config(&state.config),
        receipt_label: invoice.receipt_label(),
        issued_at: invoice.created_at,
        payment_kind: invoice.payment_kind,
        customer_name: detail
            .customer
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default(),
        customer_tax_id: detail.customer.as_ref().and_then(|c| c.tax_id.clone()),
        lines: detail.lines.iter().map(|l| document_line(l, symbol)).collect(),
        total_cents: invoice.total_cents,
        total: invoice.total().format_with(symbol),
        tendered: invoice
            .cash_tendered_cents
            .map(|c| Money::from_cents(c).format_with(symbol)),
        change: invoice.change().map(|c| c.format_with(symbol)),
        remaining,
    })
}

/// Hoja de ruta: header plus the valuation breakdown.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteSheet {
    pub store: StoreHeader,
    pub route_id: String,
    pub header: RouteHeader,
    pub value: RouteValue,
    pub total: String,
}

pub async fn route_sheet(state: &AppState, route_id: &str) -> Result<RouteSheet, ApiError> {
    let detail = state.db.routes().get(route_id).await?;
    let value = state.db.routes().compute_value(route_id).await?;

    Ok(RouteSheet {
        store: StoreHeader::from_config(&state.config),
        route_id: detail.route.id.clone(),
        header: detail.route.header(),
        total: Money::from_cents(value.total_cents).format_with(&state.config.currency_symbol),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::invoice::create_invoice;
    use crate::commands::route::{create_route, CreateRouteRequest};
    use crate::error::ErrorCode;
    use crate::state::test_state;
    use chrono::NaiveDate;
    use depot_core::invoice::{InvoiceLineRequest, InvoiceRequest};
    use depot_core::route::RouteLineRequest;
    use depot_db::NewProduct;

    async fn product(state: &AppState) -> String {
        state
            .db
            .products()
            .create(&NewProduct {
                name: "Aceite 1L".into(),
                barcode: None,
                cost_cents: 1_000,
                price_cents: 1_550,
                initial_stock: 20,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_cash_invoice_document() {
        let state = test_state().await;
        let product_id = product(&state).await;

        let created = create_invoice(
            &state,
            &InvoiceRequest {
                customer_id: None,
                lines: vec![InvoiceLineRequest {
                    product_id,
                    quantity: 2,
                    unit_price_cents: None,
                }],
                payment_kind: PaymentKind::Cash,
                cash_tendered_cents: Some(5_000),
                initial_payment_cents: None,
            },
        )
        .await
        .unwrap();

        let doc = invoice_document(&state, &created.invoice_id).await.unwrap();
        assert_eq!(doc.store.name, "Abarroteria Central");
        assert_eq!(doc.receipt_label, "INT-0001");
        assert_eq!(doc.lines[0].unit_price, "Q15.50");
        assert_eq!(doc.total, "Q31.00");
        assert_eq!(doc.tendered.as_deref(), Some("Q50.00"));
        assert_eq!(doc.change.as_deref(), Some("Q19.00"));
        assert!(doc.remaining.is_none());
        assert!(!doc.customer_name.is_empty());
    }

    #[tokio::test]
    async fn test_route_sheet_uses_route_value() {
        let state = test_state().await;
        let product_id = product(&state).await;

        let route = create_route(
            &state,
            &CreateRouteRequest {
                header: RouteHeader {
                    date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
                    driver: Some("Luis Coc".into()),
                    ..RouteHeader::default()
                },
                lines: vec![RouteLineRequest {
                    product_id,
                    quantity_sent: 4,
                }],
            },
        )
        .await
        .unwrap();

        let sheet = route_sheet(&state, &route.route.id).await.unwrap();
        assert_eq!(sheet.header.driver.as_deref(), Some("Luis Coc"));
        assert_eq!(sheet.value.total_sold, 4);
        assert_eq!(sheet.total, "Q62.00");

        let err = route_sheet(&state, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
