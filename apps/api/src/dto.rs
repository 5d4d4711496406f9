//! # Request and Response Bodies
//!
//! JSON shapes exchanged with the UI. Field names are camelCase; money and
//! GST rates travel as decimal strings (`"236.00"`, `"18.00"`) and are
//! accepted as either JSON numbers or strings.
//!
//! Unknown request fields are ignored, which is how client-computed
//! `gstAmount` / `totalAmount` values are dropped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use gstease_core::{
    ChangeType, DashboardStats, GstRate, GstType, Invoice, InvoiceItem, InvoiceStatus,
    InvoiceType, Money, Product, ReorderSuggestion, StockChange, StockHistoryEntry,
    ValidationError,
};

use crate::workflow::{CreateInvoice, CreatedInvoice, DraftLine};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer_id: Option<String>,
    pub invoice_type: Option<InvoiceType>,
    pub gst_type: GstType,
    #[serde(default)]
    pub items: Vec<InvoiceLineRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineRequest {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub gst_rate: Option<Decimal>,
}

impl CreateInvoiceRequest {
    /// Parses wire decimals into paise and basis points.
    pub fn into_draft(self) -> Result<CreateInvoice, ValidationError> {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let price = line
                    .price
                    .map(|p| Money::from_decimal(&format!("items[{}].price", idx), p))
                    .transpose()?;
                let gst_rate = line
                    .gst_rate
                    .map(|r| GstRate::from_percent(&format!("items[{}].gstRate", idx), r))
                    .transpose()?;

                Ok(DraftLine {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    hsn_code: line.hsn_code,
                    quantity: line.quantity,
                    price,
                    gst_rate,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(CreateInvoice {
            customer_id: self.customer_id,
            invoice_type: self.invoice_type,
            gst_type: self.gst_type,
            items,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockRequest {
    pub quantity: i64,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
    pub reason: String,
}

/// `?limit=` on list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub invoice_type: InvoiceType,
    pub gst_type: GstType,
    pub status: InvoiceStatus,
    pub subtotal: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub igst_amount: Decimal,
    pub total_gst: Decimal,
    /// Paisa added by an odd CGST/SGST split: `subtotal + totalGst + roundOff == totalAmount`.
    pub round_off: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<InvoiceItemResponse>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl InvoiceResponse {
    /// Header only, for list views.
    pub fn summary(invoice: &Invoice) -> Self {
        InvoiceResponse {
            id: invoice.id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            customer_id: invoice.customer_id.clone(),
            invoice_type: invoice.invoice_type,
            gst_type: invoice.gst_type,
            status: invoice.status,
            subtotal: invoice.subtotal().to_decimal(),
            cgst_amount: invoice.cgst().to_decimal(),
            sgst_amount: invoice.sgst().to_decimal(),
            igst_amount: invoice.igst().to_decimal(),
            total_gst: invoice.total_gst().to_decimal(),
            round_off: invoice.round_off().to_decimal(),
            total_amount: invoice.total().to_decimal(),
            notes: invoice.notes.clone(),
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
            items: None,
            warnings: Vec::new(),
        }
    }

    pub fn detail(invoice: &Invoice, items: &[InvoiceItem]) -> Self {
        InvoiceResponse {
            items: Some(items.iter().map(InvoiceItemResponse::from).collect()),
            ..Self::summary(invoice)
        }
    }
}

impl From<CreatedInvoice> for InvoiceResponse {
    fn from(created: CreatedInvoice) -> Self {
        InvoiceResponse {
            warnings: created.warnings,
            ..Self::detail(&created.invoice, &created.items)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemResponse {
    pub id: String,
    pub line_no: i64,
    pub product_id: Option<String>,
    pub product_name: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price: Decimal,
    pub gst_rate: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

impl From<&InvoiceItem> for InvoiceItemResponse {
    fn from(item: &InvoiceItem) -> Self {
        InvoiceItemResponse {
            id: item.id.clone(),
            line_no: item.line_no,
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            hsn_code: item.hsn_code.clone(),
            quantity: item.quantity,
            price: item.price().to_decimal(),
            gst_rate: item.gst_rate().to_percent(),
            gst_amount: item.gst_amount().to_decimal(),
            total_amount: item.total().to_decimal(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub hsn_code: Option<String>,
    pub unit: String,
    pub price: Decimal,
    pub gst_rate: Decimal,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
}

impl From<&Product> for ProductResponse {
    fn from(p: &Product) -> Self {
        ProductResponse {
            id: p.id.clone(),
            name: p.name.clone(),
            hsn_code: p.hsn_code.clone(),
            unit: p.unit.clone(),
            price: p.price().to_decimal(),
            gst_rate: p.gst_rate().to_percent(),
            stock_quantity: p.stock_quantity,
            low_stock_threshold: p.low_stock_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChangeResponse {
    pub product_id: String,
    pub change_type: ChangeType,
    pub quantity_change: i64,
    pub balance_after: i64,
    pub low_stock: bool,
}

impl From<&StockChange> for StockChangeResponse {
    fn from(c: &StockChange) -> Self {
        StockChangeResponse {
            product_id: c.product_id.clone(),
            change_type: c.change_type,
            quantity_change: c.quantity_change,
            balance_after: c.balance_after,
            low_stock: c.low_stock.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryResponse {
    pub id: String,
    pub change_type: ChangeType,
    pub quantity_change: i64,
    pub balance_after: i64,
    pub reference_type: String,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StockHistoryEntry> for StockHistoryResponse {
    fn from(e: StockHistoryEntry) -> Self {
        StockHistoryResponse {
            id: e.id,
            change_type: e.change_type,
            quantity_change: e.quantity_change,
            balance_after: e.balance_after,
            reference_type: e.reference_type,
            reference_id: e.reference_id,
            notes: e.notes,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSuggestionResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit: String,
    pub current_stock: i64,
    pub threshold: i64,
    pub suggested_quantity: i64,
}

impl From<ReorderSuggestion> for ReorderSuggestionResponse {
    fn from(s: ReorderSuggestion) -> Self {
        ReorderSuggestionResponse {
            product_id: s.product_id,
            product_name: s.product_name,
            unit: s.unit,
            current_stock: s.current_stock,
            threshold: s.threshold,
            suggested_quantity: s.suggested_quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub total_revenue: Decimal,
    pub total_invoices: i64,
    pub total_products: i64,
    pub total_customers: i64,
    pub pending_invoices: i64,
    pub low_stock_products: i64,
    pub today_revenue: Decimal,
    pub today_invoices: i64,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(s: DashboardStats) -> Self {
        DashboardStatsResponse {
            total_revenue: Money::from_paise(s.total_revenue_paise).to_decimal(),
            total_invoices: s.total_invoices,
            total_products: s.total_products,
            total_customers: s.total_customers,
            pending_invoices: s.pending_invoices,
            low_stock_products: s.low_stock_products,
            today_revenue: Money::from_paise(s.today_revenue_paise).to_decimal(),
            today_invoices: s.today_invoices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_numbers_and_strings() {
        let req: CreateInvoiceRequest = serde_json::from_value(serde_json::json!({
            "gstType": "cgst_sgst",
            "items": [
                { "productName": "Consulting", "quantity": 2, "price": 100, "gstRate": "18" },
                { "productName": "Travel", "quantity": 1, "price": "10.99", "gstRate": 5,
                  "gstAmount": 999, "totalAmount": 999 }
            ]
        }))
        .unwrap();

        let draft = req.into_draft().unwrap();
        assert_eq!(draft.items[0].price, Some(Money::from_rupees(100)));
        assert_eq!(draft.items[0].gst_rate, Some(GstRate::from_bps(1800)));
        assert_eq!(draft.items[1].price, Some(Money::from_paise(1099)));
        assert_eq!(draft.invoice_type, None);
    }

    #[test]
    fn test_rejects_fractional_paise() {
        let req: CreateInvoiceRequest = serde_json::from_value(serde_json::json!({
            "gstType": "igst",
            "items": [{ "productName": "Bolt", "quantity": 1, "price": "1.005", "gstRate": 18 }]
        }))
        .unwrap();

        let err = req.into_draft().unwrap_err();
        assert!(err.to_string().starts_with("items[0].price"));
    }

    #[test]
    fn test_money_serializes_with_two_decimals() {
        let body = serde_json::to_value(DashboardStatsResponse::from(DashboardStats {
            total_revenue_paise: 23_600,
            ..DashboardStats::default()
        }))
        .unwrap();
        assert_eq!(body["totalRevenue"], "236.00");
        assert_eq!(body["todayRevenue"], "0.00");
    }
}
