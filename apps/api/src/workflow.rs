//! # Invoice Workflow
//!
//! Orchestrates invoice creation across the tax calculator, the invoice
//! repository, the stock ledger, and notification dispatch.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Invoice Creation                                     │
//! │                                                                         │
//! │   Draft ──validate──► Computed ──persist──► Persisted ──settle──►      │
//! │     │                    │                     │          StockSettled │
//! │     │ ValidationError    │ ValidationError     │ Conflict      │       │
//! │     ▼                    ▼                     ▼ Storage       ▼       │
//! │   400 (nothing written)                       (rolled back)  notify    │
//! │                                                          (enqueue only)│
//! │                                                                         │
//! │  Stock policy:                                                         │
//! │    best_effort  invoice commits, then one ledger tx per line;          │
//! │                 a shortfall becomes a warning on the response          │
//! │    strict       deductions run inside the invoice tx;                  │
//! │                 a shortfall rejects the invoice (409)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Client-supplied GST and totals are never read; every amount is
//! recomputed here.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::{debug, info, warn};

use gstease_core::tax::{self, LineInput};
use gstease_core::validation::{validate_line_count, validate_quantity};
use gstease_core::{
    CoreError, Customer, DashboardStats, GstRate, GstType, Invoice, InvoiceItem, InvoiceStatus,
    InvoiceType, Money, StockChange, ValidationError,
};
use gstease_db::{reference, Database, DbError, LineSnapshot, NewInvoice};
use gstease_notify::{DispatcherHandle, Notification};

use crate::config::{AppConfig, PricingMode, StockPolicy};
use crate::error::ApiError;

/// Longest accepted invoice note.
const MAX_NOTES_LEN: usize = 2000;

/// A draft invoice as submitted.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub customer_id: Option<String>,
    pub invoice_type: Option<InvoiceType>,
    pub gst_type: GstType,
    pub items: Vec<DraftLine>,
    pub notes: Option<String>,
}

/// One submitted line. Catalog lines carry `product_id`; free-text service
/// lines carry name, price and rate instead.
#[derive(Debug, Clone, Default)]
pub struct DraftLine {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price: Option<Money>,
    pub gst_rate: Option<GstRate>,
}

/// A committed invoice with anything that went wrong after the commit.
#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub warnings: Vec<String>,
}

/// Invoice creation and the invoice read side.
#[derive(Clone)]
pub struct InvoiceWorkflow {
    db: Database,
    notifier: DispatcherHandle,
    stock_policy: StockPolicy,
    pricing: PricingMode,
    number_retries: u32,
    business_offset: FixedOffset,
}

impl InvoiceWorkflow {
    pub fn new(db: Database, notifier: DispatcherHandle, config: &AppConfig) -> Self {
        InvoiceWorkflow {
            db,
            notifier,
            stock_policy: config.stock_policy,
            pricing: config.pricing,
            number_retries: config.invoice_number_retries,
            business_offset: config.business_offset().unwrap_or_else(|| Utc.fix()),
        }
    }

    /// Validates, computes, persists, settles stock, and notifies.
    ///
    /// ## Errors
    /// - `ValidationError` (400): nothing written
    /// - `InsufficientStock` (409): strict policy only, nothing written
    /// - `InvoiceNumberConflict` (409), storage errors (500): nothing written
    pub async fn create_invoice(&self, draft: CreateInvoice) -> Result<CreatedInvoice, ApiError> {
        debug!(lines = draft.items.len(), gst_type = draft.gst_type.as_str(), "Invoice draft received");

        // Draft → Computed
        let customer = self.resolve_customer(draft.customer_id.as_deref()).await?;
        let lines = self.resolve_lines(&draft.items).await?;

        let inputs: Vec<LineInput> = lines
            .iter()
            .map(|l| LineInput::new(l.price, l.quantity, l.gst_rate))
            .collect();
        let breakdown = tax::calculate(&inputs, draft.gst_type)?;

        let invoice_type = draft
            .invoice_type
            .or(customer.as_ref().map(|c| c.customer_type))
            .unwrap_or_default();
        let notes = normalize_notes(draft.notes)?;

        debug!(
            subtotal = %breakdown.subtotal,
            total_gst = %breakdown.total_gst,
            round_off = %breakdown.round_off,
            total = %breakdown.total_amount,
            "Invoice computed"
        );

        // Computed → Persisted
        let new = NewInvoice::from_breakdown(
            customer.as_ref().map(|c| c.id.clone()),
            invoice_type,
            draft.gst_type,
            notes,
            lines,
            &breakdown,
        )?;
        let persisted = self
            .db
            .invoices()
            .create(&new, self.stock_policy.settlement(), self.number_retries)
            .await?;

        let invoice = persisted.invoice;
        let items = persisted.items;
        debug!(invoice_number = %invoice.invoice_number, "Invoice persisted");

        // Persisted → StockSettled
        let mut warnings = Vec::new();
        let changes = match self.stock_policy {
            StockPolicy::Strict => persisted.stock_changes,
            StockPolicy::BestEffort => self.settle_stock(&invoice, &items, &mut warnings).await,
        };
        debug!(
            invoice_number = %invoice.invoice_number,
            movements = changes.len(),
            warnings = warnings.len(),
            "Stock settled"
        );

        // Notifications never fail the request
        if let Some(customer) = &customer {
            if let Some(email) = customer.email.as_deref().filter(|e| !e.trim().is_empty()) {
                self.notify(Notification::InvoiceCreated {
                    to: email.to_string(),
                    customer_name: customer.name.clone(),
                    invoice_number: invoice.invoice_number.clone(),
                    total: invoice.total(),
                });
            }
        }
        for change in &changes {
            self.announce_low_stock(change);
        }

        info!(
            invoice_number = %invoice.invoice_number,
            total = %invoice.total(),
            items = items.len(),
            warnings = warnings.len(),
            "Invoice created"
        );

        Ok(CreatedInvoice {
            invoice,
            items,
            warnings,
        })
    }

    /// An invoice with its items.
    pub async fn get_invoice(&self, id: &str) -> Result<(Invoice, Vec<InvoiceItem>), ApiError> {
        let invoice = self
            .db
            .invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;
        let items = self.db.invoices().get_items(&invoice.id).await?;
        Ok((invoice, items))
    }

    /// All invoices, newest first.
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError> {
        Ok(self.db.invoices().list().await?)
    }

    /// The `limit` newest invoices.
    pub async fn recent_invoices(&self, limit: u32) -> Result<Vec<Invoice>, ApiError> {
        Ok(self.db.invoices().recent(limit).await?)
    }

    /// Changes only the status of an invoice.
    pub async fn update_status(&self, id: &str, status: InvoiceStatus) -> Result<(), ApiError> {
        self.db.invoices().update_status(id, status).await?;
        info!(id = %id, status = status.as_str(), "Invoice status updated");
        Ok(())
    }

    /// Dashboard numbers; "today" is measured in the business timezone.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let today = start_of_day(Utc::now(), self.business_offset);
        Ok(self.db.reports().dashboard_stats(today).await?)
    }

    /// Queues a low-stock alert if the movement produced one.
    pub fn announce_low_stock(&self, change: &StockChange) {
        if let Some(alert) = &change.low_stock {
            self.notify(Notification::LowStock(alert.clone()));
        }
    }

    fn notify(&self, notification: Notification) {
        let kind = notification.kind();
        match self.notifier.enqueue(notification) {
            Ok(()) => debug!(kind, "Notification queued"),
            Err(e) => warn!(kind, error = %e, "Notification not queued"),
        }
    }

    async fn resolve_customer(&self, id: Option<&str>) -> Result<Option<Customer>, ApiError> {
        let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        match self.db.customers().get_by_id(id).await? {
            Some(customer) => Ok(Some(customer)),
            None => Err(ValidationError::UnknownReference {
                field: "customerId".to_string(),
                entity: "customer".to_string(),
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Turns draft lines into priced snapshots, checking every line before
    /// anything is written.
    async fn resolve_lines(&self, drafts: &[DraftLine]) -> Result<Vec<LineSnapshot>, ApiError> {
        if drafts.is_empty() {
            return Err(ValidationError::required("items").into());
        }
        validate_line_count(drafts.len())?;

        let mut lines = Vec::with_capacity(drafts.len());
        for (idx, draft) in drafts.iter().enumerate() {
            let path = format!("items[{}]", idx);
            validate_quantity(draft.quantity).map_err(|e| e.within(&path))?;

            let line = match draft.product_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
                Some(product_id) => {
                    let product = self.db.products().get_by_id(product_id).await?.ok_or_else(|| {
                        ValidationError::UnknownReference {
                            field: format!("{}.productId", path),
                            entity: "product".to_string(),
                            id: product_id.to_string(),
                        }
                    })?;

                    let (price, gst_rate) = match self.pricing {
                        PricingMode::Catalog => (product.price(), product.gst_rate()),
                        PricingMode::Submitted => (
                            draft.price.unwrap_or(product.price()),
                            draft.gst_rate.unwrap_or(product.gst_rate()),
                        ),
                    };

                    LineSnapshot {
                        product_id: Some(product.id),
                        product_name: product.name,
                        hsn_code: product.hsn_code,
                        quantity: draft.quantity,
                        price,
                        gst_rate,
                    }
                }
                None => {
                    let name = draft
                        .product_name
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .ok_or_else(|| ValidationError::required(format!("{}.productName", path)))?;
                    let price = draft
                        .price
                        .ok_or_else(|| ValidationError::required(format!("{}.price", path)))?;
                    let gst_rate = draft
                        .gst_rate
                        .ok_or_else(|| ValidationError::required(format!("{}.gstRate", path)))?;

                    LineSnapshot {
                        product_id: None,
                        product_name: name.to_string(),
                        hsn_code: draft.hsn_code.clone(),
                        quantity: draft.quantity,
                        price,
                        gst_rate,
                    }
                }
            };

            if line.price.is_negative() {
                return Err(ValidationError::MustNotBeNegative {
                    field: format!("{}.price", path),
                }
                .into());
            }
            lines.push(line);
        }

        Ok(lines)
    }

    /// Deducts each catalog line in its own ledger transaction. The invoice
    /// is already committed, so failures are reported, not raised.
    async fn settle_stock(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
        warnings: &mut Vec<String>,
    ) -> Vec<StockChange> {
        let mut changes = Vec::new();
        for item in items {
            let Some(product_id) = item.product_id.as_deref() else {
                continue;
            };

            match self
                .db
                .stock()
                .deduct(product_id, item.quantity, reference::INVOICE, Some(&invoice.id))
                .await
            {
                Ok(change) => changes.push(change),
                Err(e) => {
                    warn!(
                        invoice_number = %invoice.invoice_number,
                        product_id = %product_id,
                        quantity = item.quantity,
                        error = %e,
                        "Stock not deducted"
                    );
                    warnings.push(stock_warning(&item.product_name, &e));
                }
            }
        }
        changes
    }
}

fn stock_warning(product_name: &str, err: &DbError) -> String {
    match err {
        DbError::Domain(e @ CoreError::InsufficientStock { .. }) => e.to_string(),
        _ => format!("Stock for {} could not be updated", product_name),
    }
}

fn normalize_notes(notes: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(notes) = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }
    Ok(Some(notes))
}

/// First instant of the calendar day containing `now` in `offset`.
pub fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    now.with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(offset).single())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(now)
}
