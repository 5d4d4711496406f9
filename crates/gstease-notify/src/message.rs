//! # Notifications and Rendered Email
//!
//! ```text
//! Notification::InvoiceCreated ──render──► EmailMessage (to customer)
//! Notification::LowStock       ──render──► EmailMessage (to admin_email)
//!                                           └─ None when no admin_email
//! ```

use gstease_core::{LowStockAlert, Money};

/// A business event worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An invoice was committed for a customer with an email address.
    InvoiceCreated {
        to: String,
        customer_name: String,
        invoice_number: String,
        total: Money,
    },

    /// A product fell to or below its low-stock threshold.
    LowStock(LowStockAlert),
}

impl Notification {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::InvoiceCreated { .. } => "invoice_created",
            Notification::LowStock(_) => "low_stock",
        }
    }

    /// Renders the email for this event.
    ///
    /// Returns `None` for a low-stock alert when no admin address is set.
    pub fn render(&self, company_name: &str, admin_email: Option<&str>) -> Option<EmailMessage> {
        match self {
            Notification::InvoiceCreated {
                to,
                customer_name,
                invoice_number,
                total,
            } => Some(EmailMessage {
                to: to.clone(),
                subject: format!("Invoice {} from {}", invoice_number, company_name),
                body_text: format!(
                    "Dear {customer_name},\n\n\
                     Your invoice has been generated.\n\n\
                     Invoice Number: {invoice_number}\n\
                     Amount: {total}\n\n\
                     Thank you for your business!\n\
                     {company_name}\n"
                ),
                body_html: format!(
                    "<h2>Invoice Generated</h2>\
                     <p>Dear {customer_name},</p>\
                     <p>Your invoice has been generated.</p>\
                     <p><strong>Invoice Number:</strong> {invoice_number}<br>\
                     <strong>Amount:</strong> {total}</p>\
                     <p>Thank you for your business!</p>\
                     <p><small>{company_name}</small></p>"
                ),
            }),

            Notification::LowStock(alert) => {
                let to = admin_email.filter(|a| !a.trim().is_empty())?;
                Some(EmailMessage {
                    to: to.to_string(),
                    subject: format!("Low Stock Alert - {}", alert.product_name),
                    body_text: format!(
                        "The following product is running low on stock:\n\n\
                         Product: {}\n\
                         Current Stock: {}\n\
                         Threshold: {}\n\n\
                         Please reorder soon to avoid stockouts.\n\
                         This is an automated alert from {}.\n",
                        alert.product_name, alert.current_stock, alert.threshold, company_name
                    ),
                    body_html: format!(
                        "<h2>Low Stock Alert</h2>\
                         <p>The following product is running low on stock:</p>\
                         <p><strong>Product:</strong> {}<br>\
                         <strong>Current Stock:</strong> {}<br>\
                         <strong>Threshold:</strong> {}</p>\
                         <p>Please reorder soon to avoid stockouts.</p>\
                         <p><small>This is an automated alert from {}</small></p>",
                        alert.product_name, alert.current_stock, alert.threshold, company_name
                    ),
                })
            }
        }
    }
}

/// A rendered email ready for a [`crate::Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> LowStockAlert {
        LowStockAlert {
            product_id: "p-1".to_string(),
            product_name: "LED Bulb 9W".to_string(),
            current_stock: 3,
            threshold: 10,
        }
    }

    #[test]
    fn test_invoice_email() {
        let n = Notification::InvoiceCreated {
            to: "buyer@example.com".to_string(),
            customer_name: "Asha".to_string(),
            invoice_number: "INV-000042".to_string(),
            total: Money::from_paise(23_600),
        };

        let email = n.render("GST Ease Suite", None).unwrap();
        assert_eq!(email.to, "buyer@example.com");
        assert_eq!(email.subject, "Invoice INV-000042 from GST Ease Suite");
        assert!(email.body_text.contains("₹236.00"));
        assert!(email.body_html.contains("INV-000042"));
    }

    #[test]
    fn test_low_stock_goes_to_admin() {
        let n = Notification::LowStock(alert());

        let email = n.render("GST Ease Suite", Some("admin@shop.example")).unwrap();
        assert_eq!(email.to, "admin@shop.example");
        assert_eq!(email.subject, "Low Stock Alert - LED Bulb 9W");
        assert!(email.body_text.contains("Current Stock: 3"));

        assert!(n.render("GST Ease Suite", None).is_none());
        assert!(n.render("GST Ease Suite", Some("  ")).is_none());
    }
}
