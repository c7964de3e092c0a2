//! Invoice payment use-cases.
//!
//! # Responsibility
//! - Record payments against an invoice.
//! - Keep the invoice settlement status in line with the payments recorded.
//!
//! # Invariants
//! - A payment amount is finite, > 0 and <= the invoice total.
//! - After `record_payment`, invoice status is `payée` when total paid >=
//!   invoice amount, `partielle` when something was paid, else `impayée`.

use crate::datastore::Datastore;
use crate::model::entities::{Invoice, InvoiceStatus, Payment};
use crate::model::record::{Record, RecordId};
use crate::repo::entity_store::EntityStore;
use crate::repo::filter::FilterCriteria;
use crate::service::{patch_one, ServiceError, ServiceResult};
use log::info;

/// Caller input for one payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub method: String,
    pub amount: f64,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

/// Amounts settled and outstanding for one invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceBalance {
    pub invoice_amount: f64,
    pub total_paid: f64,
    /// Never negative, even when overpaid.
    pub remaining: f64,
}

/// Result of `record_payment`: the new payment and the refreshed invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Record<Payment>,
    pub invoice: Record<Invoice>,
    pub balance: InvoiceBalance,
}

pub struct PaymentService<'a> {
    payments: &'a dyn EntityStore<Payment>,
    invoices: &'a dyn EntityStore<Invoice>,
}

impl<'a> PaymentService<'a> {
    pub fn new(
        payments: &'a dyn EntityStore<Payment>,
        invoices: &'a dyn EntityStore<Invoice>,
    ) -> Self {
        Self { payments, invoices }
    }

    pub fn from_datastore(datastore: &'a Datastore) -> Self {
        Self::new(&datastore.payments, &datastore.invoices)
    }

    /// Payments recorded against `invoice_id`, in insertion order.
    pub async fn payments_for_invoice(&self, invoice_id: &RecordId) -> Vec<Record<Payment>> {
        self.payments
            .filter(&FilterCriteria::new().with("invoice_id", invoice_id.as_str()))
            .await
    }

    pub async fn invoice_balance(&self, invoice_id: &RecordId) -> ServiceResult<InvoiceBalance> {
        let invoice = self.load_invoice(invoice_id).await?;
        Ok(self.balance_of(&invoice).await)
    }

    /// Records one payment and recomputes the invoice status.
    ///
    /// # Errors
    /// - `InvalidAmount` for non-positive or non-finite amounts.
    /// - `AmountExceedsInvoice` when the amount alone exceeds the invoice.
    /// - `InvoiceNotFound` when `invoice_id` is unknown.
    pub async fn record_payment(
        &self,
        invoice_id: &RecordId,
        request: PaymentRequest,
    ) -> ServiceResult<PaymentReceipt> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(ServiceError::InvalidAmount(request.amount));
        }

        let invoice = self.load_invoice(invoice_id).await?;
        let invoice_amount = invoice.fields.amount.unwrap_or(0.0);
        if request.amount > invoice_amount {
            return Err(ServiceError::AmountExceedsInvoice {
                amount: request.amount,
                invoice_amount,
            });
        }

        let payment = self
            .payments
            .create(Payment {
                invoice_id: Some(invoice_id.clone()),
                method: Some(request.method),
                amount: Some(request.amount),
                transaction_reference: request.transaction_reference,
                notes: request.notes,
            })
            .await?;

        let balance = self.balance_of(&invoice).await;
        let status = settlement_status(balance.total_paid, invoice_amount);
        let invoice = self
            .invoices
            .update(invoice_id, patch_one("status", status)?)
            .await?;

        info!(
            "event=payment_recorded module=payment status=ok invoice_id={} payment_id={}",
            invoice_id, payment.id
        );
        Ok(PaymentReceipt {
            payment,
            invoice,
            balance,
        })
    }

    async fn load_invoice(&self, invoice_id: &RecordId) -> ServiceResult<Record<Invoice>> {
        self.invoices
            .get(invoice_id)
            .await
            .ok_or_else(|| ServiceError::InvoiceNotFound(invoice_id.clone()))
    }

    async fn balance_of(&self, invoice: &Record<Invoice>) -> InvoiceBalance {
        let invoice_amount = invoice.fields.amount.unwrap_or(0.0);
        let total_paid: f64 = self
            .payments_for_invoice(&invoice.id)
            .await
            .iter()
            .map(|payment| payment.fields.amount.unwrap_or(0.0))
            .sum();
        InvoiceBalance {
            invoice_amount,
            total_paid,
            remaining: (invoice_amount - total_paid).max(0.0),
        }
    }
}

/// Settlement status for `paid` against an invoice of `amount`.
pub fn settlement_status(paid: f64, amount: f64) -> InvoiceStatus {
    if paid >= amount {
        InvoiceStatus::Paid
    } else if paid > 0.0 {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Unpaid
    }
}

#[cfg(test)]
mod tests {
    use super::settlement_status;
    use crate::model::entities::InvoiceStatus;

    #[test]
    fn settlement_status_thresholds() {
        assert_eq!(settlement_status(0.0, 100.0), InvoiceStatus::Unpaid);
        assert_eq!(settlement_status(40.0, 100.0), InvoiceStatus::Partial);
        assert_eq!(settlement_status(100.0, 100.0), InvoiceStatus::Paid);
        assert_eq!(settlement_status(120.0, 100.0), InvoiceStatus::Paid);
    }
}
