use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::invoice::{self, InvoiceStatus};
use models::{audit, payment, validate};

use crate::audit::update_versioned;
use crate::errors::ServiceError;

#[derive(Clone, Debug, Deserialize)]
pub struct NewPayment {
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub method: String,
    pub reference: Option<String>,
}

/// Status after `paid` of `total` has been received.
pub fn settled_status(total: Decimal, paid: Decimal) -> InvoiceStatus {
    if paid >= total {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    }
}

/// Apply a payment to an issued invoice. Overpayment is refused.
#[instrument(skip(db, input), fields(amount = %input.amount))]
pub async fn record_payment(
    db: &DatabaseConnection,
    invoice_id: Uuid,
    input: NewPayment,
    actor: &str,
) -> Result<(invoice::Model, payment::Model), ServiceError> {
    validate::positive("amount", input.amount)?;
    let method = validate::required_text("method", &input.method, 32)?;

    let txn = db.begin().await?;
    let current = invoice::Entity::find_by_id(invoice_id).one(&txn).await?.ok_or_else(|| ServiceError::not_found("invoice"))?;
    if !current.status.accepts_payment() {
        return Err(ServiceError::InvalidState(format!("a {:?} invoice does not accept payments", current.status)));
    }
    let outstanding = current.outstanding();
    if input.amount > outstanding {
        return Err(ServiceError::validation(format!("payment {} exceeds the outstanding {}", input.amount, outstanding)));
    }

    let paid = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        invoice_id: Set(invoice_id),
        amount: Set(input.amount),
        paid_on: Set(input.paid_on),
        method: Set(method),
        reference: Set(input.reference.filter(|r| !r.trim().is_empty())),
        created_by: Set(actor.to_string()),
        created_at: Set(audit::now()),
    }
    .insert(&txn)
    .await?;

    let amount_paid = current.amount_paid + input.amount;
    let status = settled_status(current.total, amount_paid);
    let version = current.row_version;
    let mut am: invoice::ActiveModel = current.into();
    am.amount_paid = Set(amount_paid);
    am.status = Set(status);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let invoice = update_versioned(&txn, am, invoice::Column::RowVersion, version).await?;
    txn.commit().await?;

    info!(invoice_id = %invoice_id, payment_id = %paid.id, status = ?invoice.status, "payment_recorded");
    Ok((invoice, paid))
}
