//! Customer invoices and payments.

pub mod calc;
pub mod invoices;
pub mod numbering;
pub mod payments;

pub use invoices::{cancel_invoice, generate_invoice, get_invoice, issue_invoice, list_invoices, overdue_invoices, GenerateInvoice, InvoiceDetail, InvoiceFilter};
pub use payments::{record_payment, NewPayment};
