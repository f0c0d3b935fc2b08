//! Vendors, purchase orders, goods receipts and vendor invoices.

pub mod matching;
pub mod purchase_orders;
pub mod vendor_invoices;
pub mod vendors;

pub use matching::{three_way_match, Discrepancy, MatchOutcome, MatchStatus, Tolerances};

#[cfg(test)]
mod tests {
    use super::purchase_orders::*;
    use super::vendor_invoices::*;
    use super::vendors::*;
    use super::Tolerances;
    use crate::errors::ServiceError;
    use crate::test_support::{get_db, unique};
    use chrono::NaiveDate;
    use models::purchase_order::PurchaseOrderStatus;
    use models::vendor::NewVendor;
    use models::vendor_invoice::VendorInvoiceStatus;
    use rust_decimal_macros::dec;

    fn d(m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, m, day).unwrap() }

    #[tokio::test]
    async fn order_receive_match_approve() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let vendor = create_vendor(&db, NewVendor { name: "Hardware Hut".into(), email: Some("sales@hut.test".into()), tax_id: None }, "t").await?;
        let prefix = unique("P");
        let order = create_purchase_order(
            &db,
            NewPurchaseOrder {
                vendor_id: vendor.id,
                project_id: None,
                order_date: d(3, 1),
                lines: vec![
                    NewOrderLine { description: "Laptop".into(), quantity: dec!(2), unit_price: dec!(1500) },
                    NewOrderLine { description: "Monitor".into(), quantity: dec!(4), unit_price: dec!(250) },
                ],
            },
            &prefix,
            "t",
        )
        .await?;
        assert_eq!(order.order.po_number, format!("{prefix}-2025-00001"));
        assert_eq!(order.total, dec!(4000));
        let laptop = order.lines[0].line.id;
        let monitor = order.lines[1].line.id;

        // draft orders take no goods
        let receipt = NewGoodsReceipt { quantity: dec!(2), received_on: d(3, 5), notes: None };
        assert!(matches!(record_goods_receipt(&db, laptop, receipt.clone(), "t").await, Err(ServiceError::InvalidState(_))));
        issue_purchase_order(&db, order.order.id).await?;

        let (_, po) = record_goods_receipt(&db, laptop, receipt, "t").await?;
        assert_eq!(po.status, PurchaseOrderStatus::PartiallyReceived);
        let too_many = NewGoodsReceipt { quantity: dec!(1), received_on: d(3, 6), notes: None };
        assert!(matches!(record_goods_receipt(&db, laptop, too_many, "t").await, Err(ServiceError::Validation(_))));
        assert!(matches!(cancel_purchase_order(&db, po.id).await, Err(ServiceError::Conflict(_))));

        let bill = record_vendor_invoice(
            &db,
            NewVendorInvoice {
                vendor_id: vendor.id,
                purchase_order_id: po.id,
                vendor_reference: "HH-881".into(),
                invoice_date: d(3, 10),
                lines: vec![
                    NewVendorInvoiceLine { purchase_order_line_id: laptop, quantity: dec!(2), unit_price: dec!(1500) },
                    NewVendorInvoiceLine { purchase_order_line_id: monitor, quantity: dec!(4), unit_price: dec!(250) },
                ],
            },
            "t",
        )
        .await?;
        assert_eq!(bill.invoice.status, VendorInvoiceStatus::Pending);

        // monitors not yet delivered
        let (bill_row, outcome) = match_vendor_invoice(&db, bill.invoice.id, Tolerances::default()).await?;
        assert_eq!(bill_row.status, VendorInvoiceStatus::Exception);
        assert_eq!(outcome.discrepancies.len(), 1);
        assert!(matches!(approve_vendor_invoice(&db, bill.invoice.id).await, Err(ServiceError::InvalidState(_))));

        let (_, po) = record_goods_receipt(&db, monitor, NewGoodsReceipt { quantity: dec!(4), received_on: d(3, 12), notes: Some("all boxes".into()) }, "t").await?;
        assert_eq!(po.status, PurchaseOrderStatus::Received);
        let (bill_row, _) = match_vendor_invoice(&db, bill.invoice.id, Tolerances::default()).await?;
        assert_eq!(bill_row.status, VendorInvoiceStatus::Matched);
        assert_eq!(bill_row.match_notes, None);
        assert_eq!(approve_vendor_invoice(&db, bill.invoice.id).await?.status, VendorInvoiceStatus::Approved);

        assert!(matches!(soft_delete_vendor(&db, vendor.id).await, Err(ServiceError::Conflict(_))));
        close_purchase_order(&db, po.id).await?;
        soft_delete_vendor(&db, vendor.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn second_bill_for_the_same_goods_is_an_exception() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let vendor = create_vendor(&db, NewVendor { name: "Cable Co".into(), email: None, tax_id: None }, "t").await?;
        let order = create_purchase_order(
            &db,
            NewPurchaseOrder {
                vendor_id: vendor.id,
                project_id: None,
                order_date: d(4, 1),
                lines: vec![NewOrderLine { description: "Patch cable".into(), quantity: dec!(10), unit_price: dec!(8) }],
            },
            &unique("P"),
            "t",
        )
        .await?;
        let cable = order.lines[0].line.id;
        issue_purchase_order(&db, order.order.id).await?;
        record_goods_receipt(&db, cable, NewGoodsReceipt { quantity: dec!(10), received_on: d(4, 3), notes: None }, "t").await?;

        let bill = |reference: &str| NewVendorInvoice {
            vendor_id: vendor.id,
            purchase_order_id: order.order.id,
            vendor_reference: reference.into(),
            invoice_date: d(4, 5),
            lines: vec![NewVendorInvoiceLine { purchase_order_line_id: cable, quantity: dec!(10), unit_price: dec!(8) }],
        };
        let first = record_vendor_invoice(&db, bill("CC-1"), "t").await?;
        let second = record_vendor_invoice(&db, bill("CC-1-DUP"), "t").await?;

        let (first_row, _) = match_vendor_invoice(&db, first.invoice.id, Tolerances::default()).await?;
        assert_eq!(first_row.status, VendorInvoiceStatus::Matched);
        approve_vendor_invoice(&db, first.invoice.id).await?;

        let (second_row, outcome) = match_vendor_invoice(&db, second.invoice.id, Tolerances::default()).await?;
        assert_eq!(second_row.status, VendorInvoiceStatus::Exception);
        assert!(matches!(outcome.discrepancies.as_slice(), [super::Discrepancy::AlreadyBilled { .. }]));
        assert!(second_row.match_notes.unwrap_or_default().contains("already_billed"));
        assert!(matches!(approve_vendor_invoice(&db, second.invoice.id).await, Err(ServiceError::InvalidState(_))));
        Ok(())
    }
}
