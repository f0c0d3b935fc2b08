use chrono::NaiveDate;
use rust_decimal::Decimal;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct NewClientDoc {
    pub name: String,
    pub contact_email: Option<String>,
    pub billing_address: Option<String>,
    /// 0..=120, default 30
    pub payment_terms_days: Option<i32>,
}

#[derive(ToSchema)]
pub struct ClientPatchDoc {
    pub expected_version: i32,
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub billing_address: Option<String>,
    pub payment_terms_days: Option<i32>,
}

#[derive(ToSchema)]
pub struct NewProjectDoc {
    pub client_id: Uuid,
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget_amount: Option<Decimal>,
}

#[derive(ToSchema)]
pub struct ProjectPatchDoc {
    pub expected_version: i32,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_amount: Option<Decimal>,
}

#[derive(ToSchema)]
pub struct ProjectStatusDoc {
    pub expected_version: i32,
    /// draft, active, on_hold, completed, cancelled
    pub status: String,
}

#[derive(ToSchema)]
pub struct NewEmployeeDoc {
    pub code: String,
    pub full_name: String,
    pub email: String,
    pub designation: Option<String>,
    pub monthly_salary: Decimal,
    pub monthly_incentive: Option<Decimal>,
    pub monthly_commission_share: Option<Decimal>,
    pub billing_rate: Option<Decimal>,
}

#[derive(ToSchema)]
pub struct NewSlotDoc {
    pub project_id: Uuid,
    pub role: String,
    /// 1..=100
    pub planned_allocation_pct: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_salary: Decimal,
    pub monthly_incentive: Option<Decimal>,
    pub monthly_commission_share: Option<Decimal>,
}

#[derive(ToSchema)]
pub struct NewAssignmentDoc {
    pub slot_id: Uuid,
    pub employee_id: Uuid,
    pub allocation_pct: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(ToSchema)]
pub struct AssignmentPatchDoc {
    pub expected_version: i32,
    pub allocation_pct: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(ToSchema)]
pub struct NewTimeEntryDoc {
    pub assignment_id: Uuid,
    pub work_date: NaiveDate,
    pub hours: Decimal,
    pub description: Option<String>,
    /// default true
    pub billable: Option<bool>,
}

#[derive(ToSchema)]
pub struct TimeEntryPatchDoc {
    pub expected_version: i32,
    pub hours: Option<Decimal>,
    pub description: Option<String>,
    pub billable: Option<bool>,
}

#[derive(ToSchema)]
pub struct ReviewDoc {
    pub expected_version: i32,
    /// submit, approve, reject
    pub action: String,
}

#[derive(ToSchema)]
pub struct NewBudgetLineDoc {
    pub project_id: Uuid,
    /// labor, overhead, procurement, other
    pub category: String,
    pub planned_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct NewOverheadDoc {
    /// Omit for a company-wide cost.
    pub project_id: Option<Uuid>,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub incurred_on: NaiveDate,
}

#[derive(ToSchema)]
pub struct GenerateInvoiceDoc {
    pub project_id: Uuid,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    /// Falls back to the configured default.
    pub tax_rate_pct: Option<Decimal>,
}

#[derive(ToSchema)]
pub struct IssueInvoiceDoc {
    /// Defaults to today.
    pub issue_date: Option<NaiveDate>,
}

#[derive(ToSchema)]
pub struct NewPaymentDoc {
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub method: String,
    pub reference: Option<String>,
}

#[derive(ToSchema)]
pub struct NewChangeRequestDoc {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub budget_impact: Option<Decimal>,
    pub schedule_impact_days: Option<i32>,
}

#[derive(ToSchema)]
pub struct DecisionDoc {
    pub expected_version: i32,
    /// submit, approve, reject, implement
    pub decision: String,
}

#[derive(ToSchema)]
pub struct NewVendorDoc {
    pub name: String,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(ToSchema)]
pub struct NewOrderLineDoc {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(ToSchema)]
pub struct NewPurchaseOrderDoc {
    pub vendor_id: Uuid,
    pub project_id: Option<Uuid>,
    pub order_date: NaiveDate,
    pub lines: Vec<NewOrderLineDoc>,
}

#[derive(ToSchema)]
pub struct NewGoodsReceiptDoc {
    pub quantity: Decimal,
    pub received_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct NewVendorInvoiceLineDoc {
    pub purchase_order_line_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(ToSchema)]
pub struct NewVendorInvoiceDoc {
    pub vendor_id: Uuid,
    pub purchase_order_id: Uuid,
    pub vendor_reference: String,
    pub invoice_date: NaiveDate,
    pub lines: Vec<NewVendorInvoiceLineDoc>,
}

#[derive(ToSchema)]
pub struct NewTaskDoc {
    pub project_id: Uuid,
    pub name: String,
    pub duration_days: i32,
    pub assignee_id: Option<Uuid>,
}

#[derive(ToSchema)]
pub struct NewDependencyDoc {
    /// Task that has to finish first.
    pub depends_on: Uuid,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::metrics_export,
        crate::routes::clients::list,
        crate::routes::clients::create,
        crate::routes::clients::get_one,
        crate::routes::clients::update,
        crate::routes::projects::list,
        crate::routes::projects::create,
        crate::routes::projects::get_one,
        crate::routes::projects::update,
        crate::routes::projects::change_status,
        crate::routes::employees::list,
        crate::routes::employees::create,
        crate::routes::employees::get_one,
        crate::routes::employees::utilization,
        crate::routes::staffing::create_slot,
        crate::routes::staffing::get_slot,
        crate::routes::staffing::list_slots,
        crate::routes::staffing::assign,
        crate::routes::staffing::list_assignments,
        crate::routes::staffing::update_assignment,
        crate::routes::timesheets::log,
        crate::routes::timesheets::list,
        crate::routes::timesheets::update,
        crate::routes::timesheets::review,
        crate::routes::costing::create_line,
        crate::routes::costing::labor_variance,
        crate::routes::costing::cost_report,
        crate::routes::overheads::record,
        crate::routes::overheads::list,
        crate::routes::billing::generate,
        crate::routes::billing::list,
        crate::routes::billing::get_one,
        crate::routes::billing::issue,
        crate::routes::billing::cancel,
        crate::routes::billing::pay,
        crate::routes::billing::overdue,
        crate::routes::change_requests::create,
        crate::routes::change_requests::decide,
        crate::routes::procurement::list_vendors,
        crate::routes::procurement::create_vendor,
        crate::routes::procurement::create_order,
        crate::routes::procurement::list_orders,
        crate::routes::procurement::get_order,
        crate::routes::procurement::receive,
        crate::routes::procurement::record_bill,
        crate::routes::procurement::match_bill,
        crate::routes::procurement::approve_bill,
        crate::routes::planning::create,
        crate::routes::planning::add_dependency,
        crate::routes::planning::critical_path,
    ),
    components(
        schemas(
            HealthResponse,
            NewClientDoc,
            ClientPatchDoc,
            NewProjectDoc,
            ProjectPatchDoc,
            ProjectStatusDoc,
            NewEmployeeDoc,
            NewSlotDoc,
            NewAssignmentDoc,
            AssignmentPatchDoc,
            NewTimeEntryDoc,
            TimeEntryPatchDoc,
            ReviewDoc,
            NewBudgetLineDoc,
            NewOverheadDoc,
            GenerateInvoiceDoc,
            IssueInvoiceDoc,
            NewPaymentDoc,
            NewChangeRequestDoc,
            DecisionDoc,
            NewVendorDoc,
            NewOrderLineDoc,
            NewPurchaseOrderDoc,
            NewGoodsReceiptDoc,
            NewVendorInvoiceLineDoc,
            NewVendorInvoiceDoc,
            NewTaskDoc,
            NewDependencyDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "clients"),
        (name = "projects"),
        (name = "employees"),
        (name = "staffing"),
        (name = "timesheets"),
        (name = "costing"),
        (name = "overheads"),
        (name = "billing"),
        (name = "change_requests"),
        (name = "procurement"),
        (name = "planning")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_business_endpoints() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/api/invoices", "/api/assignments", "/api/vendor-invoices/{id}/match", "/api/projects/{id}/critical-path"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
