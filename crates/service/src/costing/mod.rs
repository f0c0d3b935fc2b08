//! Project budgets, labor variance and cost reporting.

pub mod budget;
pub mod report;
pub mod variance;

pub use budget::{create_budget_line, delete_budget_line, list_budget_lines, update_budget_line, BudgetLinePatch, NewBudgetLine};
pub use report::{labor_variance, project_cost_report, CategoryCost, CostReport, LaborVariance};
pub use variance::Variance;
