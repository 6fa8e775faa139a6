mod plan;
mod execute;

pub use plan::{build_reconciliation_plan, Action, ActionKind, ReconciliationPlan, Summary};
pub use execute::{execute_reconciliation, ExecuteError, ExecuteOptions};
