use super::plan::{Action, ReconciliationPlan, Summary};
use crate::store::{KvStore, StoreError};
use crate::utils::printable;
use std::io::Write;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error("Failed to write report: {0}")]
    OutputError(#[from] std::io::Error),
}

/// How the plan is applied
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Report changes without issuing them
    pub dry_run: bool,
    /// Emit one line per changed key
    pub verbose: bool,
}

/// Execute the reconciliation plan against `store`.
///
/// Actions are applied in plan order and the first store failure aborts the
/// run; changes already applied stay applied. On success a single summary
/// line is written to `out`.
pub async fn execute_reconciliation<S, W>(
    plan: &ReconciliationPlan,
    store: &S,
    options: ExecuteOptions,
    out: &mut W,
) -> Result<Summary, ExecuteError>
where
    S: KvStore + ?Sized,
    W: Write,
{
    for action in &plan.actions {
        let absolute_key = plan.absolute_key(action.key());

        match action {
            Action::Delete { previous, .. } => {
                if !options.dry_run {
                    debug!(key = %absolute_key, "Deleting key");
                    store.delete(&absolute_key).await?;
                }
                if options.verbose {
                    writeln!(
                        out,
                        "Delete key \"{}\" with value \"{}\"",
                        absolute_key,
                        printable(previous)
                    )?;
                }
            }
            Action::Update {
                key,
                value,
                previous,
            } => {
                if !options.dry_run {
                    debug!(key = %absolute_key, "Updating key");
                    store.put(&absolute_key, value).await?;
                }
                if options.verbose {
                    writeln!(
                        out,
                        "Update key {} with value \"{}\" from previous value \"{}\"",
                        key,
                        printable(value),
                        printable(previous)
                    )?;
                }
            }
            Action::Insert { key, value } => {
                if !options.dry_run {
                    debug!(key = %absolute_key, "Inserting key");
                    store.put(&absolute_key, value).await?;
                }
                if options.verbose {
                    writeln!(out, "Insert key {} with value \"{}\"", key, printable(value))?;
                }
            }
        }
    }

    writeln!(out, "{}", plan.summary.completion_message(plan.purge))?;
    Ok(plan.summary)
}
