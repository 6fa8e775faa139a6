//! One import or sync run: list the remote tree, reconcile, apply, report.

use crate::config::SyncConfig;
use crate::reconciliation::{
    build_reconciliation_plan, execute_reconciliation, ExecuteError, ExecuteOptions, Summary,
};
use crate::store::{KvMap, KvStore, StoreError};
use std::fmt;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Listing(StoreError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Listing,
    Reconciling,
    Applying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Listing => "listing",
            Stage::Reconciling => "reconciling",
            Stage::Applying => "applying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Reconcile the remote tree under `config.prefix` with `local`.
///
/// A listing failure leaves the remote tree untouched. A failure while
/// applying leaves earlier changes of this run in place.
pub async fn run_pipeline<S, W>(
    config: &SyncConfig,
    local: &KvMap,
    store: &S,
    out: &mut W,
) -> Result<Summary, PipelineError>
where
    S: KvStore + ?Sized,
    W: Write,
{
    debug!(stage = %Stage::Listing, prefix = %config.prefix);
    let remote = store.list(&config.prefix).await.map_err(|e| {
        error!(stage = %Stage::Listing, error = %e, "Run failed");
        PipelineError::Listing(e)
    })?;

    debug!(stage = %Stage::Reconciling, local = local.len(), remote = remote.len());
    let plan = build_reconciliation_plan(local, remote, &config.prefix, config.purge());

    debug!(stage = %Stage::Applying, actions = plan.actions.len(), dry_run = config.dry_run);
    let options = ExecuteOptions {
        dry_run: config.dry_run,
        verbose: config.verbose,
    };
    let summary = execute_reconciliation(&plan, store, options, out)
        .await
        .map_err(|e| {
            error!(stage = %Stage::Applying, error = %e, "Run failed");
            e
        })?;

    info!(
        stage = %Stage::Done,
        mode = ?config.mode,
        dry_run = config.dry_run,
        inserted = summary.inserted,
        updated = summary.updated,
        deleted = summary.deleted,
        "Reconciliation finished"
    );
    Ok(summary)
}
