use crate::store::{KvMap, KvPair};
use crate::utils::absolute_key;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Classification of a key after comparing local and remote data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Unchanged,
    Insert,
    Update,
    Delete,
}

/// A change to apply to the remote tree. Keys are relative to the plan prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Key exists locally only
    Insert { key: String, value: Vec<u8> },
    /// Key exists on both sides with different values
    Update {
        key: String,
        value: Vec<u8>,
        previous: Vec<u8>,
    },
    /// Key exists remotely only (sync mode)
    Delete { key: String, previous: Vec<u8> },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Insert { .. } => ActionKind::Insert,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
        }
    }

    /// Relative key
    pub fn key(&self) -> &str {
        match self {
            Action::Insert { key, .. } | Action::Update { key, .. } | Action::Delete { key, .. } => {
                key
            }
        }
    }
}

/// Counters of applied (or, in dry-run, planned) changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl Summary {
    fn record(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Insert => self.inserted += 1,
            ActionKind::Update => self.updated += 1,
            ActionKind::Delete => self.deleted += 1,
            ActionKind::Unchanged => {}
        }
    }

    /// Total number of keys written
    pub fn set(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }

    /// Final report line for the given mode
    pub fn completion_message(&self, purge: bool) -> String {
        if purge {
            format!(
                "Sync completed. {} keys deleted, {} key inserted, {} keys updated.",
                self.deleted, self.inserted, self.updated
            )
        } else {
            format!("Import completed. {} keys set.", self.set())
        }
    }
}

/// The reconciliation plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Normalized prefix the relative keys are resolved against
    pub prefix: String,

    /// Whether remote keys absent locally are deleted
    pub purge: bool,

    /// Deletes in remote key order, then puts in local key order
    pub actions: Vec<Action>,

    /// Keys whose local and remote values are identical
    pub unchanged: Vec<String>,

    /// Remote keys that did not start with the prefix and were left alone
    pub skipped: Vec<String>,

    pub summary: Summary,
}

impl ReconciliationPlan {
    fn new(prefix: &str, purge: bool) -> Self {
        Self {
            prefix: prefix.to_string(),
            purge,
            ..Self::default()
        }
    }

    fn push(&mut self, action: Action) {
        self.summary.record(action.kind());
        self.actions.push(action);
    }

    /// Absolute store key of a relative key in this plan
    pub fn absolute_key(&self, relative_key: &str) -> String {
        absolute_key(&self.prefix, relative_key)
    }

    /// Classification of a relative key, `None` if neither side has it
    pub fn kind_of(&self, relative_key: &str) -> Option<ActionKind> {
        if self.unchanged.iter().any(|k| k == relative_key) {
            return Some(ActionKind::Unchanged);
        }
        self.actions
            .iter()
            .find(|a| a.key() == relative_key)
            .map(Action::kind)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Compute the changes that bring the remote tree in line with `local`.
///
/// `remote` holds absolute keys as listed under `prefix`; `local` holds keys
/// relative to it. The result is ordered deterministically: deletes in
/// ascending remote key order, followed by inserts and updates in ascending
/// local key order.
pub fn build_reconciliation_plan(
    local: &KvMap,
    mut remote: Vec<KvPair>,
    prefix: &str,
    purge: bool,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::new(prefix, purge);

    remote.sort_by(|a, b| a.key.cmp(&b.key));
    let index: HashMap<&str, &KvPair> = remote.iter().map(|p| (p.key.as_str(), p)).collect();

    // Local keys settled during the remote pass; `local` itself stays untouched
    let mut resolved: HashSet<&str> = HashSet::new();

    for pair in &remote {
        let Some(relative_key) = pair.key.strip_prefix(prefix) else {
            warn!(key = %pair.key, prefix, "Ignoring remote key outside of prefix");
            plan.skipped.push(pair.key.clone());
            continue;
        };

        match local.get_key_value(relative_key) {
            Some((key, value)) if *value == pair.value => {
                resolved.insert(key.as_str());
                plan.unchanged.push(relative_key.to_string());
            }
            Some(_) => {}
            None if purge => plan.push(Action::Delete {
                key: relative_key.to_string(),
                previous: pair.value.clone(),
            }),
            None => {}
        }
    }

    let mut pending: Vec<(&String, &Vec<u8>)> = local
        .iter()
        .filter(|(key, _)| !resolved.contains(key.as_str()))
        .collect();
    pending.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in pending {
        let action = match index.get(absolute_key(prefix, key).as_str()) {
            Some(previous) => Action::Update {
                key: key.clone(),
                value: value.clone(),
                previous: previous.value.clone(),
            },
            None => Action::Insert {
                key: key.clone(),
                value: value.clone(),
            },
        };
        plan.push(action);
    }

    debug!(
        prefix,
        purge,
        inserted = plan.summary.inserted,
        updated = plan.summary.updated,
        deleted = plan.summary.deleted,
        unchanged = plan.unchanged.len(),
        "Built reconciliation plan"
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(pairs: &[(&str, &str)]) -> KvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_summary_messages() {
        let summary = Summary {
            inserted: 2,
            updated: 3,
            deleted: 1,
        };
        assert_eq!(
            summary.completion_message(true),
            "Sync completed. 1 keys deleted, 2 key inserted, 3 keys updated."
        );
        assert_eq!(summary.completion_message(false), "Import completed. 5 keys set.");
    }

    #[test]
    fn test_update_carries_previous_value() {
        let plan = build_reconciliation_plan(
            &local(&[("a", "new")]),
            vec![KvPair::new("a", "old")],
            "",
            false,
        );
        assert_eq!(
            plan.actions,
            vec![Action::Update {
                key: "a".to_string(),
                value: b"new".to_vec(),
                previous: b"old".to_vec(),
            }]
        );
    }

    #[test]
    fn test_out_of_prefix_key_is_skipped() {
        let plan = build_reconciliation_plan(
            &KvMap::new(),
            vec![KvPair::new("other/x", "1"), KvPair::new("app/y", "2")],
            "app/",
            true,
        );
        assert_eq!(plan.skipped, vec!["other/x".to_string()]);
        assert_eq!(plan.kind_of("y"), Some(ActionKind::Delete));
        assert_eq!(plan.summary.deleted, 1);
    }
}
