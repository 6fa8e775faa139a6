pub mod config;
pub mod input;
pub mod pipeline;
pub mod reconciliation;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigError, FormatFlags, InputSource, SyncConfig, SyncMode};
pub use input::{load_paths, load_stdin, parse_reader, InputFormat, ParseError};
pub use pipeline::{run_pipeline, PipelineError, Stage};
pub use reconciliation::{
    build_reconciliation_plan, execute_reconciliation, Action, ActionKind, ExecuteError,
    ExecuteOptions, ReconciliationPlan, Summary,
};
pub use store::{ConsulStore, KvMap, KvPair, KvStore, MemoryStore, StoreConfig, StoreError};
pub use utils::{absolute_key, normalize_prefix};
