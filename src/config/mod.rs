use crate::input::InputFormat;
use crate::utils::{normalize_prefix, DEFAULT_ARRAY_GLUE};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Only one input format may be specified")]
    ConflictingFormats,

    #[error("You must specify an input format when using stdin")]
    MissingStdinFormat,
}

/// Reconciliation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Push local data, never delete remote keys
    Import,
    /// Local data is authoritative, remote keys absent locally are deleted
    Sync,
}

impl SyncMode {
    pub fn purge(self) -> bool {
        matches!(self, SyncMode::Sync)
    }
}

/// Where the local data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin(InputFormat),
    Paths(Vec<PathBuf>),
}

/// Input format flags as given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatFlags {
    pub yaml: bool,
    pub json: bool,
    pub tar: bool,
}

impl FormatFlags {
    /// The single selected format, if any
    pub fn selected(self) -> Result<Option<InputFormat>, ConfigError> {
        let selected: Vec<InputFormat> = [
            (self.yaml, InputFormat::Yaml),
            (self.json, InputFormat::Json),
            (self.tar, InputFormat::Tar),
        ]
        .into_iter()
        .filter_map(|(set, format)| set.then_some(format))
        .collect();

        match selected.as_slice() {
            [] => Ok(None),
            [format] => Ok(Some(*format)),
            _ => Err(ConfigError::ConflictingFormats),
        }
    }
}

/// Settings of one import or sync run.
///
/// Built once from the command line and passed by reference; nothing mutates
/// it afterwards.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SyncMode,
    /// Normalized key prefix, `""` or ending in a single `/`
    pub prefix: String,
    pub dry_run: bool,
    pub verbose: bool,
    /// Glue used to join array values
    pub glue: String,
    pub source: InputSource,
}

impl SyncConfig {
    /// Validate the raw flags and build the configuration
    pub fn new(
        mode: SyncMode,
        formats: FormatFlags,
        paths: Vec<PathBuf>,
        prefix: &str,
    ) -> Result<Self, ConfigError> {
        let format = formats.selected()?;
        let source = if paths.is_empty() {
            InputSource::Stdin(format.ok_or(ConfigError::MissingStdinFormat)?)
        } else {
            InputSource::Paths(paths)
        };

        Ok(Self {
            mode,
            prefix: normalize_prefix(prefix),
            dry_run: false,
            verbose: false,
            glue: DEFAULT_ARRAY_GLUE.to_string(),
            source,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_glue(mut self, glue: impl Into<String>) -> Self {
        self.glue = glue.into();
        self
    }

    pub fn purge(&self) -> bool {
        self.mode.purge()
    }
}
