//! Loading of local key/value data.
//!
//! Documents (JSON, YAML) are flattened into slash-delimited keys. Paths and
//! tarball entries are dispatched on their extension, directories are walked
//! recursively.

mod flatten;
mod paths;

pub use flatten::flatten_document;
pub use paths::{load_path, load_paths};

use crate::store::KvMap;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {origin}: {source}")]
    JsonError {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {origin}: {source}")]
    YamlError {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid tarball {origin}: {source}")]
    TarError {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Document {0} must have a mapping at the top level")]
    NotAMapping(String),

    #[error("Array at key {0} may only contain scalar values")]
    NestedArray(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(PathBuf),
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
    Tar,
}

impl InputFormat {
    /// Detect the format from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(InputFormat::Json),
            "yaml" | "yml" => Some(InputFormat::Yaml),
            "tar" => Some(InputFormat::Tar),
            _ => None,
        }
    }
}

/// Parse one input stream in `format`, merging its keys into `out`.
///
/// Keys already present in `out` are overwritten.
pub fn parse_reader<R: Read>(
    reader: R,
    format: InputFormat,
    glue: &str,
    origin: &str,
    out: &mut KvMap,
) -> Result<(), ParseError> {
    debug!(origin, ?format, "Parsing input");
    match format {
        InputFormat::Json => {
            let document: serde_json::Value =
                serde_json::from_reader(reader).map_err(|source| ParseError::JsonError {
                    origin: origin.to_string(),
                    source,
                })?;
            flatten_document(&document, glue, origin, out)
        }
        InputFormat::Yaml => {
            let document: serde_json::Value =
                serde_yaml::from_reader(reader).map_err(|source| ParseError::YamlError {
                    origin: origin.to_string(),
                    source,
                })?;
            flatten_document(&document, glue, origin, out)
        }
        InputFormat::Tar => parse_tar(reader, glue, origin, out),
    }
}

/// Parse the JSON and YAML documents of a tarball; other entries are skipped
fn parse_tar<R: Read>(
    reader: R,
    glue: &str,
    origin: &str,
    out: &mut KvMap,
) -> Result<(), ParseError> {
    let tar_error = |source: std::io::Error| ParseError::TarError {
        origin: origin.to_string(),
        source,
    };

    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(tar_error)? {
        let mut entry = entry.map_err(tar_error)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(tar_error)?.into_owned();
        let entry_origin = format!("{}:{}", origin, path.display());
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(InputFormat::from_extension);

        match format {
            Some(format @ (InputFormat::Json | InputFormat::Yaml)) => {
                let mut document = Vec::new();
                entry.read_to_end(&mut document).map_err(tar_error)?;
                parse_reader(document.as_slice(), format, glue, &entry_origin, out)?;
            }
            _ => warn!(entry = %entry_origin, "Skipping tarball entry with unsupported type"),
        }
    }
    Ok(())
}

/// Read all of standard input in `format`
pub fn load_stdin(format: InputFormat, glue: &str) -> Result<KvMap, ParseError> {
    let mut data = KvMap::new();
    let stdin = std::io::stdin();
    parse_reader(stdin.lock(), format, glue, "<stdin>", &mut data)?;
    Ok(data)
}
