use super::{parse_reader, InputFormat, ParseError};
use crate::store::KvMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Load every path in order, later paths overwriting keys of earlier ones
pub fn load_paths(paths: &[PathBuf], glue: &str) -> Result<KvMap, ParseError> {
    let mut data = KvMap::new();
    for path in paths {
        load_path(path, glue, &mut data)?;
    }
    Ok(data)
}

/// Load a single file or directory into `out`
pub fn load_path(path: &Path, glue: &str, out: &mut KvMap) -> Result<(), ParseError> {
    if path.is_dir() {
        return load_dir(path, glue, out);
    }

    let format = detect_format(path).ok_or_else(|| ParseError::UnsupportedFile(path.to_path_buf()))?;
    load_file(path, format, glue, out)
}

fn load_dir(dir: &Path, glue: &str, out: &mut KvMap) -> Result<(), ParseError> {
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ParseError::IoError {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match detect_format(path) {
            Some(format) => load_file(path, format, glue, out)?,
            None => warn!(path = %path.display(), "Skipping file with unsupported type"),
        }
    }
    Ok(())
}

fn load_file(path: &Path, format: InputFormat, glue: &str, out: &mut KvMap) -> Result<(), ParseError> {
    let file = File::open(path).map_err(|source| ParseError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(
        BufReader::new(file),
        format,
        glue,
        &path.display().to_string(),
        out,
    )
}

fn detect_format(path: &Path) -> Option<InputFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(InputFormat::from_extension)
}
