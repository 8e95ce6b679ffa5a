use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a run before any source is processed.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no export sources configured")]
    NoSources,
    #[error("input path does not exist: {0}")]
    MissingInput(PathBuf),
    #[error("not an .enex export file: {0}")]
    NotAnExport(PathBuf),
    #[error("template file does not exist: {0}")]
    MissingTemplate(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// Errors confined to a single export source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source export file does not exist: {0}")]
    Missing(PathBuf),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed export {path} at byte {position}: {source}")]
    Parse {
        path: PathBuf,
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("export {path} ended inside <{element}>")]
    Truncated { path: PathBuf, element: String },
}
