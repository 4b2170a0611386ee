//! Data-layer errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: topology has no objects", path.display())]
    EmptyTopology { path: PathBuf },

    #[error("{}: arc index {index} out of range ({len} arcs)", path.display())]
    ArcIndex { path: PathBuf, index: i64, len: usize },

    #[error("data directory not found: {}", .0.display())]
    MissingDir(PathBuf),
}

impl DataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
