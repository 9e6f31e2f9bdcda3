use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read config {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("key '{0}' is bound more than once")]
    DuplicateKey(char),
    #[error("failed to open output log {}", path.display())]
    OutputLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
