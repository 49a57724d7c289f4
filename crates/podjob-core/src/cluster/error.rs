use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("connection error: {0}")]
    Connect(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("read refused: {0}")]
    ReadRefused(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
