use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("signal not found: {0}")]
    SignalNotFound(String),

    #[error("invalid signal file {path}: {reason}")]
    InvalidSignal { path: String, reason: String },

    #[error("block {index} is out of range ({available} blocks available)")]
    BlockOutOfRange { index: usize, available: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
