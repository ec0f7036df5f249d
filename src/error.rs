use thiserror::Error;

/// Errors raised while building a run configuration or environment, or
/// while writing results.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameter `{name}` = {value} is out of range: {expected}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("invalid maze description: {0}")]
    InvalidMaze(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
