#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid combination logic {0:?}: expected AND or OR")]
    InvalidLogic(String),

    #[error("Invalid date period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
