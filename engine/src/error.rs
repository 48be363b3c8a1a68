use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
    #[error("pen slot {0} out of range (expected 0..4)")]
    PenSlot(usize),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface rejected path data: {0}")]
    Path(String),
    #[error("surface rejected text draw: {0}")]
    Text(String),
    #[error("action {index} has no drawable geometry")]
    Empty { index: usize },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
