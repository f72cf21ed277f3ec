use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No files uploaded. Please upload data files first.")]
    EmptyInput,

    #[error("Invalid dataset information: {0}")]
    InvalidInfo(String),

    #[error("Received malformed validation result: {0}")]
    MalformedScore(String),

    #[error("{0}")]
    TagGeneration(String),

    #[error("Publication record could not be synthesized: {0}")]
    Publish(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("No dataset in progress for stage {0}; run stage 1 first")]
    NoActiveDataset(u8),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether this error halts the pipeline at the stage that raised it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
