use thiserror::Error;

#[derive(Error, Debug)]
pub enum FactsheetError {
    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    #[error("Malformed value {value:?} in column '{column}' at row {row}: expected a number")]
    MalformedRow {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Chart or document rendering failed: {0}")]
    RenderFailure(String),

    #[error("Explanation service error: {0}")]
    ServiceError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FactsheetError>;
