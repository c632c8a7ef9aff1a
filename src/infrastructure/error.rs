use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("schedule api error: http {status}; body={body}")]
    HttpStatus { status: u16, body: String },
    #[error("not enough dates available from the schedule api: {available}")]
    InsufficientDates { available: usize },
    #[error("schedule field is missing in the response for {date}")]
    MissingScheduleField { date: String },
    #[error("invalid timestamp in {field}: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("status composition failed: {0}")]
    Composition(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
