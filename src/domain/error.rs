// Engine error taxonomy
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The page is missing a top-level block or its data section is not a sequence.
    /// Nothing is published for that fetch.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A view references a field the normalized set does not carry.
    #[error("Missing channel '{field}' for view '{view}'")]
    MissingChannel { field: String, view: String },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Invalid metric catalog: {0}")]
    InvalidCatalog(String),

    #[error("No telemetry has been loaded yet")]
    NotLoaded,
}
