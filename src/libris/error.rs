use crate::forms::ValidationErrors;
use crate::model::EntityKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibrisError {
    #[error("{} not found", .0.label())]
    NotFound(EntityKind),

    #[error("{} are not loaded", .0.collection())]
    NotLoaded(EntityKind),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("You must be signed in to do that")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Remote(String),
}

impl LibrisError {
    /// Maps an envelope error message back to a typed error.
    ///
    /// The service's own messages are the `Display` strings above, so anything
    /// the mock backend can produce comes back as the same variant.
    pub fn from_remote_message(message: &str) -> Self {
        match message {
            "Invalid email or password" => return LibrisError::InvalidCredentials,
            "Invalid token" => return LibrisError::InvalidToken,
            _ => {}
        }
        EntityKind::ALL
            .iter()
            .find(|kind| message == format!("{} not found", kind.label()))
            .map(|kind| LibrisError::NotFound(*kind))
            .unwrap_or_else(|| LibrisError::Remote(message.to_string()))
    }
}

impl From<reqwest::Error> for LibrisError {
    fn from(err: reqwest::Error) -> Self {
        LibrisError::Network(err.to_string())
    }
}

impl From<ValidationErrors> for LibrisError {
    fn from(errors: ValidationErrors) -> Self {
        LibrisError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, LibrisError>;
