use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username cannot be empty.")]
    EmptyInput,

    /// A required read came back with a non-success status.
    #[error("Failed to fetch {what}: {status} {body}")]
    Fetch {
        what: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
