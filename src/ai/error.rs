use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request blocked by provider: {0}")]
    Blocked(String),

    #[error("The AI returned an empty response")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    /// Whether asking again could help (the UI offers "try again" for these)
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Http { status, .. } => *status == 429 || *status >= 500,
            AiError::Network(_) | AiError::EmptyResponse => true,
            AiError::MissingApiKey | AiError::Blocked(_) | AiError::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AiError>;
