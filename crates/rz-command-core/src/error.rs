use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("Invalid items URL: {0}")]
    InvalidUrl(String),

    #[error("Missing template: {0}")]
    MissingTemplate(String),

    #[error("{0} must be used within a command palette")]
    MissingParent(&'static str),
}

impl Error {
    /// Short message suitable for the palette's visible error state.
    /// Full detail belongs in the log, not here.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => "The request timed out.".to_string(),
            Self::Http(_) | Self::Io(_) => "Could not reach the server.".to_string(),
            Self::Status { status, .. } => format!("The server responded with {status}."),
            Self::Json(_) => "The server sent an unreadable response.".to_string(),
            Self::InvalidUrl(_) => "The items URL is invalid.".to_string(),
            Self::MissingTemplate(what) => format!("No template found for {what}."),
            Self::MissingParent(_) => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
