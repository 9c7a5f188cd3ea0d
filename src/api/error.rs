use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Message safe to show to a portal user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(e) if e.is_timeout() => "The directory service timed out".to_string(),
            ClientError::Transport(_) => "The directory service is unreachable".to_string(),
            ClientError::Status { status, .. } if *status == 401 || *status == 403 => {
                "You are not allowed to load this list".to_string()
            }
            ClientError::Status { .. } => "The directory service returned an error".to_string(),
            ClientError::NotFound(what) => format!("{} was not found", what),
            ClientError::InvalidUrl(_) => "The directory service is misconfigured".to_string(),
        }
    }
}
