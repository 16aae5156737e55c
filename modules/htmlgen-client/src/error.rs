use thiserror::Error;

pub type Result<T> = std::result::Result<T, HtmlGenError>;

#[derive(Debug, Error)]
pub enum HtmlGenError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session error: {0}")]
    Session(String),
}

impl From<reqwest::Error> for HtmlGenError {
    fn from(err: reqwest::Error) -> Self {
        HtmlGenError::Network(err.to_string())
    }
}
