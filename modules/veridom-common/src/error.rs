use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeridomError {
    #[error("Render surface error: {0}")]
    Surface(String),

    #[error("Judgment provider error: {0}")]
    Provider(String),

    #[error("Generation source error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No HTML document found in conversation history")]
    NoDocument,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
