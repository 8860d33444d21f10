use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiUnitError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode API response: {0}")]
    Decode(String),

    #[error("Workflow has more job pages than handled; pagination is not supported")]
    UnsupportedPagination,

    #[error("Malformed JUnit document: {0}")]
    MalformedDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CiUnitError>;
