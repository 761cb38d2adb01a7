use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetError>;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned status {0}")]
    Status(u16),

    #[error("Session expired or missing, sign-in required")]
    AuthRequired,

    #[error("Push channel error: {0}")]
    Socket(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
