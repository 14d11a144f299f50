#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document root must be an object, got {found}")]
    NotAnObject { found: &'static str },
}

pub type Result<T> = std::result::Result<T, DocumentError>;
