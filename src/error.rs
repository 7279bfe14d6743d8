use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropOpsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Advisory service unavailable: {0}")]
    AdvisorUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<lettre::error::Error> for CropOpsError {
    fn from(e: lettre::error::Error) -> Self {
        CropOpsError::Mail(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for CropOpsError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        CropOpsError::Mail(e.to_string())
    }
}

impl From<lettre::address::AddressError> for CropOpsError {
    fn from(e: lettre::address::AddressError) -> Self {
        CropOpsError::Mail(format!("invalid address: {}", e))
    }
}

/// Numeric domain failures in the agro-meteorological formulas
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PhysicsError {
    #[error("{quantity} is undefined for {value:.1} °C (out of domain)")]
    OutOfDomain { quantity: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, CropOpsError>;
