use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Unknown confidence tier: '{0}'")]
    UnknownConfidence(String),
}
