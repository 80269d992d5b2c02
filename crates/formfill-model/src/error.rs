use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid job id: {0:?}")]
    InvalidJobId(String),
    #[error("invalid mapping config: {0}")]
    InvalidConfig(String),
}
