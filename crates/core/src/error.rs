#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Configuration is missing or malformed. Always fatal.
    #[error("Configuration error: {0}")]
    Config(String),
}
