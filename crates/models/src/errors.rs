use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// Message is `"<field>: <reason>"`.
    #[error("{0}")]
    Validation(String),
}

impl ModelError {
    pub fn field(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::Validation(format!("{field}: {reason}"))
    }
}
