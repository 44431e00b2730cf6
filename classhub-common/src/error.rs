//! Error type for the ClassHub crates
//!
//! Store and filesystem failures wrap their source. The message variants
//! carry text that is safe to put in an API error body.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad TOML, a missing config file, or a setting that does not parse
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client-supplied value that breaks a domain rule (dates, roles)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An outbound collaborator such as the mail webhook failed
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl Error {
    /// True when the caller, not the server, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_input_is_a_client_error() {
        assert!(Error::InvalidInput("date".into()).is_client_error());
        assert!(!Error::Config("port".into()).is_client_error());
        assert!(!Error::Delivery("webhook".into()).is_client_error());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_client_error());
    }

    #[test]
    fn test_messages_name_the_failure() {
        assert_eq!(
            Error::Delivery("HTTP 502".into()).to_string(),
            "Delivery failed: HTTP 502"
        );
        assert_eq!(
            Error::InvalidInput("Unknown role: TUTOR".into()).to_string(),
            "Invalid input: Unknown role: TUTOR"
        );
    }
}
