//! Error types for micro stores

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MicroError>;

#[derive(Error, Debug)]
pub enum MicroError {
    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MicroError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            MicroError::InvalidInput(_) => 3,
            MicroError::Composition(_) => 2,
            MicroError::Config(_) => 1,
            MicroError::Transport(_) => 1,
        }
    }
}

/// Failures detected while assembling a store from feature modules.
///
/// These are fatal at startup: a host must not run with a partially
/// composed store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("Slice key '{key}' is exported by both '{first}' and '{second}'")]
    DuplicateSliceKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("Module '{module}' is missing its {export} export")]
    MissingExport { module: String, export: String },

    #[error("Endpoint '{api}/{endpoint}' uses undeclared tag type '{tag}'")]
    UndeclaredTag {
        api: String,
        endpoint: String,
        tag: String,
    },

    #[error("API '{0}' is registered more than once")]
    DuplicateApi(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid duration for {field}: {value}")]
    InvalidDuration { field: String, value: String },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Network exchange failures.
///
/// The cache client never propagates these to callers; they are folded
/// into the `rejected` state of the entry that issued the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request failed with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("No route for {method} {url}")]
    NoRoute { method: String, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = MicroError::InvalidInput("Unknown endpoint".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_composition_error() {
        let error = MicroError::Composition(CompositionError::DuplicateApi("mainApi".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = MicroError::Config(ConfigError::MissingField("api.main_base_url".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_transport_error() {
        let error =
            MicroError::Transport(TransportError::Network("Connection refused".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_duplicate_key() {
        let error = MicroError::Composition(CompositionError::DuplicateSliceKey {
            key: "tickets".to_string(),
            first: "support".to_string(),
            second: "helpdesk".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Composition error: Slice key 'tickets' is exported by both 'support' and 'helpdesk'"
        );
    }

    #[test]
    fn test_error_message_formatting_missing_export() {
        let error = CompositionError::MissingExport {
            module: "payments".to_string(),
            export: "reducer".to_string(),
        };
        assert_eq!(error.to_string(), "Module 'payments' is missing its reducer export");
    }

    #[test]
    fn test_error_message_formatting_transport() {
        let error = TransportError::Status {
            code: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Request failed with status 503: Service Unavailable"
        );

        let error = TransportError::NoRoute {
            method: "GET".to_string(),
            url: "/api/nowhere".to_string(),
        };
        assert_eq!(error.to_string(), "No route for GET /api/nowhere");
    }

    #[test]
    fn test_error_conversion_from_composition_error() {
        let composition = CompositionError::DuplicateApi("supportApi".to_string());
        let error: MicroError = composition.into();

        match error {
            MicroError::Composition(_) => {}
            _ => panic!("Expected MicroError::Composition"),
        }
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let config_error = ConfigError::MissingField("test".to_string());
        let error: MicroError = config_error.into();

        match error {
            MicroError::Config(_) => {}
            _ => panic!("Expected MicroError::Config"),
        }
    }
}
