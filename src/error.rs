use thiserror::Error;

/// Library errors using thiserror for structured error handling.
///
/// Per-slot registry results are reported through [`crate::outcome::Outcome`]
/// values instead; these enums cover backend, configuration and catalog
/// failures that callers may want to chain with anyhow.

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to load audio file: {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to decode audio format")]
    DecodeFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Audio playback failed")]
    PlaybackFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Mixer bus not found: {0}")]
    BusNotFound(String),

    #[error("Invalid sound handle")]
    InvalidHandle,

    #[error("Invalid or finished channel")]
    InvalidChannel,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to load item catalog from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid item catalog: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to create sound effects folder: {path}")]
    RootCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list sound effects folder: {path}")]
    RootUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = AudioError::UnsupportedFormat("txt".to_string());
        assert_eq!(err.to_string(), "Unsupported audio format: txt");

        let err = AudioError::BusNotFound("bus:/Master/SFX".to_string());
        assert_eq!(err.to_string(), "Mixer bus not found: bus:/Master/SFX");
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let config_err = ConfigError::LoadFailed {
            path: "/test/config.json".to_string(),
            source: Box::new(io_err),
        };

        assert!(config_err.source().is_some());
        assert_eq!(
            config_err.to_string(),
            "Failed to load configuration from /test/config.json"
        );
    }

    #[test]
    fn test_registry_error_keeps_io_source() {
        let err = RegistryError::RootUnreadable {
            path: "SFX".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Failed to list sound effects folder: SFX");
    }
}
