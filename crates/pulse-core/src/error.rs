use thiserror::Error;

/// All errors that can occur in pulse-core.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Process exit codes used by the CLI.
#[repr(i32)]
pub enum ExitCode {
    InvalidArgs = 3,
    NetworkError = 6,
}

pub type Result<T> = std::result::Result<T, PulseError>;
