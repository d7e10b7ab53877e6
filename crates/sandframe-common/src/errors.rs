use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A host or content message that failed boundary validation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel '{channel}' expects {expected}")]
    InvalidArgs {
        channel: String,
        expected: &'static str,
    },
}

/// Failures reported by a rendering surface backend.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface creation failed: {0}")]
    Create(String),

    #[error("document write failed: {0}")]
    Write(String),

    #[error("script evaluation failed: {0}")]
    Script(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SandframeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
