/*!
    Error type shared by every crate in the ecosystem.
*/

use thiserror::Error;

/**
    Result alias using the shared [`Error`] type.
*/
pub type Result<T, E = Error> = std::result::Result<T, E>;

/**
    Errors produced while configuring, converting, encoding or muxing video.

    Every variant carries a human-readable message meant to be shown to the
    caller as-is.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Bad dimensions, bitrate, frame rate or an unsupported format choice.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Allocation of a context, stream or buffer failed.
    #[error("resource allocation failed: {0}")]
    Resource(String),

    /// The compressor could not be opened or rejected a frame.
    #[error("compression failed: {0}")]
    Compression(String),

    /// Opening or writing the output file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// A frame does not match the configured shape or pixel layout.
    #[error("frame format mismatch: {0}")]
    FormatMismatch(String),

    /// An operation was called in a lifecycle state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn format_mismatch(msg: impl Into<String>) -> Self {
        Self::FormatMismatch(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /**
        The message without the category prefix.
    */
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(m)
            | Self::Resource(m)
            | Self::Compression(m)
            | Self::Io(m)
            | Self::FormatMismatch(m)
            | Self::InvalidState(m) => m,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = Error::format_mismatch("frame is 32x32, expected 64x64");
        assert_eq!(
            err.to_string(),
            "frame format mismatch: frame is 32x32, expected 64x64"
        );
        assert_eq!(err.message(), "frame is 32x32, expected 64x64");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(ref m) if m == "denied"));
    }
}
