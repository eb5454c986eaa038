use std::fmt;

/// Error returned by scene validation, parsing, rendering and encoding
#[derive(Debug)]
pub enum Error {
    /// Invalid input: non-finite values, empty sizes, bad buffer layout
    Input { reason: String },
    /// Requested buffer is too large or allocation failed
    Resource { reason: String },
    /// Failed to parse path data or color
    Parse { reason: String, offset: usize },
    /// Failed to encode output image
    Encode { reason: String },
    /// IO error propagated while reading or writing a stream
    Io(std::io::Error),
    /// JSON (de)serialization error
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl Error {
    pub(crate) fn input(reason: impl Into<String>) -> Self {
        Self::Input {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Input { reason } => write!(f, "invalid input: {}", reason),
            Error::Resource { reason } => write!(f, "resource error: {}", reason),
            Error::Parse { reason, offset } => {
                write!(f, "parse error at offset {}: {}", offset, reason)
            }
            Error::Encode { reason } => write!(f, "encode error: {}", reason),
            Error::Io(error) => write!(f, "io error: {}", error),
            #[cfg(feature = "serde")]
            Error::Json(error) => write!(f, "json error: {}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            #[cfg(feature = "serde")]
            Error::Json(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(error) => error,
            _ => Self::new(std::io::ErrorKind::InvalidData, error),
        }
    }
}
