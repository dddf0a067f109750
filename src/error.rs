use std::error::Error;

/// Boxed error returned by sinks and user supplied strategies.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Which pluggable formatter failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    Time,
    Duration,
    Error,
    Level,
    Caller,
}

/// Failure while encoding a single record.
///
/// Only pluggable formatters and structured marshallers can fail; the
/// record being encoded must be discarded when this is returned.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("{kind:?} formatter failed: {source}")]
    Formatter {
        kind: FormatterKind,
        #[source]
        source: BoxError,
    },

    #[error("structured marshaller failed: {0}")]
    Structured(#[from] serde_json::Error),

    #[error("custom marshaller failed: {0}")]
    Custom(#[source] BoxError),
}

impl EncodeError {
    pub fn formatter(kind: FormatterKind, source: impl Into<BoxError>) -> Self {
        EncodeError::Formatter {
            kind,
            source: source.into(),
        }
    }

    /// Writes into a [`Buffer`](crate::buffer::Buffer) never fail; this
    /// only adapts `io::Write` signatures.
    pub(crate) fn from_io(e: std::io::Error) -> Self {
        EncodeError::Custom(Box::new(e))
    }
}

/// Error returned by the [`Appender`](crate::appender::Appender).
#[derive(thiserror::Error, Debug)]
pub enum AppendError {
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("sink failed: {0}")]
    Sink(#[source] BoxError),

    #[error("appender is closed")]
    Closed,
}
