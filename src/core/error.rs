use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    InvalidArgument,
    Internal,
    /// Opening a file whose first 8 bytes don't match the expected magic.
    InvalidMagic,
    /// Opening a file whose header.version field isn't the version we support.
    VersionMismatch,
    /// A file is shorter than its own header claims.
    Truncated,
    /// A doc-id exceeds the configured maximum; the write is clamped and
    /// logged rather than failed.
    DocIdOutOfRange,
    /// `search` was called with a query that tokenized to no terms.
    EmptyQuery,
    /// Two distinct surface tokens hashed to the same fingerprint; the
    /// sealed dictionary keeps whichever was observed first.
    CollisionDetected,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn invalid_magic(found: [u8; 8]) -> Self {
        Error::new(
            ErrorKind::InvalidMagic,
            format!("expected magic b\"MMAPIDX1\", found {:?}", found),
        )
    }

    pub fn version_mismatch(found: u32) -> Self {
        Error::new(
            ErrorKind::VersionMismatch,
            format!("expected version 1, found {}", found),
        )
    }

    pub fn truncated(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Truncated, context)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_context() {
        let err = Error::new(ErrorKind::InvalidArgument, "bad shard count");
        assert_eq!(format!("{}", err), "InvalidArgument: bad shard count");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert_eq!(err.kind, ErrorKind::Io);
    }
}
