use std::fmt::Display;
use std::path::PathBuf;

use crate::stream::FileMode;

/// Reasons a packet header fails validation.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("not enough bytes for header; got {actual}, need {minimum}")]
    NotEnoughData {
        /// Number of bytes we got
        actual: usize,
        /// Minimum number of expected bytes
        minimum: usize,
    },
    #[error("bad sync pattern {0:#06x}")]
    BadSync(u16),
    #[error("header checksum mismatch; header says {expected:#06x}, computed {actual:#06x}")]
    HeaderChecksum { expected: u16, actual: u16 },
    #[error("secondary header checksum mismatch; header says {expected:#06x}, computed {actual:#06x}")]
    SecondaryChecksum { expected: u16, actual: u16 },
    #[error("packet length {packet_len} shorter than header ({header_len}) plus data ({data_len})")]
    Length {
        packet_len: u32,
        header_len: usize,
        data_len: u32,
    },
    /// No packet boundary could be located scanning backward.
    #[error("no packet boundary found within {window} bytes")]
    Resync { window: usize },
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("{kind} at offset {offset}")]
    Format { offset: u64, kind: FormatError },

    #[error("end of file")]
    EndOfFile,
    #[error("beginning of file")]
    BeginningOfFile,

    /// The packet claims more bytes than the source can supply.
    #[error("short read at offset {offset}; expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("{0:?} not found")]
    NotFound(PathBuf),
    #[error("access to {0:?} denied")]
    AccessDenied(PathBuf),

    /// Operation on a closed stream.
    #[error("invalid handle; stream is not open")]
    InvalidHandle,
    #[error("no current header")]
    NoHeader,
    #[error("operation not allowed for file mode {0:?}")]
    WrongMode(FileMode),
    #[error("unsupported file mode {0:?}")]
    Unsupported(FileMode),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Relocate a format error to `offset`. Other errors are returned as-is.
    #[must_use]
    pub fn at(self, offset: u64) -> Self {
        match self {
            Error::Format { kind, .. } => Error::Format { offset, kind },
            err => err,
        }
    }

    /// The [Status] code corresponding to this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Error::Format { .. } => Status::FormatError,
            Error::EndOfFile => Status::EndOfFile,
            Error::BeginningOfFile => Status::BeginningOfFile,
            Error::ShortRead { .. } => Status::ShortRead,
            Error::NotFound(_) => Status::NotFound,
            Error::AccessDenied(_) => Status::AccessDenied,
            Error::InvalidHandle => Status::InvalidHandle,
            Error::NoHeader => Status::NoHeader,
            Error::WrongMode(_) => Status::WrongMode,
            Error::Unsupported(_) => Status::Unsupported,
            Error::Io(_) => Status::Io,
        }
    }

    /// True for the expected termination signals, i.e., end or beginning of file.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.status().is_boundary()
    }
}

impl From<FormatError> for Error {
    fn from(kind: FormatError) -> Self {
        Error::Format { offset: 0, kind }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Status vocabulary shared with consumers of the stream, e.g., command line tools
/// that need to map outcomes onto exit codes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    EndOfFile,
    BeginningOfFile,
    FormatError,
    ShortRead,
    NotFound,
    AccessDenied,
    InvalidHandle,
    NoHeader,
    WrongMode,
    Unsupported,
    Io,
}

impl Status {
    #[must_use]
    pub fn from_result<T>(zult: &Result<T>) -> Self {
        match zult {
            Ok(_) => Status::Ok,
            Err(err) => err.status(),
        }
    }

    #[must_use]
    pub fn is_boundary(self) -> bool {
        matches!(self, Status::EndOfFile | Status::BeginningOfFile)
    }

    /// Process exit code for a command that stopped with this status.
    ///
    /// Boundaries are not failures and map to 0 like [Status::Ok]. Failures to open a
    /// file map to 1.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Status::Ok | Status::EndOfFile | Status::BeginningOfFile => 0,
            Status::NotFound | Status::AccessDenied | Status::Unsupported => 1,
            Status::FormatError => 2,
            Status::ShortRead => 3,
            Status::InvalidHandle | Status::NoHeader | Status::WrongMode => 4,
            Status::Io => 5,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::EndOfFile => "EndOfFile",
            Status::BeginningOfFile => "BeginningOfFile",
            Status::FormatError => "FormatError",
            Status::ShortRead => "ShortRead",
            Status::NotFound => "NotFound",
            Status::AccessDenied => "AccessDenied",
            Status::InvalidHandle => "InvalidHandle",
            Status::NoHeader => "NoHeader",
            Status::WrongMode => "WrongMode",
            Status::Unsupported => "Unsupported",
            Status::Io => "IoError",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::EndOfFile, Status::EndOfFile, 0)]
    #[test_case(Error::BeginningOfFile, Status::BeginningOfFile, 0)]
    #[test_case(Error::NotFound(PathBuf::from("x.ch10")), Status::NotFound, 1)]
    #[test_case(Error::Unsupported(FileMode::ReadNetworkStream), Status::Unsupported, 1)]
    #[test_case(FormatError::BadSync(0).into(), Status::FormatError, 2)]
    #[test_case(Error::ShortRead { offset: 0, expected: 4, actual: 1 }, Status::ShortRead, 3)]
    #[test_case(Error::InvalidHandle, Status::InvalidHandle, 4)]
    fn status_mapping(err: Error, status: Status, code: u8) {
        assert_eq!(err.status(), status);
        assert_eq!(status.exit_code(), code);
    }

    #[test]
    fn relocate_format_error() {
        let err = Error::from(FormatError::BadSync(0x1234)).at(40);
        assert!(matches!(err, Error::Format { offset: 40, kind: FormatError::BadSync(0x1234) }));

        let err = Error::EndOfFile.at(40);
        assert!(matches!(err, Error::EndOfFile));
    }

    #[test]
    fn status_from_result() {
        assert_eq!(Status::from_result(&Ok::<_, Error>(())), Status::Ok);
        assert_eq!(Status::from_result::<()>(&Err(Error::NoHeader)), Status::NoHeader);
        assert!(Status::EndOfFile.is_boundary());
        assert!(!Status::FormatError.is_boundary());
    }
}
