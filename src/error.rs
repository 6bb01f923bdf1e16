//! Error types for surface-source banking.
//!
//! Capacity overflow is deliberately absent: dropping crossings past the
//! bank capacity is expected behavior and only observable through the
//! stored-vs-attempted counts. Every variant here is fatal to the run that
//! hits it; none of these conditions is transient, so there is no retry.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum BankError {
    /// The destination could not be written or the source could not be read
    Io { path: PathBuf, source: io::Error },
    /// A record failed its invariant checks while being encoded for
    /// writing; the write aborts rather than storing invalid data
    InvalidRecord { index: usize, reason: String },
    /// A decoded record violates its field invariants
    CorruptRecord { index: usize, reason: String },
    /// The file header declares a format version this build does not read
    UnsupportedVersion { found: u16, supported: u16 },
    /// The file header is malformed: bad magic, unknown byte order, or a
    /// record layout descriptor that does not match this version
    BadHeader { path: PathBuf, reason: String },
    /// Declared record count disagrees with the actual body length
    TruncatedFile {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    /// A replay draw was requested after every stored record was used and
    /// no wraparound policy was enabled
    SourceExhausted,
}

impl fmt::Display for BankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "I/O failure on '{}': {}", path.display(), source)
            }
            Self::InvalidRecord { index, reason } => {
                write!(f, "record {} rejected before write: {}", index, reason)
            }
            Self::CorruptRecord { index, reason } => {
                write!(f, "record {} is corrupt: {}", index, reason)
            }
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "bank file format version {} is not supported (this build reads version {})",
                found, supported
            ),
            Self::BadHeader { path, reason } => {
                write!(f, "'{}' is not a valid bank file: {}", path.display(), reason)
            }
            Self::TruncatedFile {
                path,
                expected,
                actual,
            } => write!(
                f,
                "'{}' is truncated: header declares {} bytes of records but {} are present",
                path.display(),
                expected,
                actual
            ),
            Self::SourceExhausted => {
                write!(f, "replay source exhausted: no unused records remain")
            }
        }
    }
}

impl Error for BankError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl BankError {
    pub(crate) fn io(path: &std::path::Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
