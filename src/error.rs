// error.rs
//!
//! Error taxonomy for reading, rewriting and persisting DOSBox configs.

use std::fmt;
use std::io;
use std::path::PathBuf;

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Debug)]
pub enum SwitchError {
    ConfigNotFound(PathBuf),

    Read { path: PathBuf, source: io::Error },
    Decode(PathBuf),

    Write { path: PathBuf, source: io::Error },

    EmptyVirtualPort,
    EmptyPhysicalDevice,

    PortEnumeration(String),
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigNotFound(path) => {
                write!(f, "No DOSBox config found at {}", path.display())
            }

            Self::Read { path, source } => {
                write!(f, "Could not read config {}: {}", path.display(), source)
            }
            Self::Decode(path) => {
                write!(f, "Config {} is not valid UTF-8 text", path.display())
            }

            Self::Write { path, source } => {
                write!(f, "Config {} could not be written: {}", path.display(), source)
            }

            Self::EmptyVirtualPort => write!(f, "Virtual port missing: both ports have to be set"),
            Self::EmptyPhysicalDevice => {
                write!(f, "Physical device missing: both ports have to be set")
            }

            Self::PortEnumeration(msg) => write!(f, "Serial port enumeration failed: {}", msg),
        }
    }
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATION
// ============================================================================

impl std::error::Error for SwitchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serialport::Error> for SwitchError {
    fn from(err: serialport::Error) -> Self {
        Self::PortEnumeration(err.to_string())
    }
}

pub type SwitchResult<T> = Result<T, SwitchError>;

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No config file at the expected location.
    Discovery,
    Read,
    Write,
    /// Caller passed an empty selection.
    Validation,
    /// The host refused to list its serial devices.
    Platform,
}

impl SwitchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigNotFound(_) => ErrorKind::Discovery,
            Self::Read { .. } | Self::Decode(_) => ErrorKind::Read,
            Self::Write { .. } => ErrorKind::Write,
            Self::EmptyVirtualPort | Self::EmptyPhysicalDevice => ErrorKind::Validation,
            Self::PortEnumeration(_) => ErrorKind::Platform,
        }
    }

    /// Process exit code for the command-line shell. Never 0, and never 2
    /// which clap uses for usage errors.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Discovery => 3,
            ErrorKind::Read => 4,
            ErrorKind::Write => 5,
            ErrorKind::Validation => 6,
            ErrorKind::Platform => 7,
        }
    }

    /// Builds a read error, folding a missing file into a discovery failure.
    pub fn from_read(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::ConfigNotFound(path),
            io::ErrorKind::InvalidData => Self::Decode(path),
            _ => Self::Read { path, source: err },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
