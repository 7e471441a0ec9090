//! Library-wide error and result types.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result alias used throughout ambakit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Error messages are kept intentionally terse; callers that need richer
/// context should wrap `Error` in their own type.
///
/// Checksum mismatches are deliberately *not* represented here - the
/// unpacker reports them and keeps extracting.
#[derive(Debug)]
pub enum Error {
    /// A magic/signature field did not match the expected value.
    BadMagic,
    /// The data ended before all expected bytes could be read.
    UnexpectedEof,
    /// An offset or size field would read outside the valid region.
    InvalidRange,
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// An output path already exists; neither tool ever overwrites.
    OutputExists(PathBuf),
    /// An extracted section header has neither a payload file nor a ROMFS
    /// listing next to it (the value is the section header offset).
    MissingSectionData(u32),
    /// An underlying I/O operation failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadMagic => write!(f, "bad magic value"),
            Error::UnexpectedEof => write!(f, "unexpected end of data"),
            Error::InvalidRange => write!(f, "invalid offset or size"),
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::OutputExists(p) => write!(f, "refusing to overwrite {}", p.display()),
            Error::MissingSectionData(offset) => {
                write!(f, "missing data for section at {offset:08X}")
            }
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
