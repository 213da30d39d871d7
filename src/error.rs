//! The parser kit's error taxonomy and its firmware mapping.

use core::fmt;

use crate::efi::Status;

/// Error kinds a filesystem parser can report.
///
/// The set mirrors the parser kit's error numbering one-for-one so that a
/// parser port never has to collapse distinctions before handing an error to
/// the shell; collapsing happens once, in [`Status::from`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ParserError {
    BadModule,
    OutOfRange,
    OutOfMemory,
    SymlinkLoop,
    BadFileType,
    FileNotFound,
    UnknownDevice,
    UnknownFs,
    FileReadError,
    BadDevice,
    ReadError,
    WriteError,
    Io,
    BadPartTable,
    BadFs,
    BadFilename,
    BadArgument,
    BadNumber,
    UnknownCommand,
    InvalidCommand,
    NotImplemented,
    Timeout,
    AccessDenied,
    Wait,
    Extractor,
    BadCompressedData,
    Eof,
    BadSignature,
}

impl From<ParserError> for Status {
    fn from(err: ParserError) -> Status {
        use ParserError::*;

        match err {
            BadModule => Status::LOAD_ERROR,

            OutOfRange => Status::BUFFER_TOO_SMALL,

            OutOfMemory | SymlinkLoop => Status::OUT_OF_RESOURCES,

            BadFileType => Status::NO_MAPPING,

            FileNotFound | UnknownDevice | UnknownFs => Status::NOT_FOUND,

            FileReadError | BadDevice | ReadError | WriteError | Io => Status::DEVICE_ERROR,

            BadPartTable | BadFs => Status::VOLUME_CORRUPTED,

            BadFilename | BadArgument | BadNumber | UnknownCommand | InvalidCommand => {
                Status::INVALID_PARAMETER
            }

            NotImplemented => Status::UNSUPPORTED,

            Timeout => Status::TIMEOUT,

            AccessDenied => Status::ACCESS_DENIED,

            Wait => Status::NOT_READY,

            Extractor | BadCompressedData => Status::CRC_ERROR,

            Eof => Status::END_OF_FILE,

            BadSignature => Status::SECURITY_VIOLATION,
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} [{}]", Status::from(*self))
    }
}
