//! EFI_STATUS and the subset of status codes this driver produces or
//! inspects.
//!
//! Error codes carry the high bit of the native word; warning codes share
//! the code space of success without the high bit set.

use core::fmt;

const ERROR_BIT: usize = 1 << (usize::BITS - 1);

/// EFI_STATUS.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub usize);

#[rustfmt::skip]
impl Status {
    pub const SUCCESS: Status              = Status(0);

    pub const LOAD_ERROR: Status           = Status(ERROR_BIT | 1);
    pub const INVALID_PARAMETER: Status    = Status(ERROR_BIT | 2);
    pub const UNSUPPORTED: Status          = Status(ERROR_BIT | 3);
    pub const BAD_BUFFER_SIZE: Status      = Status(ERROR_BIT | 4);
    pub const BUFFER_TOO_SMALL: Status     = Status(ERROR_BIT | 5);
    pub const NOT_READY: Status            = Status(ERROR_BIT | 6);
    pub const DEVICE_ERROR: Status         = Status(ERROR_BIT | 7);
    pub const WRITE_PROTECTED: Status      = Status(ERROR_BIT | 8);
    pub const OUT_OF_RESOURCES: Status     = Status(ERROR_BIT | 9);
    pub const VOLUME_CORRUPTED: Status     = Status(ERROR_BIT | 10);
    pub const VOLUME_FULL: Status          = Status(ERROR_BIT | 11);
    pub const NO_MEDIA: Status             = Status(ERROR_BIT | 12);
    pub const MEDIA_CHANGED: Status        = Status(ERROR_BIT | 13);
    pub const NOT_FOUND: Status            = Status(ERROR_BIT | 14);
    pub const ACCESS_DENIED: Status        = Status(ERROR_BIT | 15);
    pub const NO_RESPONSE: Status          = Status(ERROR_BIT | 16);
    pub const NO_MAPPING: Status           = Status(ERROR_BIT | 17);
    pub const TIMEOUT: Status              = Status(ERROR_BIT | 18);
    pub const NOT_STARTED: Status          = Status(ERROR_BIT | 19);
    pub const ALREADY_STARTED: Status      = Status(ERROR_BIT | 20);
    pub const ABORTED: Status              = Status(ERROR_BIT | 21);
    pub const ICMP_ERROR: Status           = Status(ERROR_BIT | 22);
    pub const TFTP_ERROR: Status           = Status(ERROR_BIT | 23);
    pub const PROTOCOL_ERROR: Status       = Status(ERROR_BIT | 24);
    pub const INCOMPATIBLE_VERSION: Status = Status(ERROR_BIT | 25);
    pub const SECURITY_VIOLATION: Status   = Status(ERROR_BIT | 26);
    pub const CRC_ERROR: Status            = Status(ERROR_BIT | 27);
    pub const END_OF_MEDIA: Status         = Status(ERROR_BIT | 28);
    pub const END_OF_FILE: Status          = Status(ERROR_BIT | 31);
    pub const INVALID_LANGUAGE: Status     = Status(ERROR_BIT | 32);
    pub const COMPROMISED_DATA: Status     = Status(ERROR_BIT | 33);

    pub const WARN_UNKNOWN_GLYPH: Status   = Status(1);
    pub const WARN_DELETE_FAILURE: Status  = Status(2);
    pub const WARN_WRITE_FAILURE: Status   = Status(3);
    pub const WARN_BUFFER_TOO_SMALL: Status = Status(4);
}

impl Status {
    /// True for codes with the error bit set.
    pub const fn is_error(self) -> bool {
        self.0 & ERROR_BIT != 0
    }

    /// True only for `SUCCESS`; warnings are not successes.
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// True for non-zero codes without the error bit.
    pub const fn is_warning(self) -> bool {
        self.0 != 0 && self.0 & ERROR_BIT == 0
    }

    /// Shorthand for error propagation at protocol boundaries: `Ok(())` for
    /// success and warnings, `Err(self)` for errors.
    pub fn to_result(self) -> Result<(), Status> {
        if self.is_error() { Err(self) } else { Ok(()) }
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Status::SUCCESS => "Success",
            Status::LOAD_ERROR => "Load Error",
            Status::INVALID_PARAMETER => "Invalid Parameter",
            Status::UNSUPPORTED => "Unsupported",
            Status::BAD_BUFFER_SIZE => "Bad Buffer Size",
            Status::BUFFER_TOO_SMALL => "Buffer Too Small",
            Status::NOT_READY => "Not Ready",
            Status::DEVICE_ERROR => "Device Error",
            Status::WRITE_PROTECTED => "Write Protected",
            Status::OUT_OF_RESOURCES => "Out of Resources",
            Status::VOLUME_CORRUPTED => "Volume Corrupted",
            Status::VOLUME_FULL => "Volume Full",
            Status::NO_MEDIA => "No Media",
            Status::MEDIA_CHANGED => "Media Changed",
            Status::NOT_FOUND => "Not Found",
            Status::ACCESS_DENIED => "Access Denied",
            Status::NO_RESPONSE => "No Response",
            Status::NO_MAPPING => "No Mapping",
            Status::TIMEOUT => "Timeout",
            Status::NOT_STARTED => "Not Started",
            Status::ALREADY_STARTED => "Already Started",
            Status::ABORTED => "Aborted",
            Status::ICMP_ERROR => "ICMP Error",
            Status::TFTP_ERROR => "TFTP Error",
            Status::PROTOCOL_ERROR => "Protocol Error",
            Status::INCOMPATIBLE_VERSION => "Incompatible Version",
            Status::SECURITY_VIOLATION => "Security Violation",
            Status::CRC_ERROR => "CRC Error",
            Status::END_OF_MEDIA => "End of Media",
            Status::END_OF_FILE => "End of File",
            Status::INVALID_LANGUAGE => "Invalid Language",
            Status::COMPROMISED_DATA => "Compromised Data",
            Status::WARN_UNKNOWN_GLYPH => "Warning Unknown Glyph",
            Status::WARN_DELETE_FAILURE => "Warning Delete Failure",
            Status::WARN_WRITE_FAILURE => "Warning Write Failure",
            Status::WARN_BUFFER_TOO_SMALL => "Warning Buffer Too Small",
            _ => return None,
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Status({:#x})", self.0),
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Status({name})"),
            None => write!(f, "Status({:#x})", self.0),
        }
    }
}
