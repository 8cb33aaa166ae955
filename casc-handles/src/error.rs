use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::casc_api::FileId;

/// An error code from the native CASC reader's 32-bit code space.
///
/// The reader reports failures through a process-global "last error" register
/// using this fixed code set. The wrapper captures codes into this newtype and
/// carries them inside [`CascError`] so callers never have to race the
/// register themselves.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const SUCCESS: Self = Self(0);
    pub const FILE_NOT_FOUND: Self = Self(2);
    pub const ACCESS_DENIED: Self = Self(5);
    pub const INVALID_HANDLE: Self = Self(6);
    pub const NOT_ENOUGH_MEMORY: Self = Self(8);
    pub const BAD_FORMAT: Self = Self(11);
    pub const NO_MORE_FILES: Self = Self(18);
    pub const HANDLE_EOF: Self = Self(38);
    pub const NOT_SUPPORTED: Self = Self(50);
    pub const INVALID_PARAMETER: Self = Self(87);
    pub const DISK_FULL: Self = Self(112);
    pub const INSUFFICIENT_BUFFER: Self = Self(122);
    pub const ALREADY_EXISTS: Self = Self(183);
    pub const CAN_NOT_COMPLETE: Self = Self(1003);
    pub const FILE_CORRUPT: Self = Self(1392);
    pub const FILE_ENCRYPTED: Self = Self(6000);

    /// Returns the short literal name for this code.
    ///
    /// Total over the full 32-bit space: every code not in the reader's fixed
    /// set maps to `"UNKNOWN"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::SUCCESS => "SUCCESS",
            Self::FILE_CORRUPT => "FILE_CORRUPT",
            Self::CAN_NOT_COMPLETE => "CAN_NOT_COMPLETE",
            Self::HANDLE_EOF => "HANDLE_EOF",
            Self::NO_MORE_FILES => "NO_MORE_FILES",
            Self::BAD_FORMAT => "BAD_FORMAT",
            Self::INSUFFICIENT_BUFFER => "INSUFFICIENT_BUFFER",
            Self::ALREADY_EXISTS => "ALREADY_EXISTS",
            Self::DISK_FULL => "DISK_FULL",
            Self::INVALID_PARAMETER => "INVALID_PARAMETER",
            Self::NOT_SUPPORTED => "NOT_SUPPORTED",
            Self::NOT_ENOUGH_MEMORY => "NOT_ENOUGH_MEMORY",
            Self::INVALID_HANDLE => "INVALID_HANDLE",
            Self::ACCESS_DENIED => "ACCESS_DENIED",
            Self::FILE_NOT_FOUND => "FILE_NOT_FOUND",
            Self::FILE_ENCRYPTED => "FILE_ENCRYPTED",
            _ => "UNKNOWN",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents all possible errors that can occur in the handle wrapper.
///
/// Every fallible wrapper operation returns one of these instead of leaving
/// the caller to query the native last-error register. The native code that
/// caused the failure is always carried along and can be read back with
/// [`CascError::code`].
#[derive(Error, Debug)]
pub enum CascError {
    /// Opening a CASC storage directory failed.
    #[error("failed to open casc storage '{}': {}", .path.display(), .code)]
    OpenStorage { path: PathBuf, code: ErrorCode },
    /// Opening a file within an open storage failed.
    #[error("failed to open {} in CASC storage: {}", .id, .code)]
    OpenFile { id: FileId, code: ErrorCode },
    /// The file size query failed.
    #[error("failed to query file size: {0}")]
    FileSize(ErrorCode),
    /// A seek resolved to the reader's invalid-position sentinel.
    #[error("failed to set file pointer: {0}")]
    Seek(ErrorCode),
    /// A read failed at the native layer.
    #[error("failed to read file: {0}")]
    Read(ErrorCode),
}

impl CascError {
    /// The native error code behind this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CascError::OpenStorage { code, .. } | CascError::OpenFile { code, .. } => *code,
            CascError::FileSize(code) | CascError::Seek(code) | CascError::Read(code) => *code,
        }
    }
}

pub type Result<T> = std::result::Result<T, CascError>;
