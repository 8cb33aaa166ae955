use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::ErrorCode;

/// Low 32 bits of a position that the reader could not produce.
pub const INVALID_POS: u32 = 0xFFFF_FFFF;
/// Low 32 bits of a size that the reader could not produce.
pub const INVALID_SIZE: u32 = 0xFFFF_FFFF;

/// An opaque native handle value.
///
/// The reader hands these out from its open calls; the wrapper types in this
/// crate are the only owners and release each one exactly once. `NULL` is the
/// "no resource" sentinel and must never be passed to a close call by an
/// owning wrapper.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

impl RawHandle {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// Identifies a file within a storage, either by path-like name or by the
/// numeric file data id the root manifest assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileId {
    Name(String),
    DataId(u32),
}

impl From<&str> for FileId {
    fn from(name: &str) -> Self {
        FileId::Name(name.to_string())
    }
}

impl From<String> for FileId {
    fn from(name: String) -> Self {
        FileId::Name(name)
    }
}

impl From<u32> for FileId {
    fn from(data_id: u32) -> Self {
        FileId::DataId(data_id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileId::Name(name) => write!(f, "'{name}'"),
            FileId::DataId(data_id) => write!(f, "FileDataId {data_id}"),
        }
    }
}

bitflags! {
    /// Bitmask of localized data variants, as installed in a storage or
    /// requested by an open call. Passed through to the reader unvalidated.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LocaleFlags: u32 {
        const EN_US = 0x0000_0002;
        const KO_KR = 0x0000_0004;
        const FR_FR = 0x0000_0010;
        const DE_DE = 0x0000_0020;
        const ZH_CN = 0x0000_0040;
        const ES_ES = 0x0000_0080;
        const ZH_TW = 0x0000_0100;
        const EN_GB = 0x0000_0200;
        const EN_CN = 0x0000_0400;
        const EN_TW = 0x0000_0800;
        const ES_MX = 0x0000_1000;
        const RU_RU = 0x0000_2000;
        const PT_BR = 0x0000_4000;
        const IT_IT = 0x0000_8000;
        const PT_PT = 0x0001_0000;
        const ALL = u32::MAX;
    }
}

bitflags! {
    /// Flags for the native file open call.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// Verify frame checksums while reading.
        const STRICT_DATA_CHECK = 0x0000_0010;
        /// Zero-fill encrypted regions whose key is unknown instead of
        /// failing the open.
        const OVERCOME_ENCRYPTED = 0x0000_0020;
    }
}

/// Selector for the typed storage info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageInfoClass {
    Product,
    InstalledLocales,
}

/// Product details of an opened storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageProduct {
    pub code_name: String,
    pub build_number: u32,
}

/// Result of a storage info query; the variant matches the queried class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageInfo {
    Product(StorageProduct),
    InstalledLocales(LocaleFlags),
}

/// Origin for the native file pointer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Begin,
    Current,
    End,
}

/// The native CASC reader surface this crate wraps.
///
/// Mirrors the reader's C-style API one call per method: opaque handles,
/// boolean returns, 32-bit size/position halves, and an ambient last-error
/// register. A failing call publishes its code to the register before
/// returning, and any later call may overwrite it, so callers that need the
/// code must read it before touching the API again. The wrapper types own
/// that discipline so their callers do not have to.
pub trait CascApi {
    /// Opens the storage at `path`. On success writes the new handle through
    /// `handle` and returns true; on failure publishes a code to the register
    /// and returns false, possibly leaving a half-open handle in `handle`
    /// that still needs closing.
    fn open_storage(&self, path: &Path, locale_mask: LocaleFlags, handle: &mut RawHandle) -> bool;

    fn close_storage(&self, handle: RawHandle);

    /// Opens a file within an open storage, keyed by name or data id.
    /// Failure semantics match [`CascApi::open_storage`].
    fn open_file(
        &self,
        storage: RawHandle,
        id: &FileId,
        locale_mask: LocaleFlags,
        flags: OpenFlags,
        handle: &mut RawHandle,
    ) -> bool;

    fn close_file(&self, handle: RawHandle);

    /// Typed info query; `None` when the query fails.
    fn storage_info(&self, storage: RawHandle, class: StorageInfoClass) -> Option<StorageInfo>;

    /// Looks up a TACT encryption key by its 64-bit lookup value.
    fn find_encryption_key(&self, storage: RawHandle, key_lookup: u64) -> Option<[u8; 16]>;

    /// Returns the low 32 bits of the file size, writing the high 32 bits
    /// through `size_high`. [`INVALID_SIZE`] signals failure.
    fn file_size(&self, file: RawHandle, size_high: &mut u32) -> u32;

    /// Moves the file pointer by a 64-bit distance split into halves.
    /// Returns the low 32 bits of the resulting position, writing the high
    /// bits back through `distance_high` when provided. [`INVALID_POS`]
    /// signals failure.
    fn set_file_pointer(
        &self,
        file: RawHandle,
        distance_low: i32,
        distance_high: Option<&mut i32>,
        origin: SeekOrigin,
    ) -> u32;

    /// Reads up to `buffer.len()` bytes at the current position. The byte
    /// count actually read is written through `bytes_read`; reading at end of
    /// data succeeds with a count of zero.
    fn read_file(&self, file: RawHandle, buffer: &mut [u8], bytes_read: &mut u32) -> bool;

    /// Reads the ambient last-error register.
    fn last_error(&self) -> ErrorCode;

    /// Overwrites the ambient last-error register.
    fn set_last_error(&self, code: ErrorCode);
}

// Type alias for the shared reader instance handed to the wrapper types.
pub type SharedApi = Arc<dyn CascApi>;
