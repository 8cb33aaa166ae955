use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use crate::casc_api::{CascApi, RawHandle, SeekOrigin, INVALID_POS, INVALID_SIZE};
use crate::casc_storage::CascStorage;
use crate::error::{CascError, Result};

/// An opened file within a [`CascStorage`], exclusively owning its native
/// handle.
///
/// The borrow of the parent storage keeps the handle from outliving the
/// storage that produced it. Reading and seeking go through the standard
/// [`Read`] and [`Seek`] traits; the reader's split 32-bit size and position
/// halves are joined to 64-bit values here.
pub struct CascFile<'a> {
    storage: &'a CascStorage,
    /// The owned native file handle; never `NULL` for a live value.
    handle: RawHandle,
}

impl<'a> CascFile<'a> {
    pub(crate) fn new(storage: &'a CascStorage, handle: RawHandle) -> Self {
        CascFile { storage, handle }
    }

    /// The total size of the file in bytes.
    pub fn size(&self) -> Result<u64> {
        let mut size_high = 0u32;
        let size_low = self.api().file_size(self.handle, &mut size_high);
        if size_low == INVALID_SIZE {
            return Err(CascError::FileSize(self.api().last_error()));
        }

        Ok(u64::from(size_high) << 32 | u64::from(size_low))
    }

    /// The current read position, obtained as a zero-distance relative seek.
    pub fn position(&self) -> Result<u64> {
        self.seek_native(0, SeekOrigin::Current)
    }

    /// Seeks to an absolute position and returns it. Positions beyond the end
    /// of data are valid. Fails exactly when the reader reports the
    /// invalid-position sentinel.
    pub fn set_position(&mut self, position: u64) -> Result<u64> {
        self.seek_native(position as i64, SeekOrigin::Begin)
    }

    /// Issues the native file pointer call, splitting the 64-bit distance
    /// into the low/high halves the reader expects and joining the resulting
    /// position back up.
    fn seek_native(&self, distance: i64, origin: SeekOrigin) -> Result<u64> {
        let mut high = (distance >> 32) as i32;
        let low = distance as i32;
        let pos_low = self.api().set_file_pointer(self.handle, low, Some(&mut high), origin);
        if pos_low == INVALID_POS {
            return Err(CascError::Seek(self.api().last_error()));
        }

        Ok(u64::from(high as u32) << 32 | u64::from(pos_low))
    }

    fn api(&self) -> &dyn CascApi {
        self.storage.api()
    }
}

impl Read for CascFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // The native call takes a 32-bit count.
        let want = buf.len().min(u32::MAX as usize);
        let mut bytes_read = 0u32;
        if !self.api().read_file(self.handle, &mut buf[..want], &mut bytes_read) {
            return Err(io::Error::other(CascError::Read(self.api().last_error())));
        }

        Ok(bytes_read as usize)
    }
}

impl Seek for CascFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (distance, origin) = match pos {
            SeekFrom::Start(offset) => (offset as i64, SeekOrigin::Begin),
            SeekFrom::Current(offset) => (offset, SeekOrigin::Current),
            SeekFrom::End(offset) => (offset, SeekOrigin::End),
        };
        self.seek_native(distance, origin).map_err(io::Error::other)
    }
}

impl Drop for CascFile<'_> {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            self.api().close_file(self.handle);
        }
    }
}

impl fmt::Debug for CascFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascFile")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
