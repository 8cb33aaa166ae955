use std::fmt;
use std::path::Path;

use tracing::{error, info, warn};

use crate::casc_api::{
    CascApi, FileId, LocaleFlags, OpenFlags, RawHandle, SharedApi, StorageInfo, StorageInfoClass,
};
use crate::casc_file::CascFile;
use crate::error::{CascError, Result};

/// An opened CASC storage, exclusively owning its native handle.
///
/// `CascStorage` is the entry point of the crate. [`CascStorage::open`] asks
/// the reader to open the archive at a filesystem path; the returned value
/// owns the native handle and closes it exactly once when dropped. Files are
/// opened through [`CascStorage::open_file`] and borrow the storage, so a
/// file handle cannot outlive the storage it came from.
///
/// ```no_run
/// use std::io::Read;
/// use casc_handles::{CascStorage, LocaleFlags, SharedApi};
///
/// fn dump(api: SharedApi) -> Result<(), Box<dyn std::error::Error>> {
///     let storage = CascStorage::open(api, r"C:\Games\WoW", LocaleFlags::EN_US)?;
///     println!("build {}", storage.build_number());
///
///     let mut file = storage.open_file("interface/framexml/localization.lua", LocaleFlags::EN_US, true, false)?;
///     let mut contents = Vec::new();
///     file.read_to_end(&mut contents)?;
///     Ok(())
/// }
/// ```
///
/// # Thread Safety
///
/// No internal synchronization is provided. A storage and the files derived
/// from it must be confined to one thread unless the underlying reader
/// documents otherwise.
pub struct CascStorage {
    /// The reader instance that produced the handle.
    api: SharedApi,
    /// The owned native storage handle; never `NULL` for a live value.
    handle: RawHandle,
}

impl CascStorage {
    /// Opens the CASC storage at `folder` with the requested locale mask.
    ///
    /// On failure the code set by the failing open call is captured before
    /// the half-open handle is closed, restored to the reader's last-error
    /// register afterwards, and returned inside the error. The close that
    /// cleans up the failed open is never allowed to clobber the observable
    /// code.
    pub fn open<P: AsRef<Path>>(
        api: SharedApi,
        folder: P,
        locale_mask: LocaleFlags,
    ) -> Result<Self> {
        let path = folder.as_ref();
        let mut handle = RawHandle::NULL;
        if !api.open_storage(path, locale_mask, &mut handle) {
            // The code set by the failed *open*, not by the *close* below.
            let code = api.last_error();
            error!("Error opening casc storage '{}': {}", path.display(), code);
            api.close_storage(handle);
            api.set_last_error(code);
            return Err(CascError::OpenStorage {
                path: path.to_path_buf(),
                code,
            });
        }

        info!("Opened casc storage '{}'", path.display());
        Ok(CascStorage { api, handle })
    }

    /// Opens a file within this storage by name or file data id.
    ///
    /// A failed open is logged only when `log_errors` is set; either way the
    /// failing call's code survives the cleanup close, exactly as in
    /// [`CascStorage::open`]. `zerofill_encrypted_parts` asks the reader to
    /// return zero bytes for encrypted regions whose key is unknown instead
    /// of failing.
    pub fn open_file(
        &self,
        id: impl Into<FileId>,
        locale_mask: LocaleFlags,
        log_errors: bool,
        zerofill_encrypted_parts: bool,
    ) -> Result<CascFile<'_>> {
        let id = id.into();
        let mut flags = OpenFlags::empty();
        if zerofill_encrypted_parts {
            flags |= OpenFlags::OVERCOME_ENCRYPTED;
        }

        let mut handle = RawHandle::NULL;
        if !self.api.open_file(self.handle, &id, locale_mask, flags, &mut handle) {
            let code = self.api.last_error();
            if log_errors {
                warn!("Failed to open {} in CASC storage: {}", id, code);
            }

            self.api.close_file(handle);
            self.api.set_last_error(code);
            return Err(CascError::OpenFile { id, code });
        }

        Ok(CascFile::new(self, handle))
    }

    /// The build number of the opened archive, or 0 if the product query
    /// fails.
    pub fn build_number(&self) -> u32 {
        match self.storage_info(StorageInfoClass::Product) {
            Some(StorageInfo::Product(product)) => product.build_number,
            _ => 0,
        }
    }

    /// The bitmask of locale variants installed in the archive, or the empty
    /// mask if the query fails.
    pub fn installed_locales(&self) -> LocaleFlags {
        match self.storage_info(StorageInfoClass::InstalledLocales) {
            Some(StorageInfo::InstalledLocales(locales)) => locales,
            _ => LocaleFlags::empty(),
        }
    }

    /// Whether the storage knows the TACT encryption key with the given
    /// 64-bit lookup value.
    pub fn has_tact_key(&self, key_lookup: u64) -> bool {
        self.api.find_encryption_key(self.handle, key_lookup).is_some()
    }

    /// [`CascStorage::has_tact_key`] for a lookup given as a 16-digit hex
    /// string, the spelling key lists use. Malformed lookups are simply not
    /// present.
    pub fn has_tact_key_hex(&self, key_lookup: &str) -> bool {
        let Ok(bytes) = hex::decode(key_lookup) else {
            return false;
        };
        let Ok(raw) = <[u8; 8]>::try_from(bytes.as_slice()) else {
            return false;
        };
        self.has_tact_key(u64::from_be_bytes(raw))
    }

    fn storage_info(&self, class: StorageInfoClass) -> Option<StorageInfo> {
        self.api.storage_info(self.handle, class)
    }

    pub(crate) fn api(&self) -> &dyn CascApi {
        &*self.api
    }
}

impl Drop for CascStorage {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            self.api.close_storage(self.handle);
        }
    }
}

impl fmt::Debug for CascStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascStorage")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
