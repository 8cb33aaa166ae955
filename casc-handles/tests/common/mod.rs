#![allow(dead_code)]

//! An in-memory stand-in for the native CASC reader.
//!
//! `FakeCasc` implements [`CascApi`] over a fixed set of storages and files,
//! with the same failure conventions as the real surface: codes published to
//! the last-error register, half-open handles on request, and close calls
//! that overwrite the register (the hazard the wrapper must defend against).
//! Close calls are recorded so tests can assert exactly-once release.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use casc_handles::{
    CascApi, ErrorCode, FileId, LocaleFlags, OpenFlags, RawHandle, SeekOrigin, StorageInfo,
    StorageInfoClass, StorageProduct, INVALID_POS, INVALID_SIZE,
};

pub struct FakeFile {
    pub name: Option<String>,
    pub data_id: Option<u32>,
    pub data: Vec<u8>,
    pub declared_size: u64,
    pub encrypted_with: Option<u64>,
}

impl FakeFile {
    pub fn named(name: &str, data: &[u8]) -> Self {
        FakeFile {
            name: Some(name.to_string()),
            data_id: None,
            data: data.to_vec(),
            declared_size: data.len() as u64,
            encrypted_with: None,
        }
    }

    pub fn with_data_id(data_id: u32, data: &[u8]) -> Self {
        FakeFile {
            name: None,
            data_id: Some(data_id),
            data: data.to_vec(),
            declared_size: data.len() as u64,
            encrypted_with: None,
        }
    }

    /// Marks the file as encrypted with the given key lookup.
    pub fn encrypted(mut self, key_lookup: u64) -> Self {
        self.encrypted_with = Some(key_lookup);
        self
    }

    /// Overrides the reported size, independent of the backing data.
    pub fn sized(mut self, declared_size: u64) -> Self {
        self.declared_size = declared_size;
        self
    }

    fn matches(&self, id: &FileId) -> bool {
        match id {
            FileId::Name(name) => self.name.as_deref() == Some(name.as_str()),
            FileId::DataId(data_id) => self.data_id == Some(*data_id),
        }
    }
}

pub struct FakeStorage {
    pub path: PathBuf,
    pub product: Option<StorageProduct>,
    pub locales: Option<LocaleFlags>,
    pub keys: HashMap<u64, [u8; 16]>,
    pub files: Vec<FakeFile>,
    pub fail_open_with: Option<ErrorCode>,
}

impl FakeStorage {
    pub fn new(path: &str) -> Self {
        FakeStorage {
            path: PathBuf::from(path),
            product: None,
            locales: None,
            keys: HashMap::new(),
            files: Vec::new(),
            fail_open_with: None,
        }
    }

    pub fn product(mut self, code_name: &str, build_number: u32) -> Self {
        self.product = Some(StorageProduct {
            code_name: code_name.to_string(),
            build_number,
        });
        self
    }

    pub fn locales(mut self, locales: LocaleFlags) -> Self {
        self.locales = Some(locales);
        self
    }

    pub fn key(mut self, lookup: u64, key: [u8; 16]) -> Self {
        self.keys.insert(lookup, key);
        self
    }

    pub fn file(mut self, file: FakeFile) -> Self {
        self.files.push(file);
        self
    }

    /// Makes every open of this storage fail with `code` after handing back a
    /// half-open handle that still needs closing.
    pub fn fail_open_with(mut self, code: ErrorCode) -> Self {
        self.fail_open_with = Some(code);
        self
    }
}

#[derive(Clone, Copy)]
struct OpenedFile {
    storage_index: usize,
    file_index: usize,
    position: u64,
    zerofill: bool,
}

#[derive(Default)]
struct State {
    last_error: ErrorCode,
    next_handle: u64,
    open_storages: HashMap<RawHandle, usize>,
    open_files: HashMap<RawHandle, OpenedFile>,
    storage_closes: Vec<RawHandle>,
    file_closes: Vec<RawHandle>,
}

impl State {
    fn alloc_handle(&mut self) -> RawHandle {
        self.next_handle += 1;
        RawHandle(self.next_handle)
    }
}

pub struct FakeCasc {
    storages: Vec<FakeStorage>,
    state: Mutex<State>,
}

impl FakeCasc {
    pub fn new() -> Self {
        FakeCasc {
            storages: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_storage(storage: FakeStorage) -> Self {
        let mut fake = FakeCasc::new();
        fake.storages.push(storage);
        fake
    }

    /// Every handle ever passed to `close_storage`, in call order.
    pub fn storage_closes(&self) -> Vec<RawHandle> {
        self.state.lock().unwrap().storage_closes.clone()
    }

    /// Every handle ever passed to `close_file`, in call order.
    pub fn file_closes(&self) -> Vec<RawHandle> {
        self.state.lock().unwrap().file_closes.clone()
    }

    pub fn open_storage_count(&self) -> usize {
        self.state.lock().unwrap().open_storages.len()
    }

    pub fn open_file_count(&self) -> usize {
        self.state.lock().unwrap().open_files.len()
    }
}

impl CascApi for FakeCasc {
    fn open_storage(&self, path: &Path, _locale_mask: LocaleFlags, handle: &mut RawHandle) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(index) = self.storages.iter().position(|s| s.path.as_path() == path) else {
            state.last_error = ErrorCode::FILE_NOT_FOUND;
            return false;
        };

        if let Some(code) = self.storages[index].fail_open_with {
            *handle = state.alloc_handle();
            state.last_error = code;
            return false;
        }

        let h = state.alloc_handle();
        state.open_storages.insert(h, index);
        *handle = h;
        state.last_error = ErrorCode::SUCCESS;
        true
    }

    fn close_storage(&self, handle: RawHandle) {
        let mut state = self.state.lock().unwrap();
        state.storage_closes.push(handle);
        // Closing publishes its own result, which is exactly the clobbering
        // hazard the wrapper guards against.
        state.last_error = if state.open_storages.remove(&handle).is_some() {
            ErrorCode::SUCCESS
        } else {
            ErrorCode::INVALID_HANDLE
        };
    }

    fn open_file(
        &self,
        storage: RawHandle,
        id: &FileId,
        _locale_mask: LocaleFlags,
        flags: OpenFlags,
        handle: &mut RawHandle,
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(storage_index) = state.open_storages.get(&storage).copied() else {
            state.last_error = ErrorCode::INVALID_HANDLE;
            return false;
        };

        let st = &self.storages[storage_index];
        let Some(file_index) = st.files.iter().position(|f| f.matches(id)) else {
            state.last_error = ErrorCode::FILE_NOT_FOUND;
            return false;
        };

        let file = &st.files[file_index];
        let key_known = file
            .encrypted_with
            .map(|lookup| st.keys.contains_key(&lookup))
            .unwrap_or(true);
        let overcome = flags.contains(OpenFlags::OVERCOME_ENCRYPTED);
        if !key_known && !overcome {
            state.last_error = ErrorCode::FILE_ENCRYPTED;
            return false;
        }

        let h = state.alloc_handle();
        state.open_files.insert(
            h,
            OpenedFile {
                storage_index,
                file_index,
                position: 0,
                zerofill: !key_known && overcome,
            },
        );
        *handle = h;
        state.last_error = ErrorCode::SUCCESS;
        true
    }

    fn close_file(&self, handle: RawHandle) {
        let mut state = self.state.lock().unwrap();
        state.file_closes.push(handle);
        state.last_error = if state.open_files.remove(&handle).is_some() {
            ErrorCode::SUCCESS
        } else {
            ErrorCode::INVALID_HANDLE
        };
    }

    fn storage_info(&self, storage: RawHandle, class: StorageInfoClass) -> Option<StorageInfo> {
        let state = self.state.lock().unwrap();
        let index = state.open_storages.get(&storage).copied()?;
        let st = &self.storages[index];
        match class {
            StorageInfoClass::Product => st.product.clone().map(StorageInfo::Product),
            StorageInfoClass::InstalledLocales => st.locales.map(StorageInfo::InstalledLocales),
        }
    }

    fn find_encryption_key(&self, storage: RawHandle, key_lookup: u64) -> Option<[u8; 16]> {
        let state = self.state.lock().unwrap();
        let index = state.open_storages.get(&storage).copied()?;
        self.storages[index].keys.get(&key_lookup).copied()
    }

    fn file_size(&self, file: RawHandle, size_high: &mut u32) -> u32 {
        let mut state = self.state.lock().unwrap();
        let Some(opened) = state.open_files.get(&file).copied() else {
            state.last_error = ErrorCode::INVALID_HANDLE;
            return INVALID_SIZE;
        };

        let size = self.storages[opened.storage_index].files[opened.file_index].declared_size;
        *size_high = (size >> 32) as u32;
        size as u32
    }

    fn set_file_pointer(
        &self,
        file: RawHandle,
        distance_low: i32,
        distance_high: Option<&mut i32>,
        origin: SeekOrigin,
    ) -> u32 {
        let mut state = self.state.lock().unwrap();
        let Some(opened) = state.open_files.get(&file).copied() else {
            state.last_error = ErrorCode::INVALID_HANDLE;
            return INVALID_POS;
        };

        let size = self.storages[opened.storage_index].files[opened.file_index].declared_size;
        let distance = match &distance_high {
            Some(high) => (i64::from(**high) << 32) | i64::from(distance_low as u32),
            None => i64::from(distance_low),
        };
        let base = match origin {
            SeekOrigin::Begin => 0,
            SeekOrigin::Current => opened.position as i64,
            SeekOrigin::End => size as i64,
        };

        let target = base + distance;
        if target < 0 {
            state.last_error = ErrorCode::INVALID_PARAMETER;
            return INVALID_POS;
        }

        let target = target as u64;
        state.open_files.get_mut(&file).unwrap().position = target;
        if let Some(high) = distance_high {
            *high = (target >> 32) as i32;
        }
        state.last_error = ErrorCode::SUCCESS;
        target as u32
    }

    fn read_file(&self, file: RawHandle, buffer: &mut [u8], bytes_read: &mut u32) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(opened) = state.open_files.get(&file).copied() else {
            state.last_error = ErrorCode::INVALID_HANDLE;
            *bytes_read = 0;
            return false;
        };

        // An encrypted file without its key can only be open in zerofill
        // mode, so every open handle is readable.
        let f = &self.storages[opened.storage_index].files[opened.file_index];
        let available = f.declared_size.saturating_sub(opened.position);
        let count = (buffer.len() as u64).min(available) as usize;
        for (i, slot) in buffer[..count].iter_mut().enumerate() {
            *slot = if opened.zerofill {
                0
            } else {
                f.data.get(opened.position as usize + i).copied().unwrap_or(0)
            };
        }

        state.open_files.get_mut(&file).unwrap().position += count as u64;
        *bytes_read = count as u32;
        state.last_error = ErrorCode::SUCCESS;
        true
    }

    fn last_error(&self) -> ErrorCode {
        self.state.lock().unwrap().last_error
    }

    fn set_last_error(&self, code: ErrorCode) {
        self.state.lock().unwrap().last_error = code;
    }
}
