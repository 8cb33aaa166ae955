//! # casc-handles
//!
//! `casc-handles` is a safe ownership and error-translation layer for CASC
//! storage readers. CASC readers expose a C-style surface: opaque handles,
//! boolean returns, file sizes and positions split into 32-bit halves, and a
//! global "last error" register that any call may overwrite. This crate wraps
//! that surface behind two RAII types, [`CascStorage`] and [`CascFile`], that
//! release each handle exactly once and report failures as `Result`s carrying
//! the native [`ErrorCode`].
//!
//! The reader itself stays external: it is modeled by the [`CascApi`] trait,
//! one method per native call, so the wrapper works against any backend that
//! can provide the surface (including a test double).
//!
//! ## Usage
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! casc-handles = "0.2"
//! ```
//!
//! ### Example: opening a storage and reading a file
//! ```no_run
//! use std::io::Read;
//! use casc_handles::{CascStorage, LocaleFlags, SharedApi};
//!
//! fn extract(api: SharedApi) -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = CascStorage::open(api, "path/to/casc/storage", LocaleFlags::EN_US)?;
//!     println!("build {}", storage.build_number());
//!
//!     // By name, or by file data id via `storage.open_file(801575u32, ..)`.
//!     let mut file = storage.open_file("character/human/male/humanmale.m2", LocaleFlags::EN_US, true, false)?;
//!     let mut contents = Vec::new();
//!     file.read_to_end(&mut contents)?;
//!     Ok(())
//! }
//! ```

pub mod casc_api;
pub mod casc_file;
pub mod casc_storage;
pub mod error;

pub use casc_api::{
    CascApi, FileId, LocaleFlags, OpenFlags, RawHandle, SeekOrigin, SharedApi, StorageInfo,
    StorageInfoClass, StorageProduct, INVALID_POS, INVALID_SIZE,
};
pub use casc_file::CascFile;
pub use casc_storage::CascStorage;
pub use error::{CascError, ErrorCode, Result};
