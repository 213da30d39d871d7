//! Read-only UEFI filesystem driver shell.
//!
//! Firmware only understands a handful of on-disk formats natively. This
//! crate is the machinery that turns an embedded read-only filesystem parser
//! into a standalone firmware driver: it binds controllers through the
//! driver-binding contract, publishes the simple-file-system protocol over a
//! recognized partition, and mediates every file-handle call between the
//! firmware's object model and the parser — path normalization, UTF-8/UTF-16
//! transcoding, cursor-based directory enumeration over callback-based
//! listings, and a faithful mapping of the parser error taxonomy onto
//! firmware statuses.
//!
//! A driver binary supplies a [`ParserModule`] and forwards its image entry
//! point to [`install`]:
//!
//! ```ignore
//! static MODULE: ParserModule = ParserModule {
//!     parser: &NtfsParser,
//!     init: ntfs_init,
//!     fini: ntfs_fini,
//! };
//!
//! #[export_name = "efi_main"]
//! unsafe extern "efiapi" fn main(
//!     image_handle: efi::Handle,
//!     system_table: *mut efi::tables::SystemTable,
//! ) -> efi::Status {
//!     unsafe { efifs::install(image_handle, system_table, &MODULE) }
//! }
//! ```
//!
//! Writes of any kind are rejected with the statuses the firmware contract
//! prescribes; the driver never mutates media.

#![cfg_attr(not(test), no_std)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

extern crate alloc;

pub use crate::binding::{install, uninstall};
pub use crate::error::ParserError;
pub use crate::file::File;
pub use crate::parser::{
    DirEntryInfo, DirHook, FsParser, ParserDevice, ParserFile, ParserModule, SECTOR_SIZE,
};
pub use crate::registry::fs_guid;
pub use crate::volume::Volume;

mod binding;
pub mod codec;
mod component_name;
pub mod efi;
pub mod error;
mod file;
mod logger;
pub mod parser;
pub mod path;
mod registry;
pub mod time;
mod volume;

#[cfg(feature = "panic-handler")]
mod panic;
