//! Hand-defined UEFI ABI.
//!
//! Types and records used for communication with the firmware: status codes,
//! GUIDs, the service tables, the protocols the driver publishes and
//! consumes, and the variable-length information records it produces.
//! Everything is `#[repr(C)]` with `extern "efiapi"` function pointers so a
//! record installed through `InstallProtocolInterface` is consumed by the
//! firmware as-is.

#![allow(missing_docs, missing_debug_implementations)]

pub mod guid;
pub mod info;
#[cfg(feature = "global-allocator")]
mod pool;
pub mod protocols;
pub mod status;
pub mod tables;

#[cfg(feature = "global-allocator")]
pub use pool::PoolAllocator;
pub use guid::Guid;
pub use status::Status;
pub use tables::{Boolean, Char16, Event, Handle, Time};

pub(crate) use tables::FirmwareCell;
