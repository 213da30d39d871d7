//! The parser kit boundary.
//!
//! A filesystem parser is an external, read-only on-disk format
//! implementation. This module defines the narrow interface the shell
//! consumes ([`FsParser`] / [`ParserFile`]), the process-wide registration of
//! the one parser a driver binary embeds, and the adapter calls the rest of
//! the shell goes through. Parsers never see firmware types: all their block
//! I/O is serviced through a [`ParserDevice`], which forwards to the bound
//! volume's byte-addressable disk transport.

use alloc::boxed::Box;
use alloc::string::String;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use log::error;

use crate::error::ParserError;
use crate::volume::Volume;

/// The parsers' fixed logical sector size. Media block size does not enter
/// into parser I/O addressing.
pub const SECTOR_SIZE: u64 = 512;

/// Per-entry metadata delivered to a directory hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirEntryInfo {
    /// Entry is a directory.
    pub dir: bool,
    /// Modification time, seconds since the UNIX epoch, when the on-disk
    /// format records one.
    pub mtime: Option<i32>,
    /// The filesystem matches names case-insensitively.
    pub case_insensitive: bool,
    /// Inode or equivalent identity, when the format has one.
    pub inode: Option<u64>,
}

/// Directory iteration callback: invoked once per entry, returning `true`
/// short-circuits the listing.
pub type DirHook<'a> = &'a mut dyn FnMut(&str, &DirEntryInfo) -> bool;

/// One open byte stream inside a parser. Dropping the handle releases it;
/// directories never hold one.
pub trait ParserFile {
    /// Total stream length in bytes.
    fn size(&self) -> u64;
    /// Current stream offset.
    fn offset(&self) -> u64;
    /// Reposition the stream.
    fn set_offset(&mut self, offset: u64);
    /// Read at the current offset into `buf`, returning the byte count.
    /// The shell clamps `buf` against the remaining stream before calling
    /// and advances the offset itself afterwards.
    fn read(&mut self, device: &ParserDevice, buf: &mut [u8]) -> Result<usize, ParserError>;
}

/// A read-only on-disk filesystem parser.
pub trait FsParser: Sync {
    /// Short filesystem family name; keys the GUID registry.
    fn name(&self) -> &'static str;

    /// Iterate the entries of the directory at `path`, invoking `hook` per
    /// entry. `.` and `..` may or may not be reported; the shell filters.
    fn dir(
        &self,
        device: &ParserDevice,
        path: &str,
        hook: DirHook<'_>,
    ) -> Result<(), ParserError>;

    /// Open the regular file at `path` for streaming reads.
    fn open(&self, device: &ParserDevice, path: &str)
    -> Result<Box<dyn ParserFile>, ParserError>;

    /// The volume label. May legitimately be empty.
    fn label(&self, device: &ParserDevice) -> Result<String, ParserError>;

    /// Best-effort volume UUID.
    fn uuid(&self, _device: &ParserDevice) -> Result<Option<String>, ParserError> {
        Ok(None)
    }
}

/// A parser module as embedded in one driver binary: the parser itself plus
/// its global lifecycle hooks, run at driver install and uninstall.
pub struct ParserModule {
    /// The filesystem parser.
    pub parser: &'static dyn FsParser,
    /// Global bring-up hook, run at driver install.
    pub init: fn(),
    /// Global tear-down hook, run at driver uninstall.
    pub fini: fn(),
}

impl core::fmt::Debug for ParserModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ParserModule({})", self.parser.name())
    }
}

// One driver binary embeds exactly one parser; registration is the Rust
// rendition of the kit's process-wide current-filesystem singleton.
static ACTIVE: AtomicPtr<ParserModule> = AtomicPtr::new(ptr::null_mut());

/// Register `module` as the active parser and run its `init` hook.
pub fn register(module: &'static ParserModule) {
    ACTIVE.store(module as *const _ as *mut _, Ordering::Release);
    (module.init)();
}

/// Run the active parser's `fini` hook and deregister it.
pub fn unregister() {
    let module = ACTIVE.swap(ptr::null_mut(), Ordering::AcqRel);
    if let Some(module) = unsafe { (module as *const ParserModule).as_ref() } {
        (module.fini)();
    }
}

/// The registered parser module, if any.
pub fn active() -> Option<&'static ParserModule> {
    unsafe { (ACTIVE.load(Ordering::Acquire) as *const ParserModule).as_ref() }
}

fn active_parser() -> Result<&'static dyn FsParser, ParserError> {
    match active() {
        Some(module) => Ok(module.parser),
        None => {
            error!("No filesystem parser is registered");
            Err(ParserError::UnknownFs)
        }
    }
}

/// Pairs the active parser with one bound volume and services the parser's
/// block I/O through that volume's disk transport.
pub struct ParserDevice {
    volume: NonNull<Volume>,
}

impl ParserDevice {
    /// Bind a device to `volume`. Must be released (dropped) before the
    /// volume goes away.
    pub(crate) fn new(volume: NonNull<Volume>) -> Self {
        Self { volume }
    }

    fn volume(&self) -> &Volume {
        unsafe { self.volume.as_ref() }
    }

    /// Read `buf.len()` bytes at `sector * 512 + offset` from the volume's
    /// disk transport.
    pub fn read_disk(&self, sector: u64, offset: u64, buf: &mut [u8]) -> Result<(), ParserError> {
        self.volume()
            .disk_read(sector * SECTOR_SIZE + offset, buf)
    }
}

impl core::fmt::Debug for ParserDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ParserDevice({:p})", self.volume)
    }
}

/*
 * Adapter calls: one per parser kit operation, each resolving the active
 * parser and the volume's device.
 */

/// Probe: a root listing with a hook that bails at the first entry. The
/// volume is recognized iff the parser raises no error.
pub(crate) fn probe(volume: &Volume) -> bool {
    let Ok(parser) = active_parser() else {
        return false;
    };
    parser
        .dir(volume.device(), "/", &mut |_, _| true)
        .is_ok()
}

pub(crate) fn dir(volume: &Volume, path: &str, hook: DirHook<'_>) -> Result<(), ParserError> {
    active_parser()?.dir(volume.device(), path, hook)
}

pub(crate) fn open(volume: &Volume, path: &str) -> Result<Box<dyn ParserFile>, ParserError> {
    active_parser()?.open(volume.device(), path)
}

/// Clamped read at `file`'s offset. The parser is not trusted to advance its
/// own offset; the adapter pushes the new position after a successful read.
pub(crate) fn read(
    volume: &Volume,
    file: &mut dyn ParserFile,
    buf: &mut [u8],
) -> Result<usize, ParserError> {
    let remaining = file.size().saturating_sub(file.offset());
    let want = (buf.len() as u64).min(remaining) as usize;
    if want == 0 {
        return Ok(0);
    }
    let offset = file.offset();
    let read = file.read(volume.device(), &mut buf[..want])?;
    file.set_offset(offset + read as u64);
    Ok(read)
}

pub(crate) fn label(volume: &Volume) -> Result<String, ParserError> {
    active_parser()?.label(volume.device())
}

pub(crate) fn uuid(volume: &Volume) -> Result<Option<String>, ParserError> {
    active_parser()?.uuid(volume.device())
}
