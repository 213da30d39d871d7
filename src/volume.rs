//! The volume object: one bound controller, one parser device, one root.
//!
//! A `Volume` is created at bind-start and destroyed at bind-stop; the
//! simple-file-system record it carries is installed on the controller only
//! after the parser has recognized the on-disk format, so `OpenVolume` can
//! never observe a half-mounted volume.

use alloc::boxed::Box;
use alloc::string::String;
use core::ffi::c_void;
use core::ptr::NonNull;

use log::{info, warn};

use crate::efi::Status;
use crate::efi::protocols::{
    BlockIoMedia, BlockIoProtocol, DiskIoProtocol, FileProtocol,
    SIMPLE_FILE_SYSTEM_PROTOCOL_REVISION, SimpleFileSystemProtocol,
};
use crate::error::ParserError;
use crate::file::File;
use crate::parser::{self, ParserDevice};

/// Block size assumed when the media reports none.
pub const FALLBACK_BLOCK_SIZE: u32 = 512;

/// Per-controller state behind one published simple-file-system record.
#[repr(C)]
pub struct Volume {
    /// Published protocol record; must stay the first field so the volume
    /// can be recovered from the installed interface pointer.
    proto: SimpleFileSystemProtocol,
    block_io: NonNull<BlockIoProtocol>,
    disk_io: NonNull<DiskIoProtocol>,
    device: ParserDevice,
    root: *mut File,
    device_path: Option<String>,
}

impl Volume {
    /// Build a volume over the controller's transports, probe it, and
    /// materialize the root directory. The returned pointer is heap-pinned;
    /// release it with [`Volume::destroy`].
    pub fn create(
        block_io: NonNull<BlockIoProtocol>,
        disk_io: NonNull<DiskIoProtocol>,
    ) -> Result<NonNull<Volume>, Status> {
        let volume = Box::new(Volume {
            proto: SimpleFileSystemProtocol {
                revision: SIMPLE_FILE_SYSTEM_PROTOCOL_REVISION,
                open_volume,
            },
            block_io,
            disk_io,
            // Re-pointed below, once the volume has its final address.
            device: ParserDevice::new(NonNull::dangling()),
            root: core::ptr::null_mut(),
            device_path: None,
        });
        let mut ptr = match NonNull::new(Box::into_raw(volume)) {
            Some(ptr) => ptr,
            None => return Err(Status::OUT_OF_RESOURCES),
        };
        let volume = unsafe { ptr.as_mut() };
        volume.device = ParserDevice::new(ptr);

        if !parser::probe(volume) {
            unsafe { drop(Box::from_raw(ptr.as_ptr())) };
            return Err(Status::UNSUPPORTED);
        }

        volume.root = Box::into_raw(File::new_root(ptr));
        Ok(ptr)
    }

    /// Tear a volume down. Any children still open indicate a firmware bug;
    /// their resources are released regardless.
    ///
    /// # Safety
    ///
    /// `volume` must come from [`Volume::create`] and not be used afterwards.
    pub unsafe fn destroy(volume: NonNull<Volume>) {
        unsafe {
            let root = volume.as_ref().root;
            if !root.is_null() {
                drop(Box::from_raw(root));
            }
            drop(Box::from_raw(volume.as_ptr()));
        }
    }

    /// Recover the volume wrapping a published protocol record. The one
    /// address-based recovery primitive for volumes.
    ///
    /// # Safety
    ///
    /// `proto` must be the `proto` field of a live `Volume`.
    pub(crate) unsafe fn from_protocol_mut<'a>(
        proto: *mut SimpleFileSystemProtocol,
    ) -> &'a mut Volume {
        unsafe { &mut *proto.cast::<Volume>() }
    }

    /// The published protocol record, for installation on the controller.
    pub fn file_system_ptr(&mut self) -> *mut SimpleFileSystemProtocol {
        &mut self.proto
    }

    /// The root directory's published file record.
    pub fn root_ptr(&self) -> *mut FileProtocol {
        // Root exists for the volume's whole lifetime.
        unsafe { (*self.root).protocol_ptr() }
    }

    pub(crate) fn root(&self) -> *mut File {
        self.root
    }

    pub(crate) fn device(&self) -> &ParserDevice {
        &self.device
    }

    fn media(&self) -> &BlockIoMedia {
        unsafe { &*self.block_io.as_ref().media }
    }

    /// Media block size, corrected to 512 when the media reports none.
    pub fn block_size(&self) -> u32 {
        match self.media().block_size {
            0 => {
                warn!("Corrected media block size");
                FALLBACK_BLOCK_SIZE
            }
            size => size,
        }
    }

    /// Total volume size derived from the media geometry.
    pub fn volume_size(&self) -> u64 {
        (self.media().last_block + 1) * u64::from(self.block_size())
    }

    /// Byte-addressed read through the disk transport.
    pub(crate) fn disk_read(&self, offset: u64, buf: &mut [u8]) -> Result<(), ParserError> {
        let disk_io = self.disk_io.as_ptr();
        let status = unsafe {
            ((*disk_io).read_disk)(
                disk_io,
                self.media().media_id,
                offset,
                buf.len(),
                buf.as_mut_ptr().cast::<c_void>(),
            )
        };
        if status.is_error() {
            warn!("Could not read disk at offset {offset:#x}: [{status}]");
            return Err(ParserError::ReadError);
        }
        Ok(())
    }

    /// Volume label via the parser; errors degrade to an empty label at the
    /// info boundary.
    pub(crate) fn label(&self) -> Result<String, ParserError> {
        parser::label(self)
    }

    /// Best-effort volume UUID via the parser.
    pub(crate) fn uuid(&self) -> Option<String> {
        parser::uuid(self).ok().flatten()
    }

    /// Canonical device path of the bound controller, recorded at bind.
    pub fn device_path(&self) -> Option<&str> {
        self.device_path.as_deref()
    }

    pub(crate) fn set_device_path(&mut self, path: Option<String>) {
        self.device_path = path;
    }
}

impl core::fmt::Debug for Volume {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Volume")
            .field("device_path", &self.device_path)
            .field("block_size", &self.media().block_size)
            .field("last_block", &self.media().last_block)
            .finish()
    }
}

/// `OpenVolume`: hand out the root directory. Mount work happened at
/// bind-start, so this is a pointer exchange.
pub(crate) unsafe extern "efiapi" fn open_volume(
    this: *mut SimpleFileSystemProtocol,
    root: *mut *mut FileProtocol,
) -> Status {
    if this.is_null() || root.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let volume = unsafe { Volume::from_protocol_mut(this) };
    info!("OpenVolume");
    unsafe { *root = volume.root_ptr() };
    Status::SUCCESS
}
