//! The file object: the file-handle protocol state machine.
//!
//! Every open handle — the root directory included — is a `File` carrying
//! its published protocol record as first field; protocol entry points
//! recover the `File` from the record pointer, do the work in safe methods,
//! and map errors to statuses on the way out.
//!
//! Directory enumeration bridges two paradigms: the parser reports a
//! directory as a run of callbacks, the firmware pulls one record per
//! `Read` at a driver-kept cursor. Each directory read therefore re-walks
//! the parser listing with a countdown seeded from the cursor, keeping no
//! state between calls beyond the cursor itself; rewinds via
//! `SetPosition(0)` cost nothing and interleave freely.

use alloc::boxed::Box;
use alloc::string::String;
use core::ffi::c_void;
use core::ptr::NonNull;

use log::{debug, error, info, trace, warn};

use crate::codec;
use crate::efi::info::{
    FILE_INFO_GUID, FILE_SYSTEM_INFO_GUID, FILE_SYSTEM_VOLUME_LABEL_GUID, MIN_FILE_INFO_SIZE,
    MIN_FS_INFO_SIZE, write_file_info, write_fs_info, write_volume_label,
};
use crate::efi::protocols::{
    FILE_PROTOCOL_REVISION, FileAttribute, FileMode, FileProtocol,
};
use crate::efi::{Char16, Guid, Status};
use crate::error::ParserError;
use crate::parser::{self, DirEntryInfo, ParserFile};
use crate::path::{self, MAX_PATH};
use crate::time::unix_to_efi_time;
use crate::volume::Volume;

/// `SetPosition` sentinel: seek to end of file.
const POSITION_END_OF_FILE: u64 = u64::MAX;

const DOT: Char16 = b'.' as Char16;

const FILE_PROTOCOL_TEMPLATE: FileProtocol = FileProtocol {
    revision: FILE_PROTOCOL_REVISION,
    open: file_open,
    close: file_close,
    delete: file_delete,
    read: file_read,
    write: file_write,
    get_position: file_get_position,
    set_position: file_set_position,
    get_info: file_get_info,
    set_info: file_set_info,
    flush: file_flush,
};

/// One open handle to a regular file or directory on a volume.
#[repr(C)]
pub struct File {
    /// Published protocol record; must stay the first field so the file can
    /// be recovered from the handle the firmware holds.
    proto: FileProtocol,
    volume: NonNull<Volume>,
    is_dir: bool,
    /// Modification time as reported by the parser.
    mtime: i32,
    /// Canonical absolute path, `/` for the root.
    path: String,
    /// Byte offset of the basename within `path`.
    basename: usize,
    /// Directory enumeration cursor; index of the next entry to serve.
    dir_index: i64,
    /// Open parser stream; present exactly for regular files.
    parser_file: Option<Box<dyn ParserFile>>,
    refcount: isize,
}

impl File {
    /// The root directory of `volume`, created once at bind time.
    pub(crate) fn new_root(volume: NonNull<Volume>) -> Box<File> {
        Box::new(File {
            proto: FILE_PROTOCOL_TEMPLATE,
            volume,
            is_dir: true,
            mtime: 0,
            path: String::from("/"),
            basename: 1,
            dir_index: 0,
            parser_file: None,
            refcount: 1,
        })
    }

    /// Recover the file wrapping a published protocol record. The one
    /// address-based recovery primitive for files.
    ///
    /// # Safety
    ///
    /// `proto` must be the `proto` field of a live `File`.
    pub(crate) unsafe fn from_protocol_mut<'a>(proto: *mut FileProtocol) -> &'a mut File {
        unsafe { &mut *proto.cast::<File>() }
    }

    pub(crate) fn protocol_ptr(&mut self) -> *mut FileProtocol {
        &mut self.proto
    }

    fn volume(&self) -> &Volume {
        unsafe { self.volume.as_ref() }
    }

    fn is_root(&self) -> bool {
        core::ptr::eq(self, self.volume().root())
    }

    fn basename(&self) -> &str {
        &self.path[self.basename..]
    }

    fn display(&self) -> &str {
        if self.is_root() { "<ROOT>" } else { &self.path }
    }

    fn open(&mut self, name: &[Char16], mode: u64) -> Result<*mut FileProtocol, Status> {
        info!("Open({}, \"{}\")", self.display(), codec::utf16_to_utf8(name));

        // Read-only driver: read is the only acceptable mode.
        if mode != FileMode::READ.bits() {
            warn!("'{}' can only be opened in read-only mode", codec::utf16_to_utf8(name));
            return Err(Status::WRITE_PROTECTED);
        }

        if name == &[DOT, DOT][..] && self.is_root() {
            info!("Trying to open <ROOT>'s parent");
            return Err(Status::NOT_FOUND);
        }

        // The shell insists on reopening the current handle.
        if name.is_empty() || name == &[DOT][..] {
            info!("  Reopening {}", self.display());
            self.refcount += 1;
            return Ok(self.protocol_ptr());
        }

        let absolute = name[0] == b'\\' as Char16;
        let mut buf = [0u8; MAX_PATH + 1];
        let mut len = 0;
        if !absolute {
            let parent = self.path.as_bytes();
            buf[..parent.len()].copy_from_slice(parent);
            len = parent.len();
            if len == 0 || buf[len - 1] != b'/' {
                buf[len] = b'/';
                len += 1;
            }
        }
        let written = codec::utf16_to_utf8_into(name, &mut buf[len..]).map_err(|_| {
            error!("Could not convert path to UTF-8");
            Status::BUFFER_TOO_SMALL
        })?;
        len += written;
        for byte in buf[..len].iter_mut() {
            if *byte == b'\\' {
                *byte = b'/';
            }
        }
        let joined = core::str::from_utf8(&buf[..len]).map_err(|_| Status::INVALID_PARAMETER)?;

        let normalized = path::normalize(joined, MAX_PATH);
        if normalized == "/" {
            info!("  Reopening <ROOT>");
            return Ok(self.volume().root_ptr());
        }

        // Probe the target's kind and mtime through a listing of its parent;
        // a hook that never fires means the target does not exist.
        let (dirname, basename) = path::split_dir_base(&normalized);
        let mut found = false;
        let mut is_dir = false;
        let mut mtime = 0i32;
        let listed = parser::dir(self.volume(), dirname, &mut |entry, info| {
            if entry != basename {
                return false;
            }
            found = true;
            is_dir = info.dir;
            if let Some(t) = info.mtime {
                mtime = t;
            }
            true
        });
        if let Err(err) = listed {
            warn!(
                "Could not get attributes for '{normalized}': [{}]",
                Status::from(err)
            );
            return Err(Status::NOT_FOUND);
        }
        if !found {
            info!("  '{normalized}' not found");
            return Err(Status::NOT_FOUND);
        }

        let parser_file = if is_dir {
            None
        } else {
            match parser::open(self.volume(), &normalized) {
                Ok(stream) => Some(stream),
                Err(err) => {
                    let status = Status::from(err);
                    warn!("Could not open '{normalized}': [{status}]");
                    return Err(status);
                }
            }
        };

        let basename_at = normalized.len() - basename.len();
        let file = Box::new(File {
            proto: FILE_PROTOCOL_TEMPLATE,
            volume: self.volume,
            is_dir,
            mtime,
            path: normalized,
            basename: basename_at,
            dir_index: 0,
            parser_file,
            refcount: 1,
        });
        let handle = Box::into_raw(file);
        Ok(unsafe { (*handle).protocol_ptr() })
    }

    /// Decrement the refcount; true means the caller must free the file.
    /// The root is immune to closing.
    fn release(&mut self) -> bool {
        info!("Close({})", self.display());
        if self.is_root() {
            return false;
        }
        self.refcount -= 1;
        self.refcount == 0
    }

    fn read_file(&mut self, len: &mut usize, buf: &mut [u8]) -> Result<(), Status> {
        let volume = self.volume;
        let stream = self.parser_file.as_mut().ok_or(Status::DEVICE_ERROR)?;
        match parser::read(unsafe { volume.as_ref() }, stream.as_mut(), buf) {
            Ok(read) => {
                *len = read;
                Ok(())
            }
            Err(err) => {
                *len = 0;
                Err(Status::from(err))
            }
        }
    }

    fn read_dir(&mut self, len: &mut usize, buf: &mut [u8]) -> Result<(), Status> {
        // Unless a full record can fit, forget it.
        if *len < MIN_FILE_INFO_SIZE {
            *len = MIN_FILE_INFO_SIZE;
            return Err(Status::BUFFER_TOO_SMALL);
        }

        let volume = self.volume;
        let vol = unsafe { volume.as_ref() };
        let mut countdown = self.dir_index;
        let mut target: Option<String> = None;
        let mut target_info = DirEntryInfo::default();
        let listed = parser::dir(vol, &self.path, &mut |name, info| {
            if name == "." || name == ".." {
                return false;
            }
            if countdown != 0 {
                countdown -= 1;
                return false;
            }
            target = Some(String::from(name));
            target_info = *info;
            true
        });

        // Exhaustion wins over listing errors, so a once-finished directory
        // stays finished on repeat reads.
        let Some(name) = target else {
            *len = 0;
            return Ok(());
        };
        if let Err(err) = listed {
            warn!("Directory listing failed: [{}]", Status::from(err));
            return Err(Status::from(err));
        }

        let mut attribute = FileAttribute::READ_ONLY;
        let mut file_size = 0u64;
        if target_info.dir {
            attribute |= FileAttribute::DIRECTORY;
        } else {
            // Open the child to learn its size. Quadratic over the listing,
            // but keeps the driver free of iteration state.
            let mut child = String::with_capacity(self.path.len() + 1 + name.len());
            child.push_str(&self.path);
            if !child.ends_with('/') {
                child.push('/');
            }
            child.push_str(&name);
            match parser::open(vol, &child) {
                Ok(stream) => file_size = stream.size(),
                // Symlinks surface as bad file type; their size stays zero.
                Err(ParserError::BadFileType) => {}
                Err(err) => {
                    warn!("Unable to obtain the size of '{child}'");
                    return Err(Status::from(err));
                }
            }
        }

        let time = unix_to_efi_time(target_info.mtime.unwrap_or(0));
        let record = write_file_info(buf, file_size, file_size, time, attribute, &name)?;
        *len = record;
        self.dir_index += 1;
        Ok(())
    }

    fn set_position(&mut self, position: u64) -> Result<(), Status> {
        info!("SetPosition({}, {})", self.display(), position);

        // Directories only rewind.
        if self.is_dir {
            if position != 0 {
                return Err(Status::INVALID_PARAMETER);
            }
            self.dir_index = 0;
            return Ok(());
        }

        let stream = self.parser_file.as_mut().ok_or(Status::DEVICE_ERROR)?;
        let size = stream.size();
        let position = if position == POSITION_END_OF_FILE {
            size
        } else {
            position
        };
        // No writes, hence nothing past the end to seek to.
        if position > size {
            error!("'{}': Cannot seek to {position:#x} of {size:#x}", self.path);
            return Err(Status::UNSUPPORTED);
        }
        stream.set_offset(position);
        debug!("'{}': Position set to {position:#x}", self.path);
        Ok(())
    }

    fn get_position(&mut self) -> u64 {
        if self.is_dir {
            self.dir_index as u64
        } else {
            self.parser_file.as_ref().map_or(0, |stream| stream.offset())
        }
    }

    fn get_info(&mut self, info_type: &Guid, len: &mut usize, buf: &mut [u8]) -> Result<(), Status> {
        info!("GetInfo({}, {})", self.display(), *len);

        if *info_type == FILE_INFO_GUID {
            trace!("Get regular file information");
            if *len < MIN_FILE_INFO_SIZE {
                *len = MIN_FILE_INFO_SIZE;
                return Err(Status::BUFFER_TOO_SMALL);
            }
            let mut attribute = FileAttribute::READ_ONLY;
            let mut size = 0u64;
            if self.is_dir {
                attribute |= FileAttribute::DIRECTORY;
            } else if let Some(stream) = self.parser_file.as_ref() {
                size = stream.size();
            }
            let time = unix_to_efi_time(self.mtime);
            *len = write_file_info(buf, size, size, time, attribute, self.basename())?;
            Ok(())
        } else if *info_type == FILE_SYSTEM_INFO_GUID {
            trace!("Get file system information");
            if *len < MIN_FS_INFO_SIZE {
                *len = MIN_FS_INFO_SIZE;
                return Err(Status::BUFFER_TOO_SMALL);
            }
            let volume = self.volume();
            let label = match volume.label() {
                Ok(label) => label,
                Err(err) => {
                    warn!("Could not read disk label: [{}]", Status::from(err));
                    String::new()
                }
            };
            *len = write_fs_info(buf, volume.volume_size(), volume.block_size(), &label)?;
            Ok(())
        } else if *info_type == FILE_SYSTEM_VOLUME_LABEL_GUID {
            trace!("Get volume label");
            let label = match self.volume().label() {
                Ok(label) => label,
                Err(err) => {
                    warn!("Could not read disk label: [{}]", Status::from(err));
                    String::new()
                }
            };
            match write_volume_label(buf, &label) {
                Ok(record) => {
                    *len = record;
                    Ok(())
                }
                Err(status) => {
                    *len = (label.encode_utf16().count() + 1) * 2;
                    Err(status)
                }
            }
        } else {
            error!("'{}': Cannot get information of type {info_type}", self.display());
            Err(Status::UNSUPPORTED)
        }
    }
}

impl core::fmt::Debug for File {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("is_dir", &self.is_dir)
            .field("refcount", &self.refcount)
            .finish()
    }
}

/*
 * Protocol entry points. Each recovers the wrapping File, delegates, and
 * folds errors into the returned status.
 */

pub(crate) unsafe extern "efiapi" fn file_open(
    this: *mut FileProtocol,
    new_handle: *mut *mut FileProtocol,
    file_name: *const Char16,
    open_mode: u64,
    _attributes: u64,
) -> Status {
    if this.is_null() || new_handle.is_null() || file_name.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    let name = unsafe { codec::utf16_from_ptr(file_name) };
    match file.open(name, open_mode) {
        Ok(handle) => {
            unsafe { *new_handle = handle };
            Status::SUCCESS
        }
        Err(status) => status,
    }
}

pub(crate) unsafe extern "efiapi" fn file_close(this: *mut FileProtocol) -> Status {
    if this.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    if file.release() {
        // Last reference: the parser stream and owned path go with the box.
        drop(unsafe { Box::from_raw(this.cast::<File>()) });
    }
    Status::SUCCESS
}

pub(crate) unsafe extern "efiapi" fn file_delete(this: *mut FileProtocol) -> Status {
    if this.is_null() {
        return Status::INVALID_PARAMETER;
    }
    {
        let file = unsafe { File::from_protocol_mut(this) };
        error!("Cannot delete '{}'", file.display());
    }
    // The handle is closed either way, and the firmware is told the delete
    // did not happen.
    unsafe { file_close(this) };
    Status::WARN_DELETE_FAILURE
}

pub(crate) unsafe extern "efiapi" fn file_read(
    this: *mut FileProtocol,
    buffer_size: *mut usize,
    buffer: *mut c_void,
) -> Status {
    if this.is_null() || buffer_size.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    let len = unsafe { &mut *buffer_size };
    if *len > 0 && buffer.is_null() {
        return Status::INVALID_PARAMETER;
    }
    info!("Read({}, {})", file.display(), *len);
    let buf: &mut [u8] = if *len == 0 {
        &mut []
    } else {
        unsafe { core::slice::from_raw_parts_mut(buffer.cast::<u8>(), *len) }
    };
    let result = if file.is_dir {
        file.read_dir(len, buf)
    } else {
        file.read_file(len, buf)
    };
    match result {
        Ok(()) => Status::SUCCESS,
        Err(status) => status,
    }
}

pub(crate) unsafe extern "efiapi" fn file_write(
    this: *mut FileProtocol,
    _buffer_size: *mut usize,
    _buffer: *mut c_void,
) -> Status {
    if this.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    error!("Cannot write to '{}'", file.display());
    Status::WRITE_PROTECTED
}

pub(crate) unsafe extern "efiapi" fn file_get_position(
    this: *mut FileProtocol,
    position: *mut u64,
) -> Status {
    if this.is_null() || position.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    info!("GetPosition({})", file.display());
    unsafe { *position = file.get_position() };
    Status::SUCCESS
}

pub(crate) unsafe extern "efiapi" fn file_set_position(
    this: *mut FileProtocol,
    position: u64,
) -> Status {
    if this.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    match file.set_position(position) {
        Ok(()) => Status::SUCCESS,
        Err(status) => status,
    }
}

pub(crate) unsafe extern "efiapi" fn file_get_info(
    this: *mut FileProtocol,
    information_type: *const Guid,
    buffer_size: *mut usize,
    buffer: *mut c_void,
) -> Status {
    if this.is_null() || information_type.is_null() || buffer_size.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    let info_type = unsafe { &*information_type };
    let len = unsafe { &mut *buffer_size };
    if *len > 0 && buffer.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let buf: &mut [u8] = if *len == 0 {
        &mut []
    } else {
        unsafe { core::slice::from_raw_parts_mut(buffer.cast::<u8>(), *len) }
    };
    match file.get_info(info_type, len, buf) {
        Ok(()) => Status::SUCCESS,
        Err(status) => status,
    }
}

pub(crate) unsafe extern "efiapi" fn file_set_info(
    this: *mut FileProtocol,
    information_type: *const Guid,
    _buffer_size: usize,
    _buffer: *mut c_void,
) -> Status {
    if this.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    let info_type = unsafe { information_type.as_ref() };
    match info_type {
        Some(guid) => error!(
            "Cannot set information of type {guid} for '{}'",
            file.display()
        ),
        None => error!("Cannot set information for '{}'", file.display()),
    }
    Status::WRITE_PROTECTED
}

pub(crate) unsafe extern "efiapi" fn file_flush(this: *mut FileProtocol) -> Status {
    if this.is_null() {
        return Status::INVALID_PARAMETER;
    }
    let file = unsafe { File::from_protocol_mut(this) };
    info!("Flush({})", file.display());
    Status::SUCCESS
}
