//! Protocol records the driver publishes or consumes.
//!
//! Each record carries its function pointers inline, as mandated by the
//! firmware object model; the driver-side state wrapping a published record
//! is recovered from the record pointer (see `File` and `Volume`).

use core::ffi::c_void;

use bitflags::bitflags;

use super::guid::Guid;
use super::status::Status;
use super::tables::{Boolean, Char16, Handle};

/// EFI_DRIVER_BINDING_PROTOCOL_GUID.
pub const DRIVER_BINDING_PROTOCOL_GUID: Guid = Guid::new(
    0x18A031AB,
    0xB443,
    0x4D1A,
    [0xA5, 0xC0, 0x0C, 0x09, 0x26, 0x1E, 0x9F, 0x71],
);

/// EFI_COMPONENT_NAME_PROTOCOL_GUID.
pub const COMPONENT_NAME_PROTOCOL_GUID: Guid = Guid::new(
    0x107A772C,
    0xD5E1,
    0x11D4,
    [0x9A, 0x46, 0x00, 0x90, 0x27, 0x3F, 0xC1, 0x4D],
);

/// EFI_COMPONENT_NAME2_PROTOCOL_GUID.
pub const COMPONENT_NAME2_PROTOCOL_GUID: Guid = Guid::new(
    0x6A7A5CFF,
    0xE8D9,
    0x4F70,
    [0xBA, 0xDA, 0x75, 0xAB, 0x30, 0x25, 0xCE, 0x14],
);

/// EFI_LOADED_IMAGE_PROTOCOL_GUID.
pub const LOADED_IMAGE_PROTOCOL_GUID: Guid = Guid::new(
    0x5B1B31A1,
    0x9562,
    0x11D2,
    [0x8E, 0x3F, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// EFI_DEVICE_PATH_PROTOCOL_GUID.
pub const DEVICE_PATH_PROTOCOL_GUID: Guid = Guid::new(
    0x09576E91,
    0x6D3F,
    0x11D2,
    [0x8E, 0x39, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// EFI_DEVICE_PATH_TO_TEXT_PROTOCOL_GUID.
pub const DEVICE_PATH_TO_TEXT_PROTOCOL_GUID: Guid = Guid::new(
    0x8B843E20,
    0x8132,
    0x4852,
    [0x90, 0xCC, 0x55, 0x1A, 0x4E, 0x4A, 0x7F, 0x1C],
);

/// EFI_DISK_IO_PROTOCOL_GUID.
pub const DISK_IO_PROTOCOL_GUID: Guid = Guid::new(
    0xCE345171,
    0xBA0B,
    0x11D2,
    [0x8E, 0x4F, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// EFI_BLOCK_IO_PROTOCOL_GUID.
pub const BLOCK_IO_PROTOCOL_GUID: Guid = Guid::new(
    0x964E5B21,
    0x6459,
    0x11D2,
    [0x8E, 0x39, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// EFI_SIMPLE_FILE_SYSTEM_PROTOCOL_GUID.
pub const SIMPLE_FILE_SYSTEM_PROTOCOL_GUID: Guid = Guid::new(
    0x964E5B22,
    0x6459,
    0x11D2,
    [0x8E, 0x39, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// SHELL_VARIABLE_GUID: vendor namespace of the pre-boot shell's environment
/// variables, where `FS_LOGGING` lives.
pub const SHELL_VARIABLE_GUID: Guid = Guid::new(
    0x158DEF5A,
    0xF656,
    0x419C,
    [0xB0, 0x27, 0x7A, 0x31, 0x92, 0xC0, 0x79, 0xD2],
);

/// EFI_SIMPLE_FILE_SYSTEM_PROTOCOL_REVISION.
pub const SIMPLE_FILE_SYSTEM_PROTOCOL_REVISION: u64 = 0x0001_0000;

/// EFI_FILE_PROTOCOL_REVISION.
pub const FILE_PROTOCOL_REVISION: u64 = 0x0001_0000;

bitflags! {
    /// Open modes accepted by `EFI_FILE_PROTOCOL.Open()`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FileMode: u64 {
        const READ = 0x0000000000000001;
        const WRITE = 0x0000000000000002;
        const CREATE = 0x8000000000000000;
    }
}

bitflags! {
    /// File attribute bits carried in `FileInfo.attribute`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FileAttribute: u64 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const RESERVED = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
    }
}

bitflags! {
    /// Attributes for `OpenProtocol()`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct OpenProtocolAttributes: u32 {
        const BY_HANDLE_PROTOCOL = 0x01;
        const GET_PROTOCOL = 0x02;
        const TEST_PROTOCOL = 0x04;
        const BY_CHILD_CONTROLLER = 0x08;
        const BY_DRIVER = 0x10;
        const EXCLUSIVE = 0x20;
    }
}

/// EFI_DEVICE_PATH_PROTOCOL node header.
#[repr(C)]
#[derive(Debug)]
pub struct DevicePathProtocol {
    pub major_type: u8,
    pub sub_type: u8,
    pub length: [u8; 2],
}

/// EFI_DEVICE_PATH_TO_TEXT_PROTOCOL.
#[repr(C)]
pub struct DevicePathToTextProtocol {
    pub convert_device_node_to_text: unsafe extern "efiapi" fn(
        device_node: *const DevicePathProtocol,
        display_only: Boolean,
        allow_shortcuts: Boolean,
    ) -> *mut Char16,
    pub convert_device_path_to_text: unsafe extern "efiapi" fn(
        device_path: *const DevicePathProtocol,
        display_only: Boolean,
        allow_shortcuts: Boolean,
    ) -> *mut Char16,
}

/// EFI_LOADED_IMAGE_PROTOCOL.
#[repr(C)]
pub struct LoadedImageProtocol {
    pub revision: u32,
    pub parent_handle: Handle,
    pub system_table: *mut c_void,
    pub device_handle: Handle,
    pub file_path: *mut DevicePathProtocol,
    pub reserved: *mut c_void,
    pub load_options_size: u32,
    pub load_options: *mut c_void,
    pub image_base: *mut c_void,
    pub image_size: u64,
    pub image_code_type: u32,
    pub image_data_type: u32,
    pub unload: Option<unsafe extern "efiapi" fn(image_handle: Handle) -> Status>,
}

/// EFI_BLOCK_IO_MEDIA, up to the revision-1 fields the driver reads.
#[repr(C)]
#[derive(Debug)]
pub struct BlockIoMedia {
    pub media_id: u32,
    pub removable_media: Boolean,
    pub media_present: Boolean,
    pub logical_partition: Boolean,
    pub read_only: Boolean,
    pub write_caching: Boolean,
    pub block_size: u32,
    pub io_align: u32,
    pub last_block: u64,
}

/// EFI_BLOCK_IO_PROTOCOL. Consumed for media metadata only.
#[repr(C)]
pub struct BlockIoProtocol {
    pub revision: u64,
    pub media: *mut BlockIoMedia,
    pub reset: unsafe extern "efiapi" fn(this: *mut Self, extended: Boolean) -> Status,
    pub read_blocks: unsafe extern "efiapi" fn(
        this: *mut Self,
        media_id: u32,
        lba: u64,
        buffer_size: usize,
        buffer: *mut c_void,
    ) -> Status,
    pub write_blocks: unsafe extern "efiapi" fn(
        this: *mut Self,
        media_id: u32,
        lba: u64,
        buffer_size: usize,
        buffer: *mut c_void,
    ) -> Status,
    pub flush_blocks: unsafe extern "efiapi" fn(this: *mut Self) -> Status,
}

/// EFI_DISK_IO_PROTOCOL: byte-addressable disk access.
#[repr(C)]
pub struct DiskIoProtocol {
    pub revision: u64,
    pub read_disk: unsafe extern "efiapi" fn(
        this: *mut Self,
        media_id: u32,
        offset: u64,
        buffer_size: usize,
        buffer: *mut c_void,
    ) -> Status,
    pub write_disk: unsafe extern "efiapi" fn(
        this: *mut Self,
        media_id: u32,
        offset: u64,
        buffer_size: usize,
        buffer: *mut c_void,
    ) -> Status,
}

/// EFI_SIMPLE_FILE_SYSTEM_PROTOCOL, published on each bound controller.
#[repr(C)]
pub struct SimpleFileSystemProtocol {
    pub revision: u64,
    pub open_volume: unsafe extern "efiapi" fn(
        this: *mut SimpleFileSystemProtocol,
        root: *mut *mut FileProtocol,
    ) -> Status,
}

/// EFI_FILE_PROTOCOL, published for every open file handle.
#[repr(C)]
pub struct FileProtocol {
    pub revision: u64,
    pub open: unsafe extern "efiapi" fn(
        this: *mut FileProtocol,
        new_handle: *mut *mut FileProtocol,
        file_name: *const Char16,
        open_mode: u64,
        attributes: u64,
    ) -> Status,
    pub close: unsafe extern "efiapi" fn(this: *mut FileProtocol) -> Status,
    pub delete: unsafe extern "efiapi" fn(this: *mut FileProtocol) -> Status,
    pub read: unsafe extern "efiapi" fn(
        this: *mut FileProtocol,
        buffer_size: *mut usize,
        buffer: *mut c_void,
    ) -> Status,
    pub write: unsafe extern "efiapi" fn(
        this: *mut FileProtocol,
        buffer_size: *mut usize,
        buffer: *mut c_void,
    ) -> Status,
    pub get_position:
        unsafe extern "efiapi" fn(this: *mut FileProtocol, position: *mut u64) -> Status,
    pub set_position: unsafe extern "efiapi" fn(this: *mut FileProtocol, position: u64) -> Status,
    pub get_info: unsafe extern "efiapi" fn(
        this: *mut FileProtocol,
        information_type: *const Guid,
        buffer_size: *mut usize,
        buffer: *mut c_void,
    ) -> Status,
    pub set_info: unsafe extern "efiapi" fn(
        this: *mut FileProtocol,
        information_type: *const Guid,
        buffer_size: usize,
        buffer: *mut c_void,
    ) -> Status,
    pub flush: unsafe extern "efiapi" fn(this: *mut FileProtocol) -> Status,
}

/// EFI_DRIVER_BINDING_PROTOCOL.
#[repr(C)]
pub struct DriverBindingProtocol {
    pub supported: unsafe extern "efiapi" fn(
        this: *mut DriverBindingProtocol,
        controller_handle: Handle,
        remaining_device_path: *mut DevicePathProtocol,
    ) -> Status,
    pub start: unsafe extern "efiapi" fn(
        this: *mut DriverBindingProtocol,
        controller_handle: Handle,
        remaining_device_path: *mut DevicePathProtocol,
    ) -> Status,
    pub stop: unsafe extern "efiapi" fn(
        this: *mut DriverBindingProtocol,
        controller_handle: Handle,
        number_of_children: usize,
        child_handle_buffer: *mut Handle,
    ) -> Status,
    pub version: u32,
    pub image_handle: Handle,
    pub driver_binding_handle: Handle,
}

/// EFI_COMPONENT_NAME_PROTOCOL (ISO 639-2 language tags).
#[repr(C)]
pub struct ComponentNameProtocol {
    pub get_driver_name: unsafe extern "efiapi" fn(
        this: *mut ComponentNameProtocol,
        language: *const u8,
        driver_name: *mut *mut Char16,
    ) -> Status,
    pub get_controller_name: unsafe extern "efiapi" fn(
        this: *mut ComponentNameProtocol,
        controller_handle: Handle,
        child_handle: Handle,
        language: *const u8,
        controller_name: *mut *mut Char16,
    ) -> Status,
    pub supported_languages: *const u8,
}

/// EFI_COMPONENT_NAME2_PROTOCOL (RFC 4646 language tags). Same shape as the
/// legacy protocol, different language convention.
#[repr(C)]
pub struct ComponentName2Protocol {
    pub get_driver_name: unsafe extern "efiapi" fn(
        this: *mut ComponentName2Protocol,
        language: *const u8,
        driver_name: *mut *mut Char16,
    ) -> Status,
    pub get_controller_name: unsafe extern "efiapi" fn(
        this: *mut ComponentName2Protocol,
        controller_handle: Handle,
        child_handle: Handle,
        language: *const u8,
        controller_name: *mut *mut Char16,
    ) -> Status,
    pub supported_languages: *const u8,
}
