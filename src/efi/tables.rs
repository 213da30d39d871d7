//! Firmware service tables and console protocols.
//!
//! Only the calls the driver issues are ever invoked, but the tables are
//! declared in full so every field sits at its published ABI offset.

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::guid::Guid;
use super::protocols::DevicePathProtocol;
use super::status::Status;

/// EFI_HANDLE.
pub type Handle = *mut c_void;
/// EFI_EVENT.
pub type Event = *mut c_void;
/// CHAR16: UCS-2 code unit.
pub type Char16 = u16;
/// BOOLEAN: one byte, zero is false.
pub type Boolean = u8;
/// EFI_TPL.
pub type Tpl = usize;

/// EFI_TIME.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
pub struct Time {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub pad1: u8,
    pub nanosecond: u32,
    pub time_zone: i16,
    pub daylight: u8,
    pub pad2: u8,
}

/// EFI_TABLE_HEADER.
#[repr(C)]
#[derive(Debug)]
pub struct TableHeader {
    pub signature: u64,
    pub revision: u32,
    pub header_size: u32,
    pub crc32: u32,
    pub reserved: u32,
}

/// EFI_MEMORY_DESCRIPTOR.
#[repr(C)]
#[derive(Debug)]
pub struct MemoryDescriptor {
    pub memory_type: u32,
    pub physical_start: u64,
    pub virtual_start: u64,
    pub number_of_pages: u64,
    pub attribute: u64,
}

/// EFI_ALLOCATE_TYPE.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocateType {
    AnyPages,
    MaxAddress,
    Address,
}

/// EFI_MEMORY_TYPE values the driver touches. Pool allocations made by a
/// driver belong to `BOOT_SERVICES_DATA`.
pub type MemoryType = u32;
pub const MEMORY_TYPE_BOOT_SERVICES_DATA: MemoryType = 4;

/// EFI_LOCATE_SEARCH_TYPE.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocateSearchType {
    AllHandles,
    ByRegisterNotify,
    ByProtocol,
}

/// EFI_INTERFACE_TYPE: protocol interfaces are always native.
pub const NATIVE_INTERFACE: u32 = 0;

/// EFI_INPUT_KEY.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct InputKey {
    pub scan_code: u16,
    pub unicode_char: Char16,
}

/// EFI_SIMPLE_TEXT_INPUT_PROTOCOL.
#[repr(C)]
pub struct SimpleTextInputProtocol {
    pub reset: unsafe extern "efiapi" fn(this: *mut Self, extended: Boolean) -> Status,
    pub read_key_stroke: unsafe extern "efiapi" fn(this: *mut Self, key: *mut InputKey) -> Status,
    pub wait_for_key: Event,
}

/// SIMPLE_TEXT_OUTPUT_MODE.
#[repr(C)]
#[derive(Debug)]
pub struct SimpleTextOutputMode {
    pub max_mode: i32,
    pub mode: i32,
    pub attribute: i32,
    pub cursor_column: i32,
    pub cursor_row: i32,
    pub cursor_visible: Boolean,
}

/// EFI_SIMPLE_TEXT_OUTPUT_PROTOCOL.
#[repr(C)]
pub struct SimpleTextOutputProtocol {
    pub reset: unsafe extern "efiapi" fn(this: *mut Self, extended: Boolean) -> Status,
    pub output_string: unsafe extern "efiapi" fn(this: *mut Self, string: *const Char16) -> Status,
    pub test_string: unsafe extern "efiapi" fn(this: *mut Self, string: *const Char16) -> Status,
    pub query_mode: unsafe extern "efiapi" fn(
        this: *mut Self,
        mode: usize,
        columns: *mut usize,
        rows: *mut usize,
    ) -> Status,
    pub set_mode: unsafe extern "efiapi" fn(this: *mut Self, mode: usize) -> Status,
    pub set_attribute: unsafe extern "efiapi" fn(this: *mut Self, attribute: usize) -> Status,
    pub clear_screen: unsafe extern "efiapi" fn(this: *mut Self) -> Status,
    pub set_cursor_position:
        unsafe extern "efiapi" fn(this: *mut Self, column: usize, row: usize) -> Status,
    pub enable_cursor: unsafe extern "efiapi" fn(this: *mut Self, visible: Boolean) -> Status,
    pub mode: *mut SimpleTextOutputMode,
}

/// EFI_BOOT_SERVICES.
#[repr(C)]
pub struct BootServices {
    pub hdr: TableHeader,

    // Task priority services
    pub raise_tpl: unsafe extern "efiapi" fn(new_tpl: Tpl) -> Tpl,
    pub restore_tpl: unsafe extern "efiapi" fn(old_tpl: Tpl),

    // Memory services
    pub allocate_pages: unsafe extern "efiapi" fn(
        alloc_type: AllocateType,
        memory_type: MemoryType,
        pages: usize,
        memory: *mut u64,
    ) -> Status,
    pub free_pages: unsafe extern "efiapi" fn(memory: u64, pages: usize) -> Status,
    pub get_memory_map: unsafe extern "efiapi" fn(
        memory_map_size: *mut usize,
        memory_map: *mut MemoryDescriptor,
        map_key: *mut usize,
        descriptor_size: *mut usize,
        descriptor_version: *mut u32,
    ) -> Status,
    pub allocate_pool: unsafe extern "efiapi" fn(
        pool_type: MemoryType,
        size: usize,
        buffer: *mut *mut c_void,
    ) -> Status,
    pub free_pool: unsafe extern "efiapi" fn(buffer: *mut c_void) -> Status,

    // Event and timer services
    pub create_event: unsafe extern "efiapi" fn(
        event_type: u32,
        notify_tpl: Tpl,
        notify_function: Option<unsafe extern "efiapi" fn(event: Event, context: *mut c_void)>,
        notify_context: *mut c_void,
        event: *mut Event,
    ) -> Status,
    pub set_timer:
        unsafe extern "efiapi" fn(event: Event, timer_type: u32, trigger_time: u64) -> Status,
    pub wait_for_event: unsafe extern "efiapi" fn(
        number_of_events: usize,
        event: *mut Event,
        index: *mut usize,
    ) -> Status,
    pub signal_event: unsafe extern "efiapi" fn(event: Event) -> Status,
    pub close_event: unsafe extern "efiapi" fn(event: Event) -> Status,
    pub check_event: unsafe extern "efiapi" fn(event: Event) -> Status,

    // Protocol handler services
    pub install_protocol_interface: unsafe extern "efiapi" fn(
        handle: *mut Handle,
        protocol: *const Guid,
        interface_type: u32,
        interface: *mut c_void,
    ) -> Status,
    pub reinstall_protocol_interface: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        old_interface: *mut c_void,
        new_interface: *mut c_void,
    ) -> Status,
    pub uninstall_protocol_interface: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        interface: *mut c_void,
    ) -> Status,
    pub handle_protocol: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        interface: *mut *mut c_void,
    ) -> Status,
    pub reserved: *mut c_void,
    pub register_protocol_notify: unsafe extern "efiapi" fn(
        protocol: *const Guid,
        event: Event,
        registration: *mut *mut c_void,
    ) -> Status,
    pub locate_handle: unsafe extern "efiapi" fn(
        search_type: LocateSearchType,
        protocol: *const Guid,
        search_key: *mut c_void,
        buffer_size: *mut usize,
        buffer: *mut Handle,
    ) -> Status,
    pub locate_device_path: unsafe extern "efiapi" fn(
        protocol: *const Guid,
        device_path: *mut *mut DevicePathProtocol,
        device: *mut Handle,
    ) -> Status,
    pub install_configuration_table:
        unsafe extern "efiapi" fn(guid: *const Guid, table: *mut c_void) -> Status,

    // Image services
    pub load_image: unsafe extern "efiapi" fn(
        boot_policy: Boolean,
        parent_image_handle: Handle,
        device_path: *mut DevicePathProtocol,
        source_buffer: *mut c_void,
        source_size: usize,
        image_handle: *mut Handle,
    ) -> Status,
    pub start_image: unsafe extern "efiapi" fn(
        image_handle: Handle,
        exit_data_size: *mut usize,
        exit_data: *mut *mut Char16,
    ) -> Status,
    pub exit: unsafe extern "efiapi" fn(
        image_handle: Handle,
        exit_status: Status,
        exit_data_size: usize,
        exit_data: *mut Char16,
    ) -> Status,
    pub unload_image: unsafe extern "efiapi" fn(image_handle: Handle) -> Status,
    pub exit_boot_services:
        unsafe extern "efiapi" fn(image_handle: Handle, map_key: usize) -> Status,

    // Miscellaneous services
    pub get_next_monotonic_count: unsafe extern "efiapi" fn(count: *mut u64) -> Status,
    pub stall: unsafe extern "efiapi" fn(microseconds: usize) -> Status,
    pub set_watchdog_timer: unsafe extern "efiapi" fn(
        timeout: usize,
        watchdog_code: u64,
        data_size: usize,
        watchdog_data: *mut Char16,
    ) -> Status,

    // Driver support services
    pub connect_controller: unsafe extern "efiapi" fn(
        controller_handle: Handle,
        driver_image_handle: *mut Handle,
        remaining_device_path: *mut DevicePathProtocol,
        recursive: Boolean,
    ) -> Status,
    pub disconnect_controller: unsafe extern "efiapi" fn(
        controller_handle: Handle,
        driver_image_handle: Handle,
        child_handle: Handle,
    ) -> Status,

    // Open and close protocol services
    pub open_protocol: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        interface: *mut *mut c_void,
        agent_handle: Handle,
        controller_handle: Handle,
        attributes: u32,
    ) -> Status,
    pub close_protocol: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        agent_handle: Handle,
        controller_handle: Handle,
    ) -> Status,
    pub open_protocol_information: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol: *const Guid,
        entry_buffer: *mut *mut c_void,
        entry_count: *mut usize,
    ) -> Status,

    // Library services
    pub protocols_per_handle: unsafe extern "efiapi" fn(
        handle: Handle,
        protocol_buffer: *mut *mut *const Guid,
        protocol_buffer_count: *mut usize,
    ) -> Status,
    pub locate_handle_buffer: unsafe extern "efiapi" fn(
        search_type: LocateSearchType,
        protocol: *const Guid,
        search_key: *mut c_void,
        no_handles: *mut usize,
        buffer: *mut *mut Handle,
    ) -> Status,
    pub locate_protocol: unsafe extern "efiapi" fn(
        protocol: *const Guid,
        registration: *mut c_void,
        interface: *mut *mut c_void,
    ) -> Status,
    pub install_multiple_protocol_interfaces:
        unsafe extern "efiapi" fn(handle: *mut Handle, ...) -> Status,
    pub uninstall_multiple_protocol_interfaces:
        unsafe extern "efiapi" fn(handle: Handle, ...) -> Status,

    // 32-bit CRC services
    pub calculate_crc32:
        unsafe extern "efiapi" fn(data: *mut c_void, data_size: usize, crc32: *mut u32) -> Status,

    // Miscellaneous services
    pub copy_mem:
        unsafe extern "efiapi" fn(destination: *mut c_void, source: *mut c_void, length: usize),
    pub set_mem: unsafe extern "efiapi" fn(buffer: *mut c_void, size: usize, value: u8),
    pub create_event_ex: unsafe extern "efiapi" fn(
        event_type: u32,
        notify_tpl: Tpl,
        notify_function: Option<unsafe extern "efiapi" fn(event: Event, context: *mut c_void)>,
        notify_context: *const c_void,
        event_group: *const Guid,
        event: *mut Event,
    ) -> Status,
}

/// EFI_RUNTIME_SERVICES.
#[repr(C)]
pub struct RuntimeServices {
    pub hdr: TableHeader,

    // Time services
    pub get_time:
        unsafe extern "efiapi" fn(time: *mut Time, capabilities: *mut c_void) -> Status,
    pub set_time: unsafe extern "efiapi" fn(time: *mut Time) -> Status,
    pub get_wakeup_time: unsafe extern "efiapi" fn(
        enabled: *mut Boolean,
        pending: *mut Boolean,
        time: *mut Time,
    ) -> Status,
    pub set_wakeup_time:
        unsafe extern "efiapi" fn(enable: Boolean, time: *mut Time) -> Status,

    // Virtual memory services
    pub set_virtual_address_map: unsafe extern "efiapi" fn(
        memory_map_size: usize,
        descriptor_size: usize,
        descriptor_version: u32,
        virtual_map: *mut MemoryDescriptor,
    ) -> Status,
    pub convert_pointer:
        unsafe extern "efiapi" fn(debug_disposition: usize, address: *mut *mut c_void) -> Status,

    // Variable services
    pub get_variable: unsafe extern "efiapi" fn(
        variable_name: *const Char16,
        vendor_guid: *const Guid,
        attributes: *mut u32,
        data_size: *mut usize,
        data: *mut c_void,
    ) -> Status,
    pub get_next_variable_name: unsafe extern "efiapi" fn(
        variable_name_size: *mut usize,
        variable_name: *mut Char16,
        vendor_guid: *mut Guid,
    ) -> Status,
    pub set_variable: unsafe extern "efiapi" fn(
        variable_name: *const Char16,
        vendor_guid: *const Guid,
        attributes: u32,
        data_size: usize,
        data: *mut c_void,
    ) -> Status,

    // Miscellaneous services
    pub get_next_high_monotonic_count:
        unsafe extern "efiapi" fn(high_count: *mut u32) -> Status,
    pub reset_system: unsafe extern "efiapi" fn(
        reset_type: u32,
        reset_status: Status,
        data_size: usize,
        reset_data: *mut c_void,
    ),

    // Capsule services
    pub update_capsule: unsafe extern "efiapi" fn(
        capsule_header_array: *mut *mut c_void,
        capsule_count: usize,
        scatter_gather_list: u64,
    ) -> Status,
    pub query_capsule_capabilities: unsafe extern "efiapi" fn(
        capsule_header_array: *mut *mut c_void,
        capsule_count: usize,
        maximum_capsule_size: *mut u64,
        reset_type: *mut u32,
    ) -> Status,
    pub query_variable_info: unsafe extern "efiapi" fn(
        attributes: u32,
        maximum_variable_storage_size: *mut u64,
        remaining_variable_storage_size: *mut u64,
        maximum_variable_size: *mut u64,
    ) -> Status,
}

/// EFI_CONFIGURATION_TABLE.
#[repr(C)]
#[derive(Debug)]
pub struct ConfigurationTable {
    pub vendor_guid: Guid,
    pub vendor_table: *mut c_void,
}

/// EFI_SYSTEM_TABLE.
#[repr(C)]
pub struct SystemTable {
    pub hdr: TableHeader,
    pub firmware_vendor: *const Char16,
    pub firmware_revision: u32,
    pub console_in_handle: Handle,
    pub con_in: *mut SimpleTextInputProtocol,
    pub console_out_handle: Handle,
    pub con_out: *mut SimpleTextOutputProtocol,
    pub standard_error_handle: Handle,
    pub std_err: *mut SimpleTextOutputProtocol,
    pub runtime_services: *mut RuntimeServices,
    pub boot_services: *mut BootServices,
    pub number_of_table_entries: usize,
    pub configuration_table: *mut ConfigurationTable,
}

static SYSTEM_TABLE: AtomicPtr<SystemTable> = AtomicPtr::new(ptr::null_mut());
static IMAGE_HANDLE: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

/// Record the image handle and system table handed to the image entry point.
/// Must run before any other firmware access in this crate.
///
/// # Safety
///
/// `system_table` must point to the firmware's system table and stay valid
/// for the lifetime of the image.
pub unsafe fn init(image_handle: Handle, system_table: *mut SystemTable) {
    IMAGE_HANDLE.store(image_handle, Ordering::Release);
    SYSTEM_TABLE.store(system_table, Ordering::Release);
}

/// The handle of this driver image, as recorded by [`init`].
pub fn image_handle() -> Handle {
    IMAGE_HANDLE.load(Ordering::Acquire)
}

/// The firmware system table recorded by [`init`].
pub fn system_table() -> &'static SystemTable {
    let st = SYSTEM_TABLE.load(Ordering::Acquire);
    debug_assert!(!st.is_null(), "efi::init has not run");
    unsafe { &*st }
}

/// Boot services from the recorded system table.
pub fn boot_services() -> &'static BootServices {
    unsafe { &*system_table().boot_services }
}

/// Runtime services from the recorded system table.
pub fn runtime_services() -> &'static RuntimeServices {
    unsafe { &*system_table().runtime_services }
}

/// Holder for protocol records the firmware mutates through installed
/// interface pointers. Boot services execute single-threaded at a given TPL,
/// so the contained value is never accessed concurrently.
pub(crate) struct FirmwareCell<T>(UnsafeCell<T>);

unsafe impl<T> Sync for FirmwareCell<T> {}

impl<T> FirmwareCell<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Raw pointer to the contained record, suitable for protocol
    /// installation.
    pub(crate) fn get(&self) -> *mut T {
        self.0.get()
    }
}
