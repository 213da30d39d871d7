//! Driver binding and image lifecycle.
//!
//! The firmware offers controllers through the driver-binding contract:
//! `Supported` ranks the driver against a controller, `Start` binds one and
//! publishes the simple-file-system protocol on it, `Stop` revokes the
//! binding. [`install`] is the image entry path; it arbitrates the
//! per-filesystem singleton, wires the unload callback, and registers the
//! embedded parser. [`uninstall`] undoes all of it, disconnecting only the
//! controllers bound to this driver.

use alloc::string::String;
use core::ffi::c_void;
use core::ptr::{self, NonNull};

use log::{debug, error, info, warn};

use crate::codec;
use crate::component_name;
use crate::efi::protocols::{
    BLOCK_IO_PROTOCOL_GUID, COMPONENT_NAME_PROTOCOL_GUID, COMPONENT_NAME2_PROTOCOL_GUID,
    DEVICE_PATH_PROTOCOL_GUID, DEVICE_PATH_TO_TEXT_PROTOCOL_GUID, DISK_IO_PROTOCOL_GUID,
    DRIVER_BINDING_PROTOCOL_GUID, DevicePathProtocol, DevicePathToTextProtocol,
    DriverBindingProtocol, LOADED_IMAGE_PROTOCOL_GUID, LoadedImageProtocol,
    OpenProtocolAttributes, SIMPLE_FILE_SYSTEM_PROTOCOL_GUID,
};
use crate::efi::tables::{self, Handle, LocateSearchType, NATIVE_INTERFACE, SystemTable};
use crate::efi::{FirmwareCell, Guid, Status};
use crate::logger;
use crate::parser::{self, ParserModule};
use crate::registry;
use crate::volume::Volume;

/// The version field places the driver in the IHV band of the binding
/// ranking order (0x10..=0xffffffef).
const DRIVER_BINDING_VERSION: u32 = 0x10;

static DRIVER_BINDING: FirmwareCell<DriverBindingProtocol> =
    FirmwareCell::new(DriverBindingProtocol {
        supported: binding_supported,
        start: binding_start,
        stop: binding_stop,
        version: DRIVER_BINDING_VERSION,
        image_handle: ptr::null_mut(),
        driver_binding_handle: ptr::null_mut(),
    });

/// The singleton protocol is content-free; its installed presence is the
/// whole point.
#[repr(C)]
struct MutexProtocol {
    unused: isize,
}

static MUTEX_PROTOCOL: FirmwareCell<MutexProtocol> =
    FirmwareCell::new(MutexProtocol { unused: 0 });
static MUTEX_HANDLE: FirmwareCell<Handle> = FirmwareCell::new(ptr::null_mut());
static MUTEX_GUID: FirmwareCell<Guid> = FirmwareCell::new(Guid::new(0, 0, 0, [0; 8]));

fn binding_handle() -> Handle {
    unsafe { (*DRIVER_BINDING.get()).driver_binding_handle }
}

/// Image entry: arbitrate the singleton, publish the driver protocols, hook
/// unload, and bring the embedded parser up.
///
/// # Safety
///
/// Must be called from the image entry point with the handle and system
/// table the firmware passed in.
pub unsafe fn install(
    image_handle: Handle,
    system_table: *mut SystemTable,
    module: &'static ParserModule,
) -> Status {
    unsafe { tables::init(image_handle, system_table) };
    logger::init();

    // One GUID per filesystem family; without one there is nothing to key
    // the singleton on.
    let Some(guid) = registry::fs_guid(module.parser.name()) else {
        error!("No GUID is defined for {}", module.parser.name());
        return Status::LOAD_ERROR;
    };
    unsafe { *MUTEX_GUID.get() = guid };

    let bs = tables::boot_services();

    // A located instance means another image of this driver already runs.
    let mut interface: *mut c_void = ptr::null_mut();
    let status =
        unsafe { (bs.locate_protocol)(MUTEX_GUID.get(), ptr::null_mut(), &mut interface) };
    if status == Status::SUCCESS {
        error!("This driver has already been installed");
        return Status::LOAD_ERROR;
    }
    if status != Status::NOT_FOUND {
        error!("Could not locate global mutex: [{status}]");
        return status;
    }
    let status = unsafe {
        (bs.install_protocol_interface)(
            MUTEX_HANDLE.get(),
            MUTEX_GUID.get(),
            NATIVE_INTERFACE,
            MUTEX_PROTOCOL.get().cast(),
        )
    };
    if status.is_error() {
        error!("Could not install global mutex: [{status}]");
        return status;
    }

    // The loaded image protocol carries the unload hook.
    let mut loaded_image: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.open_protocol)(
            image_handle,
            &LOADED_IMAGE_PROTOCOL_GUID,
            &mut loaded_image,
            image_handle,
            ptr::null_mut(),
            OpenProtocolAttributes::GET_PROTOCOL.bits(),
        )
    };
    if status.is_error() {
        error!("Could not open loaded image protocol: [{status}]");
        return status;
    }

    let binding = unsafe { &mut *DRIVER_BINDING.get() };
    binding.image_handle = image_handle;
    binding.driver_binding_handle = image_handle;

    component_name::set_driver_name(module.parser.name());

    let interfaces: [(&Guid, *mut c_void); 3] = [
        (&DRIVER_BINDING_PROTOCOL_GUID, DRIVER_BINDING.get().cast()),
        (&COMPONENT_NAME_PROTOCOL_GUID, component_name::legacy().cast()),
        (
            &COMPONENT_NAME2_PROTOCOL_GUID,
            component_name::modern().cast(),
        ),
    ];
    let mut handle = binding.driver_binding_handle;
    for (i, (guid, iface)) in interfaces.iter().enumerate() {
        let status = unsafe {
            (bs.install_protocol_interface)(&mut handle, *guid, NATIVE_INTERFACE, *iface)
        };
        if status.is_error() {
            error!("Could not bind driver: [{status}]");
            for (guid, iface) in interfaces[..i].iter().rev() {
                unsafe { (bs.uninstall_protocol_interface)(handle, *guid, *iface) };
            }
            return status;
        }
    }
    binding.driver_binding_handle = handle;

    unsafe { (*loaded_image.cast::<LoadedImageProtocol>()).unload = Some(uninstall) };

    // Bring the embedded on-disk parser up last, once the driver cannot
    // fail to load anymore.
    parser::register(module);

    debug!("FS driver installed");
    Status::SUCCESS
}

/// Image unload: disconnect our controllers, retract the driver protocols
/// and the singleton, and take the parser down.
pub unsafe extern "efiapi" fn uninstall(image_handle: Handle) -> Status {
    let bs = tables::boot_services();

    // Disconnecting re-enters `Stop` for every bound controller. The filter
    // on our own binding handle is what keeps every other driver connected.
    let mut count: usize = 0;
    let mut handles: *mut Handle = ptr::null_mut();
    let status = unsafe {
        (bs.locate_handle_buffer)(
            LocateSearchType::AllHandles,
            ptr::null(),
            ptr::null_mut(),
            &mut count,
            &mut handles,
        )
    };
    if status.is_success() {
        for i in 0..count {
            let handle = unsafe { *handles.add(i) };
            let status = unsafe {
                (bs.disconnect_controller)(handle, binding_handle(), ptr::null_mut())
            };
            if status.is_success() {
                debug!("DisconnectController[{i}]");
            }
        }
        unsafe { (bs.free_pool)(handles.cast()) };
    } else {
        error!("Unable to enumerate handles: [{status}]");
    }

    let interfaces: [(&Guid, *mut c_void); 3] = [
        (&DRIVER_BINDING_PROTOCOL_GUID, DRIVER_BINDING.get().cast()),
        (&COMPONENT_NAME_PROTOCOL_GUID, component_name::legacy().cast()),
        (
            &COMPONENT_NAME2_PROTOCOL_GUID,
            component_name::modern().cast(),
        ),
    ];
    for (guid, iface) in interfaces {
        unsafe { (bs.uninstall_protocol_interface)(image_handle, guid, iface) };
    }
    unsafe {
        (bs.uninstall_protocol_interface)(
            *MUTEX_HANDLE.get(),
            MUTEX_GUID.get(),
            MUTEX_PROTOCOL.get().cast(),
        )
    };

    parser::unregister();

    debug!("FS driver uninstalled");
    Status::SUCCESS
}

/// `Supported`: the controller qualifies iff its disk transport can be
/// opened exclusively. No on-disk probing here; this call only ranks
/// candidates, and the transport is closed again before returning.
unsafe extern "efiapi" fn binding_supported(
    this: *mut DriverBindingProtocol,
    controller: Handle,
    _remaining_device_path: *mut DevicePathProtocol,
) -> Status {
    let bs = tables::boot_services();
    let agent = unsafe { (*this).driver_binding_handle };

    let mut disk_io: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.open_protocol)(
            controller,
            &DISK_IO_PROTOCOL_GUID,
            &mut disk_io,
            agent,
            controller,
            OpenProtocolAttributes::BY_DRIVER.bits(),
        )
    };
    if status.is_error() {
        return status;
    }

    debug!("BindingSupported");

    unsafe { (bs.close_protocol)(controller, &DISK_IO_PROTOCOL_GUID, agent, controller) };
    Status::SUCCESS
}

/// `Start`: bind the controller. The disk transport stays open by-driver for
/// the volume's whole lifetime so no other filesystem driver can claim the
/// partition.
unsafe extern "efiapi" fn binding_start(
    this: *mut DriverBindingProtocol,
    controller: Handle,
    _remaining_device_path: *mut DevicePathProtocol,
) -> Status {
    debug!("BindingStart");

    let bs = tables::boot_services();
    let agent = unsafe { (*this).driver_binding_handle };

    // Media metadata only; the disk driver already holds this one open, so
    // ask for shared access.
    let mut block_io: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.open_protocol)(
            controller,
            &BLOCK_IO_PROTOCOL_GUID,
            &mut block_io,
            agent,
            controller,
            OpenProtocolAttributes::GET_PROTOCOL.bits(),
        )
    };
    if status.is_error() {
        warn!("Could not access BlockIo protocol: [{status}]");
        return status;
    }

    let mut disk_io: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.open_protocol)(
            controller,
            &DISK_IO_PROTOCOL_GUID,
            &mut disk_io,
            agent,
            controller,
            OpenProtocolAttributes::BY_DRIVER.bits(),
        )
    };
    if status.is_error() {
        warn!("Could not access the DiskIo protocol: [{status}]");
        return status;
    }
    let close_disk = || unsafe {
        (bs.close_protocol)(controller, &DISK_IO_PROTOCOL_GUID, agent, controller);
    };

    let (Some(block_io), Some(disk_io)) = (
        NonNull::new(block_io.cast()),
        NonNull::new(disk_io.cast()),
    ) else {
        close_disk();
        return Status::DEVICE_ERROR;
    };

    let mut volume = match Volume::create(block_io, disk_io) {
        Ok(volume) => volume,
        Err(status) => {
            // Holding the transport open past a failed start would lock
            // every other filesystem driver out of the partition.
            close_disk();
            return status;
        }
    };

    let mut handle = controller;
    let status = unsafe {
        (bs.install_protocol_interface)(
            &mut handle,
            &SIMPLE_FILE_SYSTEM_PROTOCOL_GUID,
            NATIVE_INTERFACE,
            volume.as_mut().file_system_ptr().cast(),
        )
    };
    if status.is_error() {
        warn!("Could not install simple file system protocol: [{status}]");
        unsafe { Volume::destroy(volume) };
        close_disk();
        return status;
    }

    let volume = unsafe { volume.as_mut() };
    volume.set_device_path(device_path_string(controller));
    if let Some(device_path) = volume.device_path() {
        info!("FSInstall: {device_path}");
    }
    if let Some(uuid) = volume.uuid() {
        debug!("Volume UUID: {uuid}");
    }

    Status::SUCCESS
}

/// `Stop`: recover the volume from the installed protocol and unwind
/// everything `Start` set up.
unsafe extern "efiapi" fn binding_stop(
    this: *mut DriverBindingProtocol,
    controller: Handle,
    _number_of_children: usize,
    _child_handle_buffer: *mut Handle,
) -> Status {
    debug!("BindingStop");

    let bs = tables::boot_services();
    let agent = unsafe { (*this).driver_binding_handle };

    let mut interface: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.open_protocol)(
            controller,
            &SIMPLE_FILE_SYSTEM_PROTOCOL_GUID,
            &mut interface,
            agent,
            controller,
            OpenProtocolAttributes::GET_PROTOCOL.bits(),
        )
    };
    if status.is_error() {
        warn!("Could not locate our instance: [{status}]");
        return status;
    }
    let Some(volume_ptr) = NonNull::new(interface.cast::<Volume>()) else {
        return Status::NOT_FOUND;
    };

    {
        let volume = unsafe { Volume::from_protocol_mut(interface.cast()) };
        if let Some(device_path) = volume.device_path() {
            info!("FSUninstall: {device_path}");
        }
        let status = unsafe {
            (bs.uninstall_protocol_interface)(
                controller,
                &SIMPLE_FILE_SYSTEM_PROTOCOL_GUID,
                volume.file_system_ptr().cast(),
            )
        };
        if status.is_error() {
            warn!("Could not uninstall simple file system protocol: [{status}]");
        }
    }

    unsafe { Volume::destroy(volume_ptr) };

    unsafe { (bs.close_protocol)(controller, &DISK_IO_PROTOCOL_GUID, agent, controller) };
    Status::SUCCESS
}

/// Render the controller's device path through the to-text protocol, when
/// the platform carries one.
fn device_path_string(controller: Handle) -> Option<String> {
    let bs = tables::boot_services();

    let mut device_path: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.handle_protocol)(controller, &DEVICE_PATH_PROTOCOL_GUID, &mut device_path)
    };
    if status.is_error() || device_path.is_null() {
        return None;
    }

    let mut to_text: *mut c_void = ptr::null_mut();
    let status = unsafe {
        (bs.locate_protocol)(
            &DEVICE_PATH_TO_TEXT_PROTOCOL_GUID,
            ptr::null_mut(),
            &mut to_text,
        )
    };
    if status.is_error() || to_text.is_null() {
        return None;
    }

    let to_text = unsafe { &*to_text.cast::<DevicePathToTextProtocol>() };
    let text = unsafe { (to_text.convert_device_path_to_text)(device_path.cast(), 0, 0) };
    if text.is_null() {
        return None;
    }
    let owned = codec::utf16_to_utf8(unsafe { codec::utf16_from_ptr(text) });
    unsafe { (bs.free_pool)(text.cast()) };
    Some(owned)
}
