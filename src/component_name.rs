//! Driver naming, in both language-tag dialects.
//!
//! The platform may consume the legacy component-name protocol (ISO 639-2,
//! "eng"), the current one (RFC 4646, "en"), or both; the driver publishes
//! both over the same name. Controllers are not named.

use alloc::boxed::Box;
use alloc::format;
use core::ptr;

use crate::codec;
use crate::efi::protocols::{ComponentName2Protocol, ComponentNameProtocol};
use crate::efi::tables::{Char16, Handle};
use crate::efi::{FirmwareCell, Status};

static DRIVER_NAME: FirmwareCell<*mut Char16> = FirmwareCell::new(ptr::null_mut());

static COMPONENT_NAME: FirmwareCell<ComponentNameProtocol> =
    FirmwareCell::new(ComponentNameProtocol {
        get_driver_name,
        get_controller_name,
        supported_languages: b"eng\0".as_ptr(),
    });

static COMPONENT_NAME2: FirmwareCell<ComponentName2Protocol> =
    FirmwareCell::new(ComponentName2Protocol {
        get_driver_name: get_driver_name2,
        get_controller_name: get_controller_name2,
        supported_languages: b"en\0".as_ptr(),
    });

/// Build and retain the advertised driver name for the filesystem family
/// this binary embeds. Runs once, at install.
pub(crate) fn set_driver_name(fs_name: &str) {
    let name = format!(
        "EfiFs {fs_name} driver v{}.{} ({} {})",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );
    let wide = codec::utf8_to_utf16(&name).into_boxed_slice();
    // Lives as long as the image; the firmware holds on to the pointer.
    unsafe { *DRIVER_NAME.get() = Box::leak(wide).as_mut_ptr() };
}

pub(crate) fn legacy() -> *mut ComponentNameProtocol {
    COMPONENT_NAME.get()
}

pub(crate) fn modern() -> *mut ComponentName2Protocol {
    COMPONENT_NAME2.get()
}

fn driver_name_out(driver_name: *mut *mut Char16) -> Status {
    let name = unsafe { *DRIVER_NAME.get() };
    if driver_name.is_null() || name.is_null() {
        return Status::INVALID_PARAMETER;
    }
    unsafe { *driver_name = name };
    Status::SUCCESS
}

unsafe extern "efiapi" fn get_driver_name(
    _this: *mut ComponentNameProtocol,
    _language: *const u8,
    driver_name: *mut *mut Char16,
) -> Status {
    driver_name_out(driver_name)
}

unsafe extern "efiapi" fn get_controller_name(
    _this: *mut ComponentNameProtocol,
    _controller_handle: Handle,
    _child_handle: Handle,
    _language: *const u8,
    _controller_name: *mut *mut Char16,
) -> Status {
    // A filesystem has no controller of its own to name.
    Status::UNSUPPORTED
}

unsafe extern "efiapi" fn get_driver_name2(
    _this: *mut ComponentName2Protocol,
    _language: *const u8,
    driver_name: *mut *mut Char16,
) -> Status {
    driver_name_out(driver_name)
}

unsafe extern "efiapi" fn get_controller_name2(
    _this: *mut ComponentName2Protocol,
    _controller_handle: Handle,
    _child_handle: Handle,
    _language: *const u8,
    _controller_name: *mut *mut Char16,
) -> Status {
    Status::UNSUPPORTED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_advertises_family_and_version() {
        set_driver_name("ntfs");
        let mut out: *mut Char16 = ptr::null_mut();
        let status = driver_name_out(&mut out);
        assert_eq!(status, Status::SUCCESS);
        let wide = unsafe { codec::utf16_from_ptr(out) };
        let name = codec::utf16_to_utf8(wide);
        assert!(name.starts_with("EfiFs ntfs driver v1.10"), "{name}");
        assert!(name.contains("efifs"), "{name}");
    }
}
