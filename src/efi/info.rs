//! The information records `GetInfo` and directory reads produce.
//!
//! Both records are a fixed prefix followed by a variable-length UTF-16
//! string (file name or volume label) including its NUL. The leading `size`
//! field counts the whole record. Writers emit into the caller-supplied
//! buffer byte-wise, so no alignment is demanded of the caller beyond what
//! the firmware already guarantees.

use core::mem::{offset_of, size_of};

use zerocopy::{Immutable, IntoBytes, KnownLayout};

use super::guid::Guid;
use super::protocols::FileAttribute;
use super::status::Status;
use super::tables::Time;

/// EFI_FILE_INFO_ID.
pub const FILE_INFO_GUID: Guid = Guid::new(
    0x09576E92,
    0x6D3F,
    0x11D2,
    [0x8E, 0x39, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// EFI_FILE_SYSTEM_INFO_ID.
pub const FILE_SYSTEM_INFO_GUID: Guid = Guid::new(
    0x09576E93,
    0x6D3F,
    0x11D2,
    [0x8E, 0x39, 0x00, 0xA0, 0xC9, 0x69, 0x72, 0x3B],
);

/// EFI_FILE_SYSTEM_VOLUME_LABEL_ID.
pub const FILE_SYSTEM_VOLUME_LABEL_GUID: Guid = Guid::new(
    0xDB47D7D3,
    0xFE81,
    0x11D3,
    [0x9A, 0x35, 0x00, 0x90, 0x27, 0x3F, 0xC1, 0x4D],
);

/// Longest file name the records account for, in UTF-16 units including the
/// NUL.
pub const MAX_NAME_UNITS: usize = 256;

/// Fixed prefix of EFI_FILE_INFO.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, IntoBytes, KnownLayout, Immutable)]
pub struct FileInfoHeader {
    pub size: u64,
    pub file_size: u64,
    pub physical_size: u64,
    pub create_time: Time,
    pub last_access_time: Time,
    pub modification_time: Time,
    pub attribute: u64,
}

/// Offset of the file name within an EFI_FILE_INFO record.
pub const FILE_INFO_NAME_OFFSET: usize = size_of::<FileInfoHeader>();

/// Smallest buffer `GetInfo`/directory reads accept for a file-info record.
pub const MIN_FILE_INFO_SIZE: usize = FILE_INFO_NAME_OFFSET + MAX_NAME_UNITS * 2;

/// Fixed prefix of EFI_FILE_SYSTEM_INFO. The volume label begins at byte 36,
/// inside what Rust rounds up to the struct's stride; writers slice the
/// emitted prefix down to [`FS_INFO_LABEL_OFFSET`].
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, IntoBytes, KnownLayout, Immutable)]
pub struct FileSystemInfoHeader {
    pub size: u64,
    pub read_only: u8,
    _pad: [u8; 7],
    pub volume_size: u64,
    pub free_space: u64,
    pub block_size: u32,
    _tail: [u8; 4],
}

/// Offset of the volume label within an EFI_FILE_SYSTEM_INFO record.
pub const FS_INFO_LABEL_OFFSET: usize = offset_of!(FileSystemInfoHeader, _tail);

/// Smallest buffer `GetInfo` accepts for a filesystem-info record.
pub const MIN_FS_INFO_SIZE: usize = FS_INFO_LABEL_OFFSET + MAX_NAME_UNITS * 2;

const _: () = assert!(FILE_INFO_NAME_OFFSET == 80);
const _: () = assert!(offset_of!(FileSystemInfoHeader, volume_size) == 16);
const _: () = assert!(offset_of!(FileSystemInfoHeader, block_size) == 32);
const _: () = assert!(FS_INFO_LABEL_OFFSET == 36);

/// Append `s` as NUL-terminated UTF-16LE at `offset`, returning the record
/// length. Fails when the string does not fit the remaining buffer.
fn put_utf16(buf: &mut [u8], offset: usize, s: &str) -> Result<usize, Status> {
    let units = s.encode_utf16().count() + 1;
    let end = offset + units * 2;
    if end > buf.len() {
        return Err(Status::BUFFER_TOO_SMALL);
    }
    let mut at = offset;
    for unit in s.encode_utf16() {
        buf[at..at + 2].copy_from_slice(&unit.to_le_bytes());
        at += 2;
    }
    buf[at..at + 2].copy_from_slice(&0u16.to_le_bytes());
    Ok(end)
}

/// Compose an EFI_FILE_INFO record and return its total length.
pub fn write_file_info(
    buf: &mut [u8],
    file_size: u64,
    physical_size: u64,
    time: Time,
    attribute: FileAttribute,
    name: &str,
) -> Result<usize, Status> {
    if buf.len() < FILE_INFO_NAME_OFFSET {
        return Err(Status::BUFFER_TOO_SMALL);
    }
    let total = put_utf16(buf, FILE_INFO_NAME_OFFSET, name)?;
    let header = FileInfoHeader {
        size: total as u64,
        file_size,
        physical_size,
        create_time: time,
        last_access_time: time,
        modification_time: time,
        attribute: attribute.bits(),
    };
    buf[..FILE_INFO_NAME_OFFSET].copy_from_slice(header.as_bytes());
    Ok(total)
}

/// Compose an EFI_FILE_SYSTEM_INFO record and return its total length.
pub fn write_fs_info(
    buf: &mut [u8],
    volume_size: u64,
    block_size: u32,
    label: &str,
) -> Result<usize, Status> {
    if buf.len() < FS_INFO_LABEL_OFFSET {
        return Err(Status::BUFFER_TOO_SMALL);
    }
    let total = put_utf16(buf, FS_INFO_LABEL_OFFSET, label)?;
    let header = FileSystemInfoHeader {
        size: total as u64,
        read_only: 1,
        volume_size,
        free_space: 0,
        block_size,
        ..Default::default()
    };
    buf[..FS_INFO_LABEL_OFFSET].copy_from_slice(&header.as_bytes()[..FS_INFO_LABEL_OFFSET]);
    Ok(total)
}

/// Compose an EFI_FILE_SYSTEM_VOLUME_LABEL record (label only) and return
/// its length.
pub fn write_volume_label(buf: &mut [u8], label: &str) -> Result<usize, Status> {
    put_utf16(buf, 0, label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_at(buf: &[u8], offset: usize) -> alloc::string::String {
        let mut units = alloc::vec::Vec::new();
        let mut at = offset;
        loop {
            let unit = u16::from_le_bytes([buf[at], buf[at + 1]]);
            if unit == 0 {
                break;
            }
            units.push(unit);
            at += 2;
        }
        alloc::string::String::from_utf16(&units).unwrap()
    }

    #[test]
    fn file_info_record() {
        let mut buf = [0u8; MIN_FILE_INFO_SIZE];
        let time = Time {
            year: 2014,
            month: 5,
            day: 7,
            ..Default::default()
        };
        let len = write_file_info(
            &mut buf,
            4,
            4,
            time,
            FileAttribute::READ_ONLY,
            "hello.bin",
        )
        .unwrap();
        assert_eq!(len, FILE_INFO_NAME_OFFSET + ("hello.bin".len() + 1) * 2);
        assert_eq!(u64::from_le_bytes(buf[0..8].try_into().unwrap()), len as u64);
        assert_eq!(u64::from_le_bytes(buf[8..16].try_into().unwrap()), 4);
        assert_eq!(name_at(&buf, FILE_INFO_NAME_OFFSET), "hello.bin");
    }

    #[test]
    fn fs_info_record_label_at_fixed_offset() {
        let mut buf = [0u8; MIN_FS_INFO_SIZE];
        let len = write_fs_info(&mut buf, 1 << 20, 512, "DATA").unwrap();
        assert_eq!(len, FS_INFO_LABEL_OFFSET + 5 * 2);
        assert_eq!(buf[8], 1, "read-only flag");
        assert_eq!(
            u32::from_le_bytes(buf[32..36].try_into().unwrap()),
            512,
            "block size straddles the label offset"
        );
        assert_eq!(name_at(&buf, FS_INFO_LABEL_OFFSET), "DATA");
    }

    #[test]
    fn oversized_name_is_rejected() {
        let mut buf = [0u8; FILE_INFO_NAME_OFFSET + 8];
        let err = write_file_info(
            &mut buf,
            0,
            0,
            Time::default(),
            FileAttribute::READ_ONLY,
            "four",
        )
        .unwrap_err();
        assert_eq!(err, Status::BUFFER_TOO_SMALL);
    }
}
