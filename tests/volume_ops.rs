//! End-to-end scenarios over a mounted mock volume, driven through the
//! published protocol function pointers exactly as the firmware would call
//! them.

mod common;

use common::*;
use efifs::efi::Status;
use efifs::efi::info::{
    FILE_INFO_GUID, FILE_SYSTEM_INFO_GUID, FILE_SYSTEM_VOLUME_LABEL_GUID, FS_INFO_LABEL_OFFSET,
    MIN_FILE_INFO_SIZE, MIN_FS_INFO_SIZE,
};
use efifs::efi::Guid;

const ATTR_READ_ONLY: u64 = 0x01;
const ATTR_DIRECTORY: u64 = 0x10;

#[test]
fn mount_and_list_root() {
    let mut harness = mount();
    let root = harness.open_volume();

    let first = read_dir_entry(root).unwrap();
    assert_eq!(first.name, "a.txt");
    assert_eq!(first.size, ALPHA.len() as u64);
    assert_eq!(first.physical_size, ALPHA.len() as u64);
    assert_eq!(first.attribute, ATTR_READ_ONLY);
    assert_eq!(first.year, 2014);

    let second = read_dir_entry(root).unwrap();
    assert_eq!(second.name, "dir1");
    assert_eq!(second.attribute, ATTR_READ_ONLY | ATTR_DIRECTORY);

    let third = read_dir_entry(root).unwrap();
    assert_eq!(third.name, "dir2");
    assert_eq!(third.attribute, ATTR_READ_ONLY | ATTR_DIRECTORY);

    // End of directory: zero length, success, and repeatable.
    assert_eq!(read_dir_entry(root), None);
    assert_eq!(read_dir_entry(root), None);
}

#[test]
fn directory_rewind_and_cursor() {
    let mut harness = mount();
    let root = harness.open_volume();

    let first = read_dir_entry(root).unwrap();
    let (status, position) = get_position(root);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(position, 1);

    // Only a rewind is a valid directory seek.
    assert_eq!(set_position(root, 1), Status::INVALID_PARAMETER);
    assert_eq!(set_position(root, 0), Status::SUCCESS);

    let again = read_dir_entry(root).unwrap();
    assert_eq!(first, again);
}

#[test]
fn short_directory_read_reports_needed_length() {
    let mut harness = mount();
    let root = harness.open_volume();

    let (status, len, _) = {
        let mut buf = vec![0u8; 16];
        let mut len = buf.len();
        let status =
            unsafe { ((*root).read)(root, &mut len, buf.as_mut_ptr().cast()) };
        (status, len, buf)
    };
    assert_eq!(status, Status::BUFFER_TOO_SMALL);
    assert_eq!(len, MIN_FILE_INFO_SIZE);
}

#[test]
fn open_nested_file_and_get_info() {
    let mut harness = mount();
    let root = harness.open_volume();

    let file = open(root, "\\dir1\\sub\\hello.bin", FILE_MODE_READ).unwrap();
    let (status, len, record) = get_info(file, &FILE_INFO_GUID, MIN_FILE_INFO_SIZE);
    assert_eq!(status, Status::SUCCESS);
    let entry = parse_file_info(&record[..len]);
    assert_eq!(entry.name, "hello.bin");
    assert_eq!(entry.size, 4);
    assert_eq!(entry.physical_size, 4);
    assert_eq!(entry.attribute, ATTR_READ_ONLY);
    assert_eq!(entry.year, 2014);
    assert_eq!(close(file), Status::SUCCESS);
}

#[test]
fn open_relative_path_with_backslashes() {
    let mut harness = mount();
    let root = harness.open_volume();

    let dir1 = open(root, "dir1", FILE_MODE_READ).unwrap();
    let file = open(dir1, "sub\\hello.bin", FILE_MODE_READ).unwrap();
    let (status, data) = read(file, 16);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(data, HELLO);
    assert_eq!(close(file), Status::SUCCESS);
    assert_eq!(close(dir1), Status::SUCCESS);
}

#[test]
fn seek_and_read() {
    let mut harness = mount();
    let root = harness.open_volume();
    let file = open(root, "\\dir1\\sub\\hello.bin", FILE_MODE_READ).unwrap();

    assert_eq!(set_position(file, 2), Status::SUCCESS);
    let (status, data) = read(file, 2);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(data, &[0x02, 0x03]);

    // The all-ones sentinel seeks to end of file.
    assert_eq!(set_position(file, u64::MAX), Status::SUCCESS);
    let (status, position) = get_position(file);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(position, 4);

    // Reads at end of file drain to nothing, successfully.
    let (status, data) = read(file, 8);
    assert_eq!(status, Status::SUCCESS);
    assert!(data.is_empty());

    // No writes means nothing exists past the end to seek to.
    assert_eq!(set_position(file, 5), Status::UNSUPPORTED);

    assert_eq!(close(file), Status::SUCCESS);
}

#[test]
fn clamped_read_stops_at_end_of_file() {
    let mut harness = mount();
    let root = harness.open_volume();
    let file = open(root, "\\a.txt", FILE_MODE_READ).unwrap();

    let (status, data) = read(file, 64);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(data, ALPHA);

    let (status, position) = get_position(file);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(position, ALPHA.len() as u64);

    assert_eq!(close(file), Status::SUCCESS);
}

#[test]
fn reopen_current_and_parent_of_root() {
    let mut harness = mount();
    let root = harness.open_volume();

    // `..` from the root has nowhere to go.
    assert_eq!(open(root, "..", FILE_MODE_READ), Err(Status::NOT_FOUND));

    // Reopening the current handle hands back the same handle, refcounted.
    let file = open(root, "a.txt", FILE_MODE_READ).unwrap();
    let same = open(file, ".", FILE_MODE_READ).unwrap();
    assert_eq!(same, file);
    assert_eq!(close(same), Status::SUCCESS);
    // The original reference is still live after closing the alias.
    let (status, _) = get_position(file);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(close(file), Status::SUCCESS);

    // `.`, the empty name, and an absolute `\` all reopen the root.
    let same_root = open(root, ".", FILE_MODE_READ).unwrap();
    assert_eq!(same_root, root);
    let same_root = open(root, "\\", FILE_MODE_READ).unwrap();
    assert_eq!(same_root, root);

    // The root shrugs off closes for the volume's whole lifetime.
    assert_eq!(close(root), Status::SUCCESS);
    assert!(read_dir_entry(root).is_some());
}

#[test]
fn dotdot_resolves_against_the_tree() {
    let mut harness = mount();
    let root = harness.open_volume();

    let sub = open(root, "\\dir1\\sub", FILE_MODE_READ).unwrap();
    let file = open(sub, "..\\sub\\hello.bin", FILE_MODE_READ).unwrap();
    let (status, data) = read(file, 16);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(data, HELLO);
    assert_eq!(close(file), Status::SUCCESS);

    // Climbing all the way up lands on the root.
    let climbed = open(sub, "..\\..", FILE_MODE_READ).unwrap();
    assert_eq!(climbed, root);
    assert_eq!(close(sub), Status::SUCCESS);
}

#[test]
fn missing_files_are_not_found() {
    let mut harness = mount();
    let root = harness.open_volume();

    assert_eq!(open(root, "nope.txt", FILE_MODE_READ), Err(Status::NOT_FOUND));
    assert_eq!(
        open(root, "\\dir1\\nope\\deep.txt", FILE_MODE_READ),
        Err(Status::NOT_FOUND)
    );
}

#[test]
fn rejects_writes() {
    let mut harness = mount();
    let root = harness.open_volume();

    assert_eq!(
        open(root, "x", FILE_MODE_WRITE),
        Err(Status::WRITE_PROTECTED)
    );
    assert_eq!(
        open(root, "a.txt", FILE_MODE_READ | FILE_MODE_WRITE),
        Err(Status::WRITE_PROTECTED)
    );

    let file = open(root, "a.txt", FILE_MODE_READ).unwrap();
    let mut data = *b"junk";
    let mut len = data.len();
    let status = unsafe { ((*file).write)(file, &mut len, data.as_mut_ptr().cast()) };
    assert_eq!(status, Status::WRITE_PROTECTED);

    let status = unsafe {
        ((*file).set_info)(file, &FILE_INFO_GUID, 0, std::ptr::null_mut())
    };
    assert_eq!(status, Status::WRITE_PROTECTED);

    let status = unsafe { ((*file).flush)(file) };
    assert_eq!(status, Status::SUCCESS);

    // Delete reports the mandated warning and closes the handle.
    let status = unsafe { ((*file).delete)(file) };
    assert_eq!(status, Status::WARN_DELETE_FAILURE);
    assert!(status.is_warning());
}

#[test]
fn symlink_entries_list_with_zero_size() {
    let mut harness = mount();
    let root = harness.open_volume();

    let dir2 = open(root, "dir2", FILE_MODE_READ).unwrap();
    let entry = read_dir_entry(dir2).unwrap();
    assert_eq!(entry.name, "link");
    assert_eq!(entry.size, 0);
    assert_eq!(entry.attribute, ATTR_READ_ONLY);
    assert_eq!(read_dir_entry(dir2), None);
    assert_eq!(close(dir2), Status::SUCCESS);
}

#[test]
fn filesystem_info_reflects_media_and_label() {
    let mut harness = mount();
    let root = harness.open_volume();

    let (status, len, record) = get_info(root, &FILE_SYSTEM_INFO_GUID, MIN_FS_INFO_SIZE);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(
        u64::from_le_bytes(record[0..8].try_into().unwrap()),
        len as u64
    );
    assert_eq!(record[8], 1, "read-only");
    assert_eq!(
        u64::from_le_bytes(record[16..24].try_into().unwrap()),
        u64::from(BLOCK_SIZE) * (LAST_BLOCK + 1),
        "volume size"
    );
    assert_eq!(
        u64::from_le_bytes(record[24..32].try_into().unwrap()),
        0,
        "free space"
    );
    assert_eq!(
        u32::from_le_bytes(record[32..36].try_into().unwrap()),
        BLOCK_SIZE
    );
    let label: Vec<u16> = record[FS_INFO_LABEL_OFFSET..len - 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(String::from_utf16(&label).unwrap(), "TESTVOL");
}

#[test]
fn volume_label_info_is_label_only() {
    let mut harness = mount();
    let root = harness.open_volume();

    let (status, len, record) = get_info(root, &FILE_SYSTEM_VOLUME_LABEL_GUID, 64);
    assert_eq!(status, Status::SUCCESS);
    assert_eq!(len, ("TESTVOL".len() + 1) * 2);
    let label: Vec<u16> = record[..len - 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(String::from_utf16(&label).unwrap(), "TESTVOL");
}

#[test]
fn unknown_info_type_is_unsupported() {
    let mut harness = mount();
    let root = harness.open_volume();

    let bogus = Guid::new(0x12345678, 0x9ABC, 0xDEF0, [0; 8]);
    let (status, _, _) = get_info(root, &bogus, MIN_FILE_INFO_SIZE);
    assert_eq!(status, Status::UNSUPPORTED);
}

#[test]
fn short_get_info_reports_needed_length() {
    let mut harness = mount();
    let root = harness.open_volume();

    let (status, len, _) = get_info(root, &FILE_INFO_GUID, 16);
    assert_eq!(status, Status::BUFFER_TOO_SMALL);
    assert_eq!(len, MIN_FILE_INFO_SIZE);

    let (status, len, _) = get_info(root, &FILE_SYSTEM_INFO_GUID, 16);
    assert_eq!(status, Status::BUFFER_TOO_SMALL);
    assert_eq!(len, MIN_FS_INFO_SIZE);
}

#[test]
fn root_file_info_names_the_root() {
    let mut harness = mount();
    let root = harness.open_volume();

    let (status, len, record) = get_info(root, &FILE_INFO_GUID, MIN_FILE_INFO_SIZE);
    assert_eq!(status, Status::SUCCESS);
    let entry = parse_file_info(&record[..len]);
    assert_eq!(entry.name, "");
    assert_eq!(entry.attribute, ATTR_READ_ONLY | ATTR_DIRECTORY);
}
