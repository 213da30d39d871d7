//! Shared harness: a mock parser over a RAM disk, served to the shell
//! through real protocol records, so tests drive the same function pointers
//! the firmware would.

use std::ffi::c_void;
use std::ptr::{self, NonNull};
use std::sync::{Once, OnceLock};

use efifs::efi::Status;
use efifs::efi::protocols::{
    BlockIoMedia, BlockIoProtocol, DiskIoProtocol, FileProtocol, SimpleFileSystemProtocol,
};
use efifs::{
    DirEntryInfo, DirHook, FsParser, ParserDevice, ParserError, ParserFile, ParserModule, Volume,
};

pub const MEDIA_ID: u32 = 0x2877;
pub const BLOCK_SIZE: u32 = 512;
pub const LAST_BLOCK: u64 = 7;

pub const HELLO_OFFSET: u64 = 1024;
pub const HELLO: &[u8] = &[0x00, 0x01, 0x02, 0x03];
pub const ALPHA_OFFSET: u64 = 2048;
pub const ALPHA: &[u8] = b"alpha\n";

pub const MTIME: i32 = 1_400_000_000; // 2014-05-13T16:53:20Z

/*
 * RAM disk behind the DiskIo protocol.
 */

fn disk_image() -> &'static [u8] {
    static IMAGE: OnceLock<Vec<u8>> = OnceLock::new();
    IMAGE.get_or_init(|| {
        let mut image = vec![0u8; (LAST_BLOCK as usize + 1) * BLOCK_SIZE as usize];
        image[HELLO_OFFSET as usize..HELLO_OFFSET as usize + HELLO.len()].copy_from_slice(HELLO);
        image[ALPHA_OFFSET as usize..ALPHA_OFFSET as usize + ALPHA.len()].copy_from_slice(ALPHA);
        image
    })
}

unsafe extern "efiapi" fn disk_read(
    _this: *mut DiskIoProtocol,
    media_id: u32,
    offset: u64,
    buffer_size: usize,
    buffer: *mut c_void,
) -> Status {
    if media_id != MEDIA_ID {
        return Status::MEDIA_CHANGED;
    }
    let image = disk_image();
    let start = offset as usize;
    if start + buffer_size > image.len() {
        return Status::DEVICE_ERROR;
    }
    unsafe {
        ptr::copy_nonoverlapping(image.as_ptr().add(start), buffer.cast::<u8>(), buffer_size);
    }
    Status::SUCCESS
}

unsafe extern "efiapi" fn disk_write(
    _this: *mut DiskIoProtocol,
    _media_id: u32,
    _offset: u64,
    _buffer_size: usize,
    _buffer: *mut c_void,
) -> Status {
    Status::WRITE_PROTECTED
}

unsafe extern "efiapi" fn block_reset(_this: *mut BlockIoProtocol, _extended: u8) -> Status {
    Status::SUCCESS
}

unsafe extern "efiapi" fn block_read(
    _this: *mut BlockIoProtocol,
    _media_id: u32,
    _lba: u64,
    _buffer_size: usize,
    _buffer: *mut c_void,
) -> Status {
    Status::UNSUPPORTED
}

unsafe extern "efiapi" fn block_write(
    _this: *mut BlockIoProtocol,
    _media_id: u32,
    _lba: u64,
    _buffer_size: usize,
    _buffer: *mut c_void,
) -> Status {
    Status::UNSUPPORTED
}

unsafe extern "efiapi" fn block_flush(_this: *mut BlockIoProtocol) -> Status {
    Status::SUCCESS
}

/*
 * Mock parser: a fixed tree whose regular files live on the RAM disk, read
 * back through the parser device so the whole disk path is exercised.
 */

enum Kind {
    Dir,
    File { offset: u64, len: usize },
    Symlink,
}

struct Node {
    parent: &'static str,
    name: &'static str,
    kind: Kind,
}

#[rustfmt::skip]
static TREE: &[Node] = &[
    Node { parent: "/",         name: "a.txt",     kind: Kind::File { offset: ALPHA_OFFSET, len: ALPHA.len() } },
    Node { parent: "/",         name: "dir1",      kind: Kind::Dir },
    Node { parent: "/",         name: "dir2",      kind: Kind::Dir },
    Node { parent: "/dir1",     name: "sub",       kind: Kind::Dir },
    Node { parent: "/dir1/sub", name: "hello.bin", kind: Kind::File { offset: HELLO_OFFSET, len: HELLO.len() } },
    Node { parent: "/dir2",     name: "link",      kind: Kind::Symlink },
];

fn node_at(path: &str) -> Option<&'static Node> {
    TREE.iter().find(|node| {
        let full = if node.parent == "/" {
            format!("/{}", node.name)
        } else {
            format!("{}/{}", node.parent, node.name)
        };
        full == path
    })
}

struct MockFs;

impl FsParser for MockFs {
    fn name(&self) -> &'static str {
        "ntfs"
    }

    fn dir(
        &self,
        _device: &ParserDevice,
        path: &str,
        mut hook: DirHook<'_>,
    ) -> Result<(), ParserError> {
        if path != "/" && !matches!(node_at(path), Some(Node { kind: Kind::Dir, .. })) {
            return Err(ParserError::FileNotFound);
        }
        // Dot entries first, the way real listings deliver them.
        let dots = DirEntryInfo {
            dir: true,
            mtime: Some(MTIME),
            ..Default::default()
        };
        if hook(".", &dots) || hook("..", &dots) {
            return Ok(());
        }
        for node in TREE.iter().filter(|node| node.parent == path) {
            let info = DirEntryInfo {
                dir: matches!(node.kind, Kind::Dir),
                mtime: Some(MTIME),
                ..Default::default()
            };
            if hook(node.name, &info) {
                return Ok(());
            }
        }
        Ok(())
    }

    fn open(
        &self,
        _device: &ParserDevice,
        path: &str,
    ) -> Result<Box<dyn ParserFile>, ParserError> {
        match node_at(path) {
            Some(Node {
                kind: Kind::File { offset, len },
                ..
            }) => Ok(Box::new(MockFile {
                disk_offset: *offset,
                size: *len as u64,
                offset: 0,
            })),
            Some(Node {
                kind: Kind::Symlink,
                ..
            }) => Err(ParserError::BadFileType),
            Some(Node { kind: Kind::Dir, .. }) => Err(ParserError::BadFileType),
            None => Err(ParserError::FileNotFound),
        }
    }

    fn label(&self, _device: &ParserDevice) -> Result<String, ParserError> {
        Ok(String::from("TESTVOL"))
    }

    fn uuid(&self, _device: &ParserDevice) -> Result<Option<String>, ParserError> {
        Ok(Some(String::from("0123-4567")))
    }
}

struct MockFile {
    disk_offset: u64,
    size: u64,
    offset: u64,
}

impl ParserFile for MockFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    fn read(&mut self, device: &ParserDevice, buf: &mut [u8]) -> Result<usize, ParserError> {
        let at = self.disk_offset + self.offset;
        device.read_disk(at / 512, at % 512, buf)?;
        Ok(buf.len())
    }
}

fn noop() {}

static MODULE: ParserModule = ParserModule {
    parser: &MockFs,
    init: noop,
    fini: noop,
};

fn ensure_registered() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        efifs::parser::register(&MODULE);
    });
}

/*
 * Mounted-volume harness.
 */

pub struct Harness {
    volume: NonNull<Volume>,
    _media: Box<BlockIoMedia>,
    _block: Box<BlockIoProtocol>,
    _disk: Box<DiskIoProtocol>,
}

pub fn mount() -> Harness {
    ensure_registered();
    let mut media = Box::new(BlockIoMedia {
        media_id: MEDIA_ID,
        removable_media: 0,
        media_present: 1,
        logical_partition: 1,
        read_only: 1,
        write_caching: 0,
        block_size: BLOCK_SIZE,
        io_align: 1,
        last_block: LAST_BLOCK,
    });
    let mut block = Box::new(BlockIoProtocol {
        revision: 0x0001_0000,
        media: &mut *media,
        reset: block_reset,
        read_blocks: block_read,
        write_blocks: block_write,
        flush_blocks: block_flush,
    });
    let mut disk = Box::new(DiskIoProtocol {
        revision: 0x0001_0000,
        read_disk: disk_read,
        write_disk: disk_write,
    });
    let volume = Volume::create(NonNull::from(&mut *block), NonNull::from(&mut *disk))
        .expect("mock volume must probe");
    Harness {
        volume,
        _media: media,
        _block: block,
        _disk: disk,
    }
}

impl Harness {
    /// `OpenVolume` through the published protocol record.
    pub fn open_volume(&mut self) -> *mut FileProtocol {
        let sfs: *mut SimpleFileSystemProtocol =
            unsafe { self.volume.as_mut() }.file_system_ptr();
        let mut root: *mut FileProtocol = ptr::null_mut();
        let status = unsafe { ((*sfs).open_volume)(sfs, &mut root) };
        assert_eq!(status, Status::SUCCESS);
        assert!(!root.is_null());
        root
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        unsafe { Volume::destroy(self.volume) };
    }
}

/*
 * Protocol-call helpers.
 */

pub const FILE_MODE_READ: u64 = 0x1;
pub const FILE_MODE_WRITE: u64 = 0x2;

pub fn wide(s: &str) -> Vec<u16> {
    efifs::codec::utf8_to_utf16(s)
}

pub fn open(
    parent: *mut FileProtocol,
    name: &str,
    mode: u64,
) -> Result<*mut FileProtocol, Status> {
    let name = wide(name);
    let mut out: *mut FileProtocol = ptr::null_mut();
    let status = unsafe { ((*parent).open)(parent, &mut out, name.as_ptr(), mode, 0) };
    if status.is_error() { Err(status) } else { Ok(out) }
}

pub fn close(file: *mut FileProtocol) -> Status {
    unsafe { ((*file).close)(file) }
}

pub fn read(file: *mut FileProtocol, want: usize) -> (Status, Vec<u8>) {
    let mut buf = vec![0u8; want.max(1)];
    let mut len = want;
    let status = unsafe { ((*file).read)(file, &mut len, buf.as_mut_ptr().cast()) };
    buf.truncate(len);
    (status, buf)
}

pub fn set_position(file: *mut FileProtocol, position: u64) -> Status {
    unsafe { ((*file).set_position)(file, position) }
}

pub fn get_position(file: *mut FileProtocol) -> (Status, u64) {
    let mut position = 0u64;
    let status = unsafe { ((*file).get_position)(file, &mut position) };
    (status, position)
}

/// One directory entry as decoded from an EFI_FILE_INFO record.
#[derive(Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub physical_size: u64,
    pub attribute: u64,
    pub year: u16,
}

pub fn parse_file_info(record: &[u8]) -> Entry {
    let u64_at = |at: usize| u64::from_le_bytes(record[at..at + 8].try_into().unwrap());
    let total = u64_at(0) as usize;
    assert_eq!(total, record.len(), "record size field disagrees with length");
    let mut name = Vec::new();
    let mut at = efifs::efi::info::FILE_INFO_NAME_OFFSET;
    loop {
        let unit = u16::from_le_bytes(record[at..at + 2].try_into().unwrap());
        if unit == 0 {
            break;
        }
        name.push(unit);
        at += 2;
    }
    Entry {
        name: String::from_utf16(&name).unwrap(),
        size: u64_at(8),
        physical_size: u64_at(16),
        attribute: u64_at(72),
        year: u16::from_le_bytes(record[24..26].try_into().unwrap()),
    }
}

/// Pull the next directory record; `None` at end of directory.
pub fn read_dir_entry(dir: *mut FileProtocol) -> Option<Entry> {
    let (status, record) = read(dir, efifs::efi::info::MIN_FILE_INFO_SIZE);
    assert_eq!(status, Status::SUCCESS);
    if record.is_empty() {
        return None;
    }
    Some(parse_file_info(&record))
}

pub fn get_info(
    file: *mut FileProtocol,
    info_type: &efifs::efi::Guid,
    want: usize,
) -> (Status, usize, Vec<u8>) {
    let mut buf = vec![0u8; want.max(1)];
    let mut len = want;
    let status =
        unsafe { ((*file).get_info)(file, info_type, &mut len, buf.as_mut_ptr().cast()) };
    buf.truncate(len.min(buf.len()));
    (status, len, buf)
}
