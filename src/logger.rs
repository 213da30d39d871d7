//! Level-based logging to the firmware console.
//!
//! The verbosity is read once at image entry from the `FS_LOGGING` shell
//! variable (a digit `0`..`5`, UTF-16 or ASCII) and frozen into the `log`
//! facade's max level; records at or below it render through the console's
//! `OutputString`, everything above is filtered before formatting.

use core::fmt::{self, Write};
use core::ptr;

use log::{LevelFilter, Log, Metadata, Record};

use crate::efi::protocols::SHELL_VARIABLE_GUID;
use crate::efi::tables::{self, Char16};

/// `L"FS_LOGGING"`.
#[rustfmt::skip]
const VARIABLE_NAME: [Char16; 11] = [
    b'F' as Char16, b'S' as Char16, b'_' as Char16, b'L' as Char16, b'O' as Char16,
    b'G' as Char16, b'G' as Char16, b'I' as Char16, b'N' as Char16, b'G' as Char16,
    0,
];

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console logger and latch the configured level. Safe to call
/// again after an image reload; the first registration wins.
pub(crate) fn init() {
    let level = read_level();
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
    log::trace!("LogLevel = {level}");
}

fn read_level() -> LevelFilter {
    let rt = tables::runtime_services();
    let mut data = [0u8; 8];
    let mut size = data.len();
    let status = unsafe {
        (rt.get_variable)(
            VARIABLE_NAME.as_ptr(),
            &SHELL_VARIABLE_GUID,
            ptr::null_mut(),
            &mut size,
            data.as_mut_ptr().cast(),
        )
    };
    if status.is_error() || size == 0 {
        return LevelFilter::Off;
    }
    // A single digit, stored either as UTF-16 or as ASCII.
    let digit = match data[0] {
        d @ b'0'..=b'9' => d - b'0',
        _ => return LevelFilter::Off,
    };
    match digit {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut writer = ConsoleWriter::new();
        let _ = writeln!(writer, "{}", record.args());
        writer.flush();
    }

    fn flush(&self) {}
}

/// Chunked UTF-16 renderer over the console output protocol.
struct ConsoleWriter {
    buf: [Char16; 128],
    len: usize,
}

impl ConsoleWriter {
    fn new() -> Self {
        Self {
            buf: [0; 128],
            len: 0,
        }
    }

    fn push(&mut self, unit: Char16) {
        // Keep one slot for the terminator.
        if self.len == self.buf.len() - 1 {
            self.flush();
        }
        self.buf[self.len] = unit;
        self.len += 1;
    }

    fn flush(&mut self) {
        if self.len == 0 {
            return;
        }
        self.buf[self.len] = 0;
        let con_out = tables::system_table().con_out;
        if !con_out.is_null() {
            unsafe {
                ((*con_out).output_string)(con_out, self.buf.as_ptr());
            }
        }
        self.len = 0;
    }
}

impl fmt::Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut units = [0u16; 2];
        for c in s.chars() {
            if c == '\n' {
                self.push(b'\r' as Char16);
            }
            for unit in c.encode_utf16(&mut units) {
                self.push(*unit);
            }
        }
        Ok(())
    }
}
