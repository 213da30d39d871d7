//! UTF-8 / UTF-16LE conversion.
//!
//! The firmware boundary speaks NUL-terminated UTF-16; the parser kit speaks
//! UTF-8. Both directions come in an allocating and a fixed-buffer form; the
//! fixed-buffer forms report the capacity a retry would need. Unpaired
//! surrogates on the UTF-16 side are replaced with U+FFFD rather than
//! rejected, matching how permissive firmware path handling has to be.

use alloc::string::String;
use alloc::vec::Vec;

use crate::efi::Char16;

/// Conversion failure of the fixed-buffer codec forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The destination cannot hold the converted string plus its NUL;
    /// `needed` is the total capacity required, in destination units.
    BufferTooSmall { needed: usize },
}

/// Convert UTF-8 to NUL-terminated UTF-16.
pub fn utf8_to_utf16(src: &str) -> Vec<Char16> {
    let mut out: Vec<Char16> = src.encode_utf16().collect();
    out.push(0);
    out
}

/// Convert UTF-8 into a fixed UTF-16 buffer, NUL included. Returns the
/// number of units written excluding the NUL.
pub fn utf8_to_utf16_into(src: &str, dst: &mut [Char16]) -> Result<usize, CodecError> {
    let needed = src.encode_utf16().count() + 1;
    if needed > dst.len() {
        return Err(CodecError::BufferTooSmall { needed });
    }
    let mut at = 0;
    for unit in src.encode_utf16() {
        dst[at] = unit;
        at += 1;
    }
    dst[at] = 0;
    Ok(at)
}

/// Convert UTF-16 (without terminator) to UTF-8.
pub fn utf16_to_utf8(src: &[Char16]) -> String {
    core::char::decode_utf16(src.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Convert UTF-16 (without terminator) into a fixed UTF-8 buffer, NUL
/// included. Returns the number of bytes written excluding the NUL.
pub fn utf16_to_utf8_into(src: &[Char16], dst: &mut [u8]) -> Result<usize, CodecError> {
    let mut buf = [0u8; 4];
    let mut at = 0;
    for c in core::char::decode_utf16(src.iter().copied()) {
        let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
        let encoded = c.encode_utf8(&mut buf);
        if at + encoded.len() + 1 > dst.len() {
            return Err(CodecError::BufferTooSmall {
                needed: required_utf8(src),
            });
        }
        dst[at..at + encoded.len()].copy_from_slice(encoded.as_bytes());
        at += encoded.len();
    }
    if at >= dst.len() {
        return Err(CodecError::BufferTooSmall {
            needed: required_utf8(src),
        });
    }
    dst[at] = 0;
    Ok(at)
}

fn required_utf8(src: &[Char16]) -> usize {
    core::char::decode_utf16(src.iter().copied())
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER).len_utf8())
        .sum::<usize>()
        + 1
}

/// View a NUL-terminated UTF-16 string as a slice, terminator excluded.
///
/// # Safety
///
/// `ptr` must be non-null and point to a NUL-terminated sequence of valid,
/// readable `u16` units.
pub unsafe fn utf16_from_ptr<'a>(ptr: *const Char16) -> &'a [Char16] {
    let mut len = 0;
    unsafe {
        while ptr.add(len).read() != 0 {
            len += 1;
        }
        core::slice::from_raw_parts(ptr, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trip() {
        let wide = utf8_to_utf16("dir1/sub");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(utf16_to_utf8(&wide[..wide.len() - 1]), "dir1/sub");
    }

    #[test]
    fn surrogate_pairs_survive() {
        let s = "\u{1F4BE}.img"; // U+1F4BE encodes as a surrogate pair
        let wide = utf8_to_utf16(s);
        assert_eq!(wide.len(), 2 + 4 + 1);
        assert_eq!(utf16_to_utf8(&wide[..wide.len() - 1]), s);
    }

    #[test]
    fn unpaired_surrogate_is_replaced() {
        let wide = [0xD800u16, b'x' as u16];
        assert_eq!(utf16_to_utf8(&wide), "\u{FFFD}x");
    }

    #[test]
    fn fixed_form_reports_needed_capacity() {
        let mut dst = [0u16; 4];
        let err = utf8_to_utf16_into("abcdef", &mut dst).unwrap_err();
        assert_eq!(err, CodecError::BufferTooSmall { needed: 7 });

        let mut dst = [0u8; 4];
        let wide = utf8_to_utf16("abcdef");
        let err = utf16_to_utf8_into(&wide[..wide.len() - 1], &mut dst).unwrap_err();
        assert_eq!(err, CodecError::BufferTooSmall { needed: 7 });
    }

    #[test]
    fn fixed_form_writes_terminator() {
        let mut dst = [0xFFFFu16; 6];
        let written = utf8_to_utf16_into("abc", &mut dst).unwrap();
        assert_eq!(written, 3);
        assert_eq!(&dst[..4], &[b'a' as u16, b'b' as u16, b'c' as u16, 0][..]);

        let mut dst = [0xAAu8; 6];
        let wide = [b'a' as u16, b'b' as u16];
        let written = utf16_to_utf8_into(&wide, &mut dst).unwrap();
        assert_eq!(written, 2);
        assert_eq!(&dst[..3], &b"ab\0"[..]);
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut dst = [0u16; 4];
        assert_eq!(utf8_to_utf16_into("abc", &mut dst), Ok(3));
    }

    #[test]
    fn ptr_scan_stops_at_nul() {
        let wide = [b'o' as u16, b'k' as u16, 0, b'x' as u16];
        let s = unsafe { utf16_from_ptr(wide.as_ptr()) };
        assert_eq!(s, &[b'o' as u16, b'k' as u16][..]);
    }
}
