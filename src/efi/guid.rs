//! The firmware's 128-bit globally unique identifier.

use core::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// EFI_GUID. Mixed-endian on the wire: the first three groups are stored
/// little-endian, the final eight bytes are stored as written.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Construct a GUID from the grouped form used in firmware headers.
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_canonical_form() {
        let guid = Guid::new(
            0x3AD33E69,
            0x7966,
            0x4081,
            [0x9A, 0x66, 0x9B, 0xA8, 0xE5, 0x4E, 0x06, 0x4B],
        );
        assert_eq!(
            guid.to_string(),
            "3ad33e69-7966-4081-9a66-9ba8e54e064b"
        );
    }

    #[test]
    fn layout_is_sixteen_bytes() {
        assert_eq!(core::mem::size_of::<Guid>(), 16);
    }
}
