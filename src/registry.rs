//! The filesystem GUID registry.
//!
//! Every filesystem family this shell can be built against owns a fixed
//! GUID. The GUID doubles as the identity of the per-family singleton
//! protocol (the cross-image mutex) and must stay in sync with the published
//! driver binaries.

use crate::efi::Guid;

#[rustfmt::skip]
static FS_GUIDS: &[(&str, Guid)] = &[
    ("affs",    Guid::new(0x5CAA9E30, 0x860C, 0x4E38, [0xB3, 0x84, 0x3D, 0xC9, 0x11, 0x42, 0x2F, 0xBE])),
    ("bfs",     Guid::new(0x2B193E65, 0xDE98, 0x4E46, [0x9F, 0xCE, 0x11, 0x46, 0x0A, 0xB1, 0x14, 0x3D])),
    ("btrfs",   Guid::new(0x330C2595, 0x055C, 0x46E5, [0x8A, 0x11, 0x5E, 0x7A, 0x52, 0x34, 0xDC, 0x92])),
    ("exfat",   Guid::new(0xC5372182, 0x1AD1, 0x4955, [0xBD, 0xC9, 0x4A, 0xBC, 0xC8, 0x2B, 0x20, 0x43])),
    ("hfs",     Guid::new(0x32BFB12F, 0x18C0, 0x4478, [0x90, 0x4B, 0xE4, 0x66, 0x31, 0x49, 0x65, 0x39])),
    ("hfsplus", Guid::new(0xFF3D9105, 0xE595, 0x4818, [0x80, 0xFC, 0xB1, 0xB1, 0x5B, 0xDE, 0x15, 0x86])),
    ("jfs",     Guid::new(0x90970AA7, 0xCA99, 0x45C4, [0xB1, 0x61, 0x15, 0x95, 0xDC, 0x63, 0x1F, 0xBA])),
    ("ntfs",    Guid::new(0x3AD33E69, 0x7966, 0x4081, [0x9A, 0x66, 0x9B, 0xA8, 0xE5, 0x4E, 0x06, 0x4B])),
    ("xfs",     Guid::new(0xB1EC46ED, 0x896B, 0x4838, [0x8B, 0x39, 0x66, 0xFF, 0x9F, 0xEE, 0x3A, 0x9A])),
];

/// Look up the GUID registered for a filesystem family, by name,
/// case-insensitively. A driver whose parser is absent from the registry
/// must refuse to load.
pub fn fs_guid(name: &str) -> Option<Guid> {
    FS_GUIDS
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
        .map(|(_, guid)| *guid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(fs_guid("ntfs"), fs_guid("NTFS"));
        assert!(fs_guid("ntfs").is_some());
    }

    #[test]
    fn unknown_family_has_no_guid() {
        assert_eq!(fs_guid("vfat2000"), None);
    }

    #[test]
    fn guids_are_distinct() {
        for (i, (name_a, guid_a)) in FS_GUIDS.iter().enumerate() {
            for (name_b, guid_b) in &FS_GUIDS[i + 1..] {
                assert_ne!(guid_a, guid_b, "{name_a} and {name_b} share a GUID");
            }
        }
    }

    #[test]
    fn ntfs_guid_matches_published_binary() {
        assert_eq!(
            fs_guid("ntfs").unwrap().to_string(),
            "3ad33e69-7966-4081-9a66-9ba8e54e064b"
        );
    }
}
