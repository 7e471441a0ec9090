//! Extracted-directory layout - the contract between unpack and repack.
//!
//! An unpacked image is a single flat directory:
//!
//! ```text
//! 00000000_header.bin     the 560-byte firmware header
//! <H>_head.bin            256-byte section header at file offset H
//! <P>_sect.bin            payload of a non-ROMFS section (P = H + 256)
//! <P>.dir                 ROMFS listing, one filename per line, in order
//! <P>_files/<name>        ROMFS member files (present instead of _sect.bin)
//! ```
//!
//! Offsets are rendered as exactly 8 uppercase hex digits so that the
//! lexicographic sort of the directory listing equals byte order in the
//! image; the repacker relies on that sort for emission order.

/// Name of the saved firmware header.
pub const HEADER_FILE: &str = "00000000_header.bin";

/// Suffix of a saved section header.
pub const HEAD_SUFFIX: &str = "_head.bin";

/// Suffix of a saved opaque section payload.
pub const SECT_SUFFIX: &str = "_sect.bin";

/// Suffix of a ROMFS listing file.
pub const DIR_SUFFIX: &str = ".dir";

/// Suffix of a ROMFS member directory.
pub const FILES_SUFFIX: &str = "_files";

/// Render `offset` plus a layout suffix, e.g. `offset_name(0x230, "_head.bin")`
/// is `"00000230_head.bin"`.
pub fn offset_name(offset: u32, suffix: &str) -> String {
    format!("{offset:08X}{suffix}")
}

/// Parse the 8-uppercase-hex-digit offset a layout filename starts with.
///
/// Returns [`None`] for names that do not follow the contract (wrong
/// length, lowercase digits, non-hex characters).
pub fn parse_offset(name: &str) -> Option<u32> {
    let digits = name.get(..8)?;
    if !digits
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_names_sort_like_byte_order() {
        let names = [
            HEADER_FILE.to_string(),
            offset_name(0x230, HEAD_SUFFIX),
            offset_name(0x330, SECT_SUFFIX),
            offset_name(0x730, HEAD_SUFFIX),
            offset_name(0x830, DIR_SUFFIX),
        ];
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, names);
    }

    #[test]
    fn offsets_round_trip_through_names() {
        let name = offset_name(0xAB12, HEAD_SUFFIX);
        assert_eq!(name, "0000AB12_head.bin");
        assert_eq!(parse_offset(&name), Some(0xAB12));
    }

    #[test]
    fn lowercase_or_short_names_are_rejected() {
        assert_eq!(parse_offset("0000ab12_head.bin"), None);
        assert_eq!(parse_offset("0230"), None);
        assert_eq!(parse_offset("0000G230_head.bin"), None);
        assert_eq!(parse_offset(HEADER_FILE), Some(0));
    }
}
