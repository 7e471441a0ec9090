//! Low-level I/O and checksum primitives shared by all codecs.
//!
//! Each function reads exactly the bytes it promises or returns an error -
//! there is no partial-read ambiguity.

use std::io::Read;

use crc32fast::Hasher;

use crate::Result;

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Decode a `u16` at `offset` with caller-supplied endianness.
#[inline]
pub(crate) fn get_u16(buf: &[u8], offset: usize, le: bool) -> u16 {
    let b = [buf[offset], buf[offset + 1]];
    if le {
        u16::from_le_bytes(b)
    } else {
        u16::from_be_bytes(b)
    }
}

/// Decode a little-endian `u32` at `offset`.
#[inline]
pub(crate) fn get_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Encode `value` as little-endian `u32` at `offset`.
#[inline]
pub(crate) fn put_u32_le(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Every byte offset at which `needle` occurs in `haystack`, ascending.
///
/// Overlapping occurrences are all reported.
pub(crate) fn scan_magic(haystack: &[u8], needle: &[u8; 4]) -> Vec<usize> {
    let mut hits = Vec::new();
    if haystack.len() < needle.len() {
        return hits;
    }
    for i in 0..=haystack.len() - needle.len() {
        if &haystack[i..i + needle.len()] == needle {
            hits.push(i);
        }
    }
    hits
}

/// Decode a fixed-width zero-padded UTF-8 text field.
///
/// Everything up to the first NUL (or the end of the field) is decoded
/// lossily; trailing padding is discarded.
pub fn fixed_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Encode `name` into a `width`-byte zero-padded field.
///
/// Names longer than the field are silently truncated at the byte level.
pub fn fixed_string_bytes(name: &str, width: usize) -> Vec<u8> {
    let mut field = vec![0u8; width];
    let bytes = name.as_bytes();
    let len = bytes.len().min(width);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// CRC32 (zlib/IEEE polynomial) of `data`, seeded with `seed`.
///
/// `seed` is the finalized CRC32 of all preceding data, so checksums chain:
/// `crc32(0, [a, b]) == crc32(crc32(0, a), b)`. The CRC32 of empty input
/// with seed 0 is 0.
pub fn crc32(seed: u32, data: &[u8]) -> u32 {
    let mut hasher = Hasher::new_with_initial(seed);
    hasher.update(data);
    hasher.finalize()
}

/// MD5 of `data` as 32 lowercase hex digits.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_of_empty_input_is_zero() {
        assert_eq!(crc32(0, b""), 0);
    }

    #[test]
    fn crc32_check_value() {
        // The standard CRC-32/ISO-HDLC check vector.
        assert_eq!(crc32(0, b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn crc32_chains_across_spans() {
        let a = b"Ambarella ";
        let b = b"H22";
        let whole = crc32(0, b"Ambarella H22");
        assert_eq!(crc32(crc32(0, a), b), whole);
    }

    #[test]
    fn md5_hex_of_empty_input() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn fixed_string_strips_trailing_nuls() {
        assert_eq!(fixed_string(b"boot\0\0\0\0"), "boot");
        assert_eq!(fixed_string(b"12345678"), "12345678");
        assert_eq!(fixed_string(b"\0\0\0\0"), "");
    }

    #[test]
    fn fixed_string_bytes_pads_and_truncates() {
        assert_eq!(fixed_string_bytes("ab", 4), b"ab\0\0");
        assert_eq!(fixed_string_bytes("abcdef", 4), b"abcd");
        assert_eq!(fixed_string(&fixed_string_bytes("dsp.bin", 64)), "dsp.bin");
    }

    #[test]
    fn scan_magic_finds_all_hits() {
        let buf = b"..ABCD....ABCDABCD";
        assert_eq!(scan_magic(buf, b"ABCD"), vec![2, 10, 14]);
        assert_eq!(scan_magic(b"AB", b"ABCD"), Vec::<usize>::new());
    }
}
