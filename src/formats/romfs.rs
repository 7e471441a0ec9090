//! ROMFS - Ambarella's read-only in-memory filesystem partition.
//!
//! Some section payloads are ROMFS partitions packaging many small files
//! (DSP microcode, fonts, menu bitmaps). All offsets in a partition are
//! relative to its first byte (the magic).
//!
//! ## Layout
//! ```text
//! [0x00] Magic 8A 32 FC 66                    (4 bytes)
//! [0x04] FileCount                            (u32 LE)
//! [0x08] EntryTable (FileCount × entry size)
//! [....] Zero padding to the dialect header size
//! [....] File payloads, each followed by its padding
//! ```
//!
//! ## File entry
//! ```text
//! [0x00] Filename (zero-padded UTF-8)         (dialect name width)
//! [+0x00] Length                              (u32 LE)
//! [+0x04] Offset from partition start         (u32 LE)
//! [+0x08] Crc32 of the payload                (u32 LE)
//! ```
//!
//! ## Dialects
//! | Camera class        | Header size       | Name width |
//! |---------------------|-------------------|------------|
//! | SJ8 Pro / X Lite    | 6144 (2048 × 3)   | 64 bytes   |
//! | SJ10 Pro            | 139264 (2048 × 68)| 256 bytes  |
//!
//! ## Padding rule
//! Every payload is followed by `2048 - (length mod 2048)` zero bytes, so
//! an already-aligned payload still gets a full 2048-byte pad block. The
//! rule is a format invariant; the padding is always in `1..=2048` and
//! the first file always sits at the dialect header size.

use crate::utils::{crc32, fixed_string, fixed_string_bytes, get_u32_le};
use crate::{Error, Result};

/// Partition magic at offset 0.
pub const ROMFS_MAGIC: [u8; 4] = [0x8A, 0x32, 0xFC, 0x66];

/// Alignment unit for file payloads.
pub const ROMFS_ALIGN: u32 = 2048;

/// Byte offset of the first entry (magic + file count).
pub const ENTRY_TABLE_OFFSET: usize = 8;

/// Largest believable file count; anything above this is a false magic hit.
pub const MAX_FILE_COUNT: u32 = 0xFFFF;

/// The two ROMFS parameterizations this tool understands.
///
/// The dialect is a configuration choice - autodetection is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomfsDialect {
    /// Size of the partition header (magic + count + entry table + padding).
    pub header_size: u32,
    /// Width of the filename field in an entry.
    pub name_size: usize,
}

impl RomfsDialect {
    /// SJ8 Pro / Firefly X Lite class.
    pub const SJ8PRO: Self = Self {
        header_size: 2048 * 3,
        name_size: 64,
    };

    /// SJ10 Pro class.
    pub const SJ10PRO: Self = Self {
        header_size: 2048 * 68,
        name_size: 256,
    };

    /// Size of one directory entry in bytes.
    pub fn entry_size(&self) -> usize {
        self.name_size + 12
    }
}

/// Zero bytes that follow a payload of `length` bytes.
///
/// Always in `1..=2048`: a 2048-aligned payload gets a full extra block.
pub fn padding_after(length: u32) -> u32 {
    ROMFS_ALIGN - (length % ROMFS_ALIGN)
}

/// Metadata for one file inside a ROMFS partition.
#[derive(Debug, Clone)]
pub struct RomfsFile {
    /// Filename decoded from the fixed-width field.
    pub name: String,
    /// Payload length in bytes.
    pub length: u32,
    /// Byte offset of the payload from the partition start.
    pub offset: u32,
    /// CRC32 the entry asserts over the payload.
    pub crc32: u32,
}

impl RomfsFile {
    /// Borrow this file's payload out of the partition bytes.
    ///
    /// Returns [`Error::InvalidRange`] if the entry points outside
    /// `partition`.
    pub fn payload<'a>(&self, partition: &'a [u8]) -> Result<&'a [u8]> {
        let start = self.offset as usize;
        let end = start + self.length as usize;
        partition.get(start..end).ok_or(Error::InvalidRange)
    }

    /// The partition offset the layout rules place right after this file.
    pub fn next_offset(&self) -> u32 {
        self.offset + self.length + padding_after(self.length)
    }
}

/// Parsed ROMFS partition (metadata only).
#[derive(Debug, Clone)]
pub struct Romfs {
    /// All file entries in directory order.
    pub files: Vec<RomfsFile>,
}

impl Romfs {
    /// Parse a ROMFS partition from `partition`.
    ///
    /// `partition` must start at the magic and may extend past the
    /// partition end (the unpacker hands in the rest of the image).
    /// A file count above [`MAX_FILE_COUNT`] rejects the candidate as a
    /// false magic hit.
    pub fn parse(partition: &[u8], dialect: RomfsDialect) -> Result<Self> {
        if partition.len() < ENTRY_TABLE_OFFSET {
            return Err(Error::UnexpectedEof);
        }
        if partition[..4] != ROMFS_MAGIC {
            return Err(Error::BadMagic);
        }

        let file_count = get_u32_le(partition, 4);
        if file_count > MAX_FILE_COUNT {
            return Err(Error::Parse("ROMFS file count exceeds maximum"));
        }

        let entry_size = dialect.entry_size();
        let table_end = ENTRY_TABLE_OFFSET + file_count as usize * entry_size;
        if table_end > partition.len() {
            return Err(Error::UnexpectedEof);
        }

        let mut files = Vec::with_capacity(file_count as usize);
        for i in 0..file_count as usize {
            let base = ENTRY_TABLE_OFFSET + i * entry_size;
            files.push(RomfsFile {
                name: fixed_string(&partition[base..base + dialect.name_size]),
                length: get_u32_le(partition, base + dialect.name_size),
                offset: get_u32_le(partition, base + dialect.name_size + 4),
                crc32: get_u32_le(partition, base + dialect.name_size + 8),
            });
        }

        Ok(Self { files })
    }
}

/// Build a ROMFS partition from `files`, in the order given.
///
/// The first payload sits at the dialect header size; every payload is
/// followed by its padding block. Over-long names are silently truncated
/// to the dialect's name width.
pub fn build(files: &[(String, Vec<u8>)], dialect: RomfsDialect) -> Result<Vec<u8>> {
    let entry_size = dialect.entry_size();
    let table_end = ENTRY_TABLE_OFFSET + files.len() * entry_size;
    if table_end > dialect.header_size as usize {
        return Err(Error::Parse("too many files for ROMFS directory"));
    }

    let mut out = Vec::with_capacity(dialect.header_size as usize);
    out.extend_from_slice(&ROMFS_MAGIC);
    out.extend_from_slice(&(files.len() as u32).to_le_bytes());

    let mut offset = dialect.header_size;
    for (name, data) in files {
        out.extend_from_slice(&fixed_string_bytes(name, dialect.name_size));
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&crc32(0, data).to_le_bytes());
        offset += data.len() as u32 + padding_after(data.len() as u32);
    }
    out.resize(dialect.header_size as usize, 0);

    for (_, data) in files {
        out.extend_from_slice(data);
        let padded = out.len() + padding_after(data.len() as u32) as usize;
        out.resize(padded, 0);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_is_always_one_to_align() {
        assert_eq!(padding_after(0), 2048);
        assert_eq!(padding_after(1), 2047);
        assert_eq!(padding_after(2047), 1);
        assert_eq!(padding_after(2048), 2048);
        assert_eq!(padding_after(2049), 2047);
        assert_eq!(padding_after(4096), 2048);
    }

    #[test]
    fn empty_partition_is_all_zeros_after_the_count() {
        let partition = build(&[], RomfsDialect::SJ8PRO).unwrap();
        assert_eq!(partition.len(), RomfsDialect::SJ8PRO.header_size as usize);
        assert_eq!(partition[..4], ROMFS_MAGIC);
        assert_eq!(get_u32_le(&partition, 4), 0);
        assert!(partition[8..].iter().all(|&b| b == 0));

        let parsed = Romfs::parse(&partition, RomfsDialect::SJ8PRO).unwrap();
        assert!(parsed.files.is_empty());
    }

    #[test]
    fn aligned_payload_still_gets_a_full_pad_block() {
        let files = vec![
            ("first.bin".to_string(), vec![0x11; 2048]),
            ("second.bin".to_string(), vec![0x22; 10]),
        ];
        let partition = build(&files, RomfsDialect::SJ8PRO).unwrap();
        let parsed = Romfs::parse(&partition, RomfsDialect::SJ8PRO).unwrap();

        assert_eq!(parsed.files[0].offset, 6144);
        // 2048 payload + 2048 pad, not 2048 + 0.
        assert_eq!(parsed.files[1].offset, 6144 + 4096);
        assert_eq!(partition.len(), 6144 + 4096 + 2048);
    }

    #[test]
    fn build_then_parse_round_trips_entries() {
        let files = vec![
            ("dsp.bin".to_string(), b"microcode".to_vec()),
            ("font.bin".to_string(), vec![0x7F; 5000]),
        ];
        let partition = build(&files, RomfsDialect::SJ8PRO).unwrap();
        let parsed = Romfs::parse(&partition, RomfsDialect::SJ8PRO).unwrap();

        assert_eq!(parsed.files.len(), 2);
        for ((name, data), file) in files.iter().zip(&parsed.files) {
            assert_eq!(&file.name, name);
            assert_eq!(file.length as usize, data.len());
            assert_eq!(file.payload(&partition).unwrap(), &data[..]);
            assert_eq!(file.crc32, crc32(0, data));
        }
        assert_eq!(parsed.files[1].offset, parsed.files[0].next_offset());
    }

    #[test]
    fn long_names_are_truncated_to_the_field() {
        let long = "x".repeat(100);
        let files = vec![(long.clone(), vec![1, 2, 3])];
        let partition = build(&files, RomfsDialect::SJ8PRO).unwrap();
        let parsed = Romfs::parse(&partition, RomfsDialect::SJ8PRO).unwrap();
        assert_eq!(parsed.files[0].name, long[..64]);
    }

    #[test]
    fn sj10_dialect_uses_wide_entries() {
        let files = vec![("a".to_string(), vec![0u8; 1])];
        let partition = build(&files, RomfsDialect::SJ10PRO).unwrap();
        assert_eq!(partition.len() as u32, 139264 + 2048);
        let parsed = Romfs::parse(&partition, RomfsDialect::SJ10PRO).unwrap();
        assert_eq!(parsed.files[0].offset, 139264);
    }

    #[test]
    fn absurd_file_count_is_not_a_romfs() {
        let mut partition = vec![0u8; 64];
        partition[..4].copy_from_slice(&ROMFS_MAGIC);
        partition[4..8].copy_from_slice(&0x0001_0000u32.to_le_bytes());
        assert!(matches!(
            Romfs::parse(&partition, RomfsDialect::SJ8PRO),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn truncated_entry_table_is_rejected() {
        let mut partition = vec![0u8; 16];
        partition[..4].copy_from_slice(&ROMFS_MAGIC);
        partition[4..8].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(
            Romfs::parse(&partition, RomfsDialect::SJ8PRO),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn out_of_range_entry_payload_is_an_error() {
        let file = RomfsFile {
            name: "ghost".into(),
            length: 100,
            offset: 6144,
            crc32: 0,
        };
        assert!(matches!(
            file.payload(&[0u8; 32]),
            Err(Error::InvalidRange)
        ));
    }
}
