//! Unpacker - verify a firmware image and extract it to a directory.
//!
//! Unpacking is lenient and diagnostic: every checksum layer is verified
//! and reported (`OK` / `FAIL`), but only structural failures that make
//! extraction impossible abort the run. The extracted directory follows
//! the [`crate::layout`] contract and is the ground truth the repacker
//! consumes.
//!
//! Section discovery is driven by the magic scan, not the directory table:
//! the directory is advisory on input, and scan hits that do not line up
//! with it are warned about instead of extracted.

use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;

use log::debug;

use crate::formats::checksum::ChecksumFile;
use crate::formats::fwheader::{FirmwareHeader, FIRMWARE_HEADER_SIZE};
use crate::formats::romfs::{Romfs, RomfsDialect, ROMFS_MAGIC};
use crate::formats::section::{SectionHeader, MAGIC_OFFSET, SECTION_HEADER_SIZE, SECTION_MAGIC};
use crate::layout;
use crate::utils::{crc32, md5_hex, scan_magic};
use crate::{Error, Result};

/// Configuration for one unpack run.
#[derive(Debug, Clone, Copy)]
pub struct UnpackOptions {
    /// ROMFS parameterization of the target camera family.
    pub dialect: RomfsDialect,
    /// Decode section version halves little-endian instead of the default
    /// big-endian.
    pub version_le: bool,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            dialect: RomfsDialect::SJ8PRO,
            version_le: false,
        }
    }
}

/// Verify `firmware` and extract it into `dest`.
///
/// `dest` must not pre-exist. `checksum` names the `.ch` sidecar; a
/// missing or mismatching sidecar is reported, not fatal.
pub fn unpack(
    firmware: &Path,
    checksum: Option<&Path>,
    dest: &Path,
    options: &UnpackOptions,
) -> Result<()> {
    if dest.exists() {
        return Err(Error::OutputExists(dest.to_path_buf()));
    }

    let data = fs::read(firmware)?;
    let mut cursor = Cursor::new(data.as_slice());
    let header = FirmwareHeader::parse(&mut cursor)?;

    fs::create_dir_all(dest)?;

    println!("firmware name: {}", header.name);

    if let Some(ch_path) = checksum {
        report_md5(ch_path, &data);
    }

    let body_crc32 = crc32(0, &data[FIRMWARE_HEADER_SIZE..]);
    println!(
        "body CRC32: {} (stored {:08X}, computed {:08X})",
        verdict(body_crc32 == header.body_crc32),
        header.body_crc32,
        body_crc32
    );

    let offsets = report_directory(&header, &data);

    fs::write(dest.join(layout::HEADER_FILE), header.raw())?;

    extract_sections(&data, &mut cursor, &offsets, dest, options)?;
    extract_romfs_partitions(&data, dest, options.dialect)?;

    Ok(())
}

/// Compare the `.ch` sidecar against the image MD5 and report the result.
fn report_md5(ch_path: &Path, data: &[u8]) {
    let bytes = match fs::read(ch_path) {
        Ok(bytes) => bytes,
        Err(_) => {
            println!("WARNING: cannot read checksum file {}", ch_path.display());
            return;
        }
    };
    match ChecksumFile::parse(&bytes) {
        Ok(stored) => {
            let digest = md5_hex(data);
            println!(
                "MD5 checksum: {} ({digest})",
                verdict(stored.digest_hex() == digest)
            );
        }
        Err(e) => println!("WARNING: malformed checksum file {}: {e}", ch_path.display()),
    }
}

/// Verify each directory entry's running CRC32 and return the section
/// header offsets the directory implies.
fn report_directory(header: &FirmwareHeader, data: &[u8]) -> Vec<u32> {
    let offsets = header.section_offsets();
    println!("directory: {} sections", header.entries.len());

    let mut running = 0u32;
    for (i, entry) in header.entries.iter().enumerate() {
        let start = offsets[i] as usize;
        let end = start + entry.length as usize;
        if end > data.len() {
            println!("WARNING: directory entry {i} runs past the end of the file");
            break;
        }
        running = crc32(running, &data[start..end]);
        println!(
            "  [{i}] offset {:08X} length {:8} running CRC32 {}",
            offsets[i],
            entry.length,
            verdict(running == entry.running_crc32())
        );
    }
    offsets
}

/// Extract every section the magic scan confirms.
fn extract_sections(
    data: &[u8],
    cursor: &mut Cursor<&[u8]>,
    offsets: &[u32],
    dest: &Path,
    options: &UnpackOptions,
) -> Result<()> {
    let directory: BTreeSet<u32> = offsets.iter().copied().collect();
    let mut found = BTreeSet::new();

    for m in scan_magic(data, &SECTION_MAGIC) {
        if m < MAGIC_OFFSET {
            println!("WARNING: section magic at {m:08X} leaves no room for a header");
            continue;
        }
        let head_offset = (m - MAGIC_OFFSET) as u32;
        if !directory.contains(&head_offset) {
            println!(
                "WARNING: section magic at {m:08X} does not match any directory entry"
            );
            continue;
        }
        found.insert(head_offset);

        cursor.seek(SeekFrom::Start(head_offset as u64))?;
        let section = match SectionHeader::parse(cursor, options.version_le) {
            Ok(section) => section,
            Err(e) => {
                println!("WARNING: cannot parse section header at {head_offset:08X}: {e}");
                continue;
            }
        };

        let payload_offset = head_offset as usize + SECTION_HEADER_SIZE;
        let mut payload_end = payload_offset + section.length as usize;
        if payload_end > data.len() {
            println!("WARNING: section payload at {payload_offset:08X} is truncated");
            payload_end = data.len();
        }
        let payload = &data[payload_offset..payload_end];

        println!(
            "section {head_offset:08X}: v{} {} length {:8} CRC32 {}",
            section.version,
            section.date,
            section.length,
            verdict(crc32(0, payload) == section.crc32)
        );

        fs::write(
            dest.join(layout::offset_name(head_offset, layout::HEAD_SUFFIX)),
            section.raw(),
        )?;

        // ROMFS payloads are extracted by the partition pass instead of
        // being saved as an opaque blob.
        if Romfs::parse(payload, options.dialect).is_err() {
            fs::write(
                dest.join(layout::offset_name(payload_offset as u32, layout::SECT_SUFFIX)),
                payload,
            )?;
        }
    }

    for offset in directory.difference(&found) {
        println!("WARNING: no section magic at directory offset {offset:08X}");
    }
    Ok(())
}

/// Extract every ROMFS partition the magic scan finds.
fn extract_romfs_partitions(data: &[u8], dest: &Path, dialect: RomfsDialect) -> Result<()> {
    for p in scan_magic(data, &ROMFS_MAGIC) {
        let partition = &data[p..];
        let romfs = match Romfs::parse(partition, dialect) {
            Ok(romfs) => romfs,
            Err(e) => {
                debug!("ignoring ROMFS magic at {p:08X}: {e}");
                continue;
            }
        };

        let files_dir = dest.join(layout::offset_name(p as u32, layout::FILES_SUFFIX));
        fs::create_dir_all(&files_dir)?;

        println!("romfs {p:08X}: {} files", romfs.files.len());
        let mut listing = String::new();
        let mut expected_offset = dialect.header_size;
        for file in &romfs.files {
            listing.push_str(&file.name);
            listing.push('\n');

            if file.offset != expected_offset {
                println!(
                    "WARNING: romfs file {} at offset {:08X}, expected {:08X}",
                    file.name, file.offset, expected_offset
                );
            }
            expected_offset = file.next_offset();

            let payload = match file.payload(partition) {
                Ok(payload) => payload,
                Err(_) => {
                    println!("WARNING: romfs file {} points outside the image", file.name);
                    continue;
                }
            };
            println!(
                "  {} length {:8} CRC32 {}",
                file.name,
                file.length,
                verdict(crc32(0, payload) == file.crc32)
            );
            fs::write(files_dir.join(&file.name), payload)?;
        }
        fs::write(
            dest.join(layout::offset_name(p as u32, layout::DIR_SUFFIX)),
            listing,
        )?;
    }
    Ok(())
}

fn verdict(ok: bool) -> &'static str {
    if ok { "OK" } else { "FAIL" }
}
