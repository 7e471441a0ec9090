//! Repacker - rebuild a `.bin` / `.ch` pair from an extracted directory.
//!
//! Repacking is strict: the extracted layout is trusted as produced by the
//! unpacker, no rediscovery by magic scan happens, and any missing or
//! malformed piece aborts the run. Emission order is the lexicographic
//! sort of the source listing, which the [`crate::layout`] offset naming
//! makes equal to byte order.
//!
//! All length and checksum fields are recomputed: section header CRC32 and
//! length, directory entry length and negated running CRC32, body CRC32,
//! and the final MD5 sidecar. Everything else is emitted verbatim.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::formats::checksum::ChecksumFile;
use crate::formats::fwheader::{
    DirectoryEntry, BODY_CRC32_OFFSET, DIRECTORY_CAPACITY, FIRMWARE_HEADER_SIZE, FIRMWARE_MAGIC,
};
use crate::formats::romfs::{self, RomfsDialect};
use crate::formats::section::{patch_section_header, MAGIC_OFFSET, SECTION_HEADER_SIZE, SECTION_MAGIC};
use crate::layout;
use crate::utils::{crc32, md5_hex};
use crate::{Error, Result};

/// Configuration for one repack run.
#[derive(Debug, Clone, Copy)]
pub struct RepackOptions {
    /// ROMFS parameterization used to rebuild partition sections.
    pub dialect: RomfsDialect,
}

impl Default for RepackOptions {
    fn default() -> Self {
        Self {
            dialect: RomfsDialect::SJ8PRO,
        }
    }
}

/// Rebuild `source` (an extracted directory, possibly edited) into the
/// image `bin_path` and its sidecar `ch_path`.
///
/// Both output paths must not pre-exist.
pub fn repack(source: &Path, bin_path: &Path, ch_path: &Path, options: &RepackOptions) -> Result<()> {
    if bin_path.exists() {
        return Err(Error::OutputExists(bin_path.to_path_buf()));
    }
    if ch_path.exists() {
        return Err(Error::OutputExists(ch_path.to_path_buf()));
    }

    let mut names: Vec<String> = fs::read_dir(source)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let header = fs::read(source.join(layout::HEADER_FILE))?;
    if header.len() != FIRMWARE_HEADER_SIZE {
        return Err(Error::Parse("firmware header must be 560 bytes"));
    }
    if header[32..36] != FIRMWARE_MAGIC {
        return Err(Error::BadMagic);
    }

    let mut out = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(bin_path)?;
    out.write_all(&header)?;

    let mut running_crc32 = 0u32;
    let mut sections = 0usize;
    for name in &names {
        if !name.ends_with(layout::HEAD_SUFFIX) {
            continue;
        }
        if sections >= DIRECTORY_CAPACITY {
            return Err(Error::Parse("more than 16 sections in the source directory"));
        }
        let head_offset = layout::parse_offset(name)
            .ok_or(Error::Parse("malformed section header filename"))?;
        debug!("emitting section {head_offset:08X}");

        let mut head = fs::read(source.join(name))?;
        if head.len() != SECTION_HEADER_SIZE {
            return Err(Error::Parse("section header must be 256 bytes"));
        }
        if head[MAGIC_OFFSET..MAGIC_OFFSET + 4] != SECTION_MAGIC {
            return Err(Error::BadMagic);
        }

        let payload_offset = head_offset + SECTION_HEADER_SIZE as u32;
        let dir_path = source.join(layout::offset_name(payload_offset, layout::DIR_SUFFIX));
        let sect_path = source.join(layout::offset_name(payload_offset, layout::SECT_SUFFIX));

        let entry_length;
        if dir_path.is_file() {
            // ROMFS section: rebuild the partition from the listed files.
            let payload = build_romfs_payload(source, payload_offset, &dir_path, options.dialect)?;
            patch_section_header(&mut head, &payload);
            let mut section = head;
            section.extend_from_slice(&payload);
            out.write_all(&section)?;
            running_crc32 = crc32(running_crc32, &section);
            entry_length = section.len() as u32;
        } else if sect_path.is_file() {
            // Opaque section: the running CRC32 is updated in two steps,
            // header then payload, and the directory entry is recorded
            // once after the payload update.
            let payload = fs::read(&sect_path)?;
            patch_section_header(&mut head, &payload);
            out.write_all(&head)?;
            running_crc32 = crc32(running_crc32, &head);
            out.write_all(&payload)?;
            running_crc32 = crc32(running_crc32, &payload);
            entry_length = (head.len() + payload.len()) as u32;
        } else {
            return Err(Error::MissingSectionData(head_offset));
        }

        let entry = DirectoryEntry::offset_in_header(sections) as u64;
        patch_u32(&mut out, entry, entry_length)?;
        patch_u32(&mut out, entry + 4, 0xFFFF_FFFF ^ running_crc32)?;
        out.seek(SeekFrom::End(0))?;
        sections += 1;
    }

    // Body CRC32 over everything after the firmware header.
    out.seek(SeekFrom::Start(FIRMWARE_HEADER_SIZE as u64))?;
    let mut body = Vec::new();
    out.read_to_end(&mut body)?;
    patch_u32(&mut out, BODY_CRC32_OFFSET as u64, crc32(0, &body))?;

    out.seek(SeekFrom::Start(0))?;
    let mut whole = Vec::new();
    out.read_to_end(&mut whole)?;
    let ch = ChecksumFile::from_digest(&md5_hex(&whole))?;

    let mut ch_file = OpenOptions::new().write(true).create_new(true).open(ch_path)?;
    ch_file.write_all(&ch.to_bytes())?;
    Ok(())
}

/// Rebuild a ROMFS partition from the `.dir` listing and its `_files/`
/// directory, in listing order.
fn build_romfs_payload(
    source: &Path,
    payload_offset: u32,
    dir_path: &Path,
    dialect: RomfsDialect,
) -> Result<Vec<u8>> {
    let files_dir = source.join(layout::offset_name(payload_offset, layout::FILES_SUFFIX));
    let listing = fs::read_to_string(dir_path)?;

    let mut files = Vec::new();
    for line in listing.lines() {
        if line.is_empty() {
            continue;
        }
        let data = fs::read(files_dir.join(line))?;
        files.push((line.to_string(), data));
    }
    romfs::build(&files, dialect)
}

fn patch_u32(out: &mut File, offset: u64, value: u32) -> Result<()> {
    out.seek(SeekFrom::Start(offset))?;
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}
