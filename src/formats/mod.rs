//! Codecs for the on-disk structures of an H22 firmware image.
//!
//! Each submodule targets one structure. All codecs follow the same
//! conventions:
//!
//! * **Raw retention** - parsers keep the exact header bytes they read, so
//!   opaque and unidentified fields round-trip untouched when the repacker
//!   patches the few fields it owns.
//! * **Copied values** - parsed structs borrow nothing; they carry copied
//!   primitives plus owned name strings.
//! * **Verification is the caller's job** - codecs decode the stored
//!   checksums; the orchestrators compare them against recomputed ones and
//!   decide what to report.
//!
//! ## Structure overview
//!
//! | Module       | Structure | Description |
//! |--------------|-----------|-------------|
//! | [`fwheader`] | File header | 560-byte header with name, body CRC32, and the 16-entry section directory |
//! | [`section`]  | Section header | 256-byte per-section header; payload CRC32, version, date, length |
//! | [`romfs`]    | ROMFS partition | Inner archive of named files with 2048-byte tail padding |
//! | [`checksum`] | `.ch` sidecar | The image MD5 as four little-endian words |

pub mod checksum;
pub mod fwheader;
pub mod romfs;
pub mod section;
