//! **ambakit** - a Rust library for unpacking and repacking Ambarella H22
//! firmware containers (SJCAM SJ8 Pro, SJ10 Pro, Firefly X Lite).
//!
//! The firmware is a structured container: a 560-byte file header with a
//! section directory, a sequence of typed sections each behind a 256-byte
//! header, and - inside ROMFS sections - an inner archive of named files.
//! Integrity is layered: MD5 over the whole file, CRC32 over the body, a
//! running CRC32 chained across sections, a CRC32 per section payload, and
//! a CRC32 per ROMFS file.
//!
//! # Modules
//! | Module       | Responsibility |
//! |--------------|----------------|
//! | [`formats`]  | Codecs for the file header, section header, ROMFS partition, and `.ch` sidecar |
//! | [`layout`]   | The extracted-directory contract coupling unpack and repack |
//! | [`mod@unpack`] | Lenient verify-and-extract orchestrator |
//! | [`mod@repack`] | Strict reassembly orchestrator (recomputes every checksum) |
//! | [`utils`]    | Byte field codecs, seeded CRC32, MD5 |
//!
//! An untouched unpack-then-repack reproduces the input image and its
//! sidecar byte for byte.

pub mod error;
pub mod formats;
pub mod layout;
pub mod repack;
pub mod unpack;
pub mod utils;

pub use error::{Error, Result};
pub use repack::{repack, RepackOptions};
pub use unpack::{unpack, UnpackOptions};
