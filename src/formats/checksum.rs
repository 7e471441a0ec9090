//! Checksum sidecar file (`.ch`) - the MD5 of the image in word form.
//!
//! Every firmware `.bin` ships with a 16-byte `.ch` file. Its content is
//! the 32-digit MD5 hex of the `.bin`, cut into four 8-digit slices read
//! left to right, each parsed as a `u32` and stored little-endian.
//!
//! For the empty-input digest `d41d8cd98f00b204e9800998ecf8427e` the file
//! bytes are `d9 8c 1d d4  04 b2 00 8f  98 98 80 e9  7e 42 f8 ec`.

use crate::utils::get_u32_le;
use crate::{Error, Result};

/// Size of a `.ch` file in bytes.
pub const CHECKSUM_FILE_SIZE: usize = 16;

/// Decoded `.ch` file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumFile {
    words: [u32; 4],
}

impl ChecksumFile {
    /// Build from a 32-digit lowercase MD5 hex digest.
    pub fn from_digest(digest: &str) -> Result<Self> {
        if digest.len() != 32 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::Parse("MD5 digest must be 32 hex digits"));
        }
        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u32::from_str_radix(&digest[i * 8..(i + 1) * 8], 16)
                .map_err(|_| Error::Parse("MD5 digest must be 32 hex digits"))?;
        }
        Ok(Self { words })
    }

    /// Decode the 16 bytes of a `.ch` file.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() != CHECKSUM_FILE_SIZE {
            return Err(Error::Parse("checksum file must be 16 bytes"));
        }
        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            *word = get_u32_le(buf, i * 4);
        }
        Ok(Self { words })
    }

    /// The 16 bytes to write to a `.ch` file.
    pub fn to_bytes(&self) -> [u8; CHECKSUM_FILE_SIZE] {
        let mut out = [0u8; CHECKSUM_FILE_SIZE];
        for (i, word) in self.words.iter().enumerate() {
            out[i * 4..(i + 1) * 4].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// The MD5 hex digest this file encodes.
    pub fn digest_hex(&self) -> String {
        self.words.iter().map(|w| format!("{w:08x}")).collect()
    }
}
