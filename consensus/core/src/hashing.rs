use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::str;

/// The width of an event content hash in bytes.
pub const HASH_SIZE: usize = 32;

/// The content hash of an event, computed by the hasher stage before intake.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// Converts a raw digest into a hash, returning `None` unless the slice is
    /// exactly [`HASH_SIZE`] bytes. Wire data carries digests as raw bytes, so this
    /// is the only way a descriptor hash becomes addressable.
    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; HASH_SIZE] = slice.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; HASH_SIZE * 2];
        faster_hex::hex_encode(&self.0, &mut hex).expect("The output is exactly twice the size of the input");
        f.write_str(str::from_utf8(&hex).expect("hex is always valid UTF-8"))
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl From<u64> for Hash {
    fn from(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        bytes[..8].copy_from_slice(&word.to_le_bytes());
        Self(bytes)
    }
}
