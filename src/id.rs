//! Sortable 96-bit record identifiers and their 20-character text codec.
//!
//! An [`Id`] is 12 raw bytes. At every system boundary (JSON, URL paths, form
//! fields, MCP tool arguments) it travels as 20 symbols from the base32hex
//! alphabet `0-9a-v`, 5 bits per symbol, most significant bit first. 96 bits
//! fill 19 symbols with one bit to spare; the last symbol carries that bit
//! followed by four zero padding bits.
//!
//! Decoding does not check that the padding bits of the final symbol are zero, so
//! the codec is only a bijection over strings it produced itself. See
//! [`Id::is_canonical`] for a caller that needs the strict check.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use rand::Rng;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of raw bytes in an identifier.
pub const ID_BYTES: usize = 12;

/// Number of symbols in the text form.
pub const ID_TEXT_LEN: usize = 20;

/// Base32hex symbols in value order.
pub const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Reverse lookup: ASCII byte → 5-bit value, `0xff` for bytes outside the alphabet.
const DECODE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [0xff_u8; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Failure to translate a text identifier back into bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("identifier must be {ID_TEXT_LEN} characters, got {len}")]
    InvalidLength { len: usize },
    #[error("invalid identifier character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },
}

/// Encode 12 bytes as 20 alphabet symbols.
pub fn encode(bytes: &[u8; ID_BYTES]) -> String {
    let mut out = String::with_capacity(ID_TEXT_LEN);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = (buffer >> bits) & 0x1f;
            out.push(ALPHABET[index as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    // Left-align the spare bit(s) in a final symbol, zero-padded.
    if bits > 0 {
        let index = (buffer << (5 - bits)) & 0x1f;
        out.push(ALPHABET[index as usize] as char);
    }

    out
}

/// Decode a 20-symbol text identifier into 12 bytes.
pub fn decode(text: &str) -> Result<[u8; ID_BYTES], CodecError> {
    let len = text.chars().count();
    if len != ID_TEXT_LEN {
        return Err(CodecError::InvalidLength { len });
    }

    let mut out = [0u8; ID_BYTES];
    let mut written = 0;
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for (position, ch) in text.chars().enumerate() {
        let value = if ch.is_ascii() {
            DECODE[ch as usize]
        } else {
            0xff
        };
        if value == 0xff {
            return Err(CodecError::InvalidCharacter { ch, position });
        }

        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            if written == ID_BYTES {
                return Err(CodecError::InvalidLength { len });
            }
            out[written] = (buffer >> bits) as u8;
            written += 1;
            buffer &= (1 << bits) - 1;
        }
    }

    // Leftover bits (the final symbol's padding) are discarded unchecked.
    if written != ID_BYTES {
        return Err(CodecError::InvalidLength { len });
    }
    Ok(out)
}

/// A 12-byte record identifier.
///
/// Layout of generated ids: 4-byte big-endian Unix seconds, 3-byte per-process
/// random tag, 2-byte process id, 3-byte counter. The leading timestamp makes
/// both the byte form and the text form sort by creation second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ID_BYTES]);

static PROCESS_TAG: OnceLock<[u8; 3]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl Id {
    /// Generate a fresh identifier for a new record.
    pub fn new() -> Self {
        Self::with_time(chrono::Utc::now())
    }

    /// Generate an identifier stamped with the given time.
    pub fn with_time(at: chrono::DateTime<chrono::Utc>) -> Self {
        let tag = PROCESS_TAG.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen()))
            .fetch_add(1, Ordering::Relaxed);
        let secs = at.timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        let pid = std::process::id() as u16;

        let mut bytes = [0u8; ID_BYTES];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..7].copy_from_slice(tag);
        bytes[7..9].copy_from_slice(&pid.to_be_bytes());
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    /// Creation time carried in the leading four bytes.
    pub fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        chrono::DateTime::from_timestamp(i64::from(secs), 0).unwrap_or_default()
    }

    /// `true` when `text` decodes and re-encodes to exactly itself.
    ///
    /// [`decode`] accepts non-zero padding bits in the last symbol; this does not.
    pub fn is_canonical(text: &str) -> bool {
        decode(text).map(|bytes| encode(&bytes) == text).unwrap_or(false)
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode(&self.0))
    }
}

impl std::str::FromStr for Id {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).map(Self)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for Id {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(&self.0[..]))
    }
}

impl FromSql for Id {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let blob = value.as_blob()?;
        let bytes: [u8; ID_BYTES] = blob
            .try_into()
            .map_err(|_| FromSqlError::InvalidBlobSize {
                expected_size: ID_BYTES,
                blob_size: blob.len(),
            })?;
        Ok(Self(bytes))
    }
}
