//! CLI `id` commands: mint, encode and decode record identifiers.

use anyhow::{anyhow, Context, Result};

use crate::id::{self as codec, Id, ID_BYTES};

/// Print `count` fresh identifiers, one per line.
pub fn new_ids(count: usize) {
    for _ in 0..count {
        println!("{}", Id::new());
    }
}

/// Encode 24 hex digits (12 bytes) into the text form.
pub fn encode(text: &str) -> Result<()> {
    let bytes = id_bytes(text)?;
    println!("{}", codec::encode(&bytes));
    Ok(())
}

/// Decode the text form and show its bytes and embedded creation time.
pub fn decode(text: &str) -> Result<()> {
    let bytes = codec::decode(text).with_context(|| format!("cannot decode {text:?}"))?;
    let id = Id::from_bytes(bytes);

    println!("Id:         {id}");
    println!("Bytes:      {}", hex::encode(bytes));
    println!("Created:    {}", id.timestamp().to_rfc3339());
    if !Id::is_canonical(text) {
        println!("Note:       non-canonical text form; canonical is {id}");
    }
    Ok(())
}

fn id_bytes(text: &str) -> Result<[u8; ID_BYTES]> {
    let bytes = hex::decode(text.trim()).with_context(|| format!("invalid hex {text:?}"))?;
    <[u8; ID_BYTES]>::try_from(bytes.as_slice())
        .map_err(|_| anyhow!("expected {} bytes, got {}", ID_BYTES, bytes.len()))
}
