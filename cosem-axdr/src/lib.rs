//! A-XDR codec for COSEM data values.
//!
//! Every encoded value starts with one tag byte from the IEC 62056-6-2
//! common-data-type table, followed by a payload. Containers (ARRAY,
//! STRUCTURE) carry an element count and their children recursively;
//! strings carry a byte length; numerics are fixed-width big-endian; the
//! calendar types are fixed-width without a length.

mod decoder;
mod encoder;
mod tags;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use tags::DataTag;

use cosem_core::{CosemResult, Value, ValueKind};

/// Encode a single value to its wire form.
pub fn encode(value: &Value) -> CosemResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.write_value(value)?;
    Ok(encoder.into_bytes())
}

/// Encode a value under a declared type, coercing where the declared and
/// runtime kinds legitimately differ (see [`Encoder::write_value_as`]).
pub fn encode_as(value: &Value, declared: ValueKind) -> CosemResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.write_value_as(value, declared)?;
    Ok(encoder.into_bytes())
}

/// Decode a single value, returning it together with the bytes consumed.
pub fn decode(bytes: &[u8]) -> CosemResult<(Value, usize)> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.read_value()?;
    Ok((value, decoder.position()))
}
