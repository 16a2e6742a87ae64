use crate::tags::DataTag;
use bytes::{BufMut, BytesMut};
use cosem_core::{CosemDate, CosemDateTime, CosemError, CosemResult, CosemTime, Value, ValueKind};

/// A-XDR encoder writing into a growable byte buffer.
pub struct Encoder {
    buffer: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Encode a value under its own runtime type.
    pub fn write_value(&mut self, value: &Value) -> CosemResult<()> {
        match value {
            Value::Null => self.write_tag(DataTag::NullData),
            Value::Boolean(b) => {
                self.write_tag(DataTag::Boolean);
                self.buffer.put_u8(if *b { 0xFF } else { 0x00 });
            }
            Value::Integer8(v) => {
                self.write_tag(DataTag::Integer);
                self.buffer.put_i8(*v);
            }
            Value::Integer16(v) => {
                self.write_tag(DataTag::Long);
                self.buffer.put_i16(*v);
            }
            Value::Integer32(v) => {
                self.write_tag(DataTag::DoubleLong);
                self.buffer.put_i32(*v);
            }
            Value::Integer64(v) => {
                self.write_tag(DataTag::Long64);
                self.buffer.put_i64(*v);
            }
            Value::Unsigned8(v) => {
                self.write_tag(DataTag::Unsigned);
                self.buffer.put_u8(*v);
            }
            Value::Unsigned16(v) => {
                self.write_tag(DataTag::LongUnsigned);
                self.buffer.put_u16(*v);
            }
            Value::Unsigned32(v) => {
                self.write_tag(DataTag::DoubleLongUnsigned);
                self.buffer.put_u32(*v);
            }
            Value::Unsigned64(v) => {
                self.write_tag(DataTag::Long64Unsigned);
                self.buffer.put_u64(*v);
            }
            Value::Float32(v) => {
                self.write_tag(DataTag::Float32);
                self.buffer.put_u32(v.to_bits());
            }
            Value::Float64(v) => {
                self.write_tag(DataTag::Float64);
                self.buffer.put_u64(v.to_bits());
            }
            Value::Enum(v) => {
                self.write_tag(DataTag::Enum);
                self.buffer.put_u8(*v);
            }
            Value::Bcd(v) => {
                self.write_tag(DataTag::Bcd);
                self.buffer.put_u8(*v);
            }
            Value::OctetString(bytes) => {
                self.write_tag(DataTag::OctetString);
                self.write_length(bytes.len());
                self.buffer.put_slice(bytes);
            }
            Value::VisibleString(bytes) => {
                self.write_tag(DataTag::VisibleString);
                self.write_length(bytes.len());
                self.buffer.put_slice(bytes);
            }
            Value::Utf8String(bytes) => {
                self.write_tag(DataTag::Utf8String);
                self.write_length(bytes.len());
                self.buffer.put_slice(bytes);
            }
            Value::BitString(bits) => {
                self.write_tag(DataTag::BitString);
                // The length counts bits, not bytes.
                self.write_length(bits.bit_count());
                self.buffer.put_slice(bits.as_bytes());
            }
            Value::Array(items) => {
                self.write_tag(DataTag::Array);
                self.write_length(items.len());
                for item in items {
                    self.write_value(item)?;
                }
            }
            Value::Structure(items) => {
                self.write_tag(DataTag::Structure);
                self.write_length(items.len());
                for item in items {
                    self.write_value(item)?;
                }
            }
            Value::Date(date) => {
                self.write_tag(DataTag::Date);
                self.buffer.put_slice(&date.encode());
            }
            Value::Time(time) => {
                self.write_tag(DataTag::Time);
                self.buffer.put_slice(&time.encode());
            }
            Value::DateTime(dt) => {
                self.write_tag(DataTag::DateTime);
                self.buffer.put_slice(&dt.encode());
            }
        }
        Ok(())
    }

    /// Encode a value under a declared type.
    ///
    /// Where the declared kind and the runtime kind differ the following
    /// coercions apply; anything else is an encode error:
    /// - `DontCare` declared: encode as the runtime value;
    /// - calendar value declared OCTET_STRING: its raw bytes as a string;
    /// - octet string of calendar length declared DATETIME/DATE/TIME:
    ///   re-tagged as the calendar type;
    /// - integral value declared as another integral kind: range-checked
    ///   conversion.
    pub fn write_value_as(&mut self, value: &Value, declared: ValueKind) -> CosemResult<()> {
        if declared == ValueKind::DontCare || declared == value.kind() {
            return self.write_value(value);
        }
        match (declared, value) {
            (ValueKind::OctetString, Value::DateTime(dt)) => {
                self.write_value(&Value::OctetString(dt.encode().to_vec()))
            }
            (ValueKind::OctetString, Value::Date(d)) => {
                self.write_value(&Value::OctetString(d.encode().to_vec()))
            }
            (ValueKind::OctetString, Value::Time(t)) => {
                self.write_value(&Value::OctetString(t.encode().to_vec()))
            }
            (ValueKind::DateTime, Value::OctetString(bytes)) => {
                self.write_value(&Value::DateTime(CosemDateTime::decode(bytes)?))
            }
            (ValueKind::Date, Value::OctetString(bytes)) => {
                self.write_value(&Value::Date(CosemDate::decode(bytes)?))
            }
            (ValueKind::Time, Value::OctetString(bytes)) => {
                self.write_value(&Value::Time(CosemTime::decode(bytes)?))
            }
            (declared, value) if declared.is_numeric() && value.is_numeric() => {
                let wide = value.to_i64()?;
                self.write_value(&narrow(wide, declared)?)
            }
            (declared, value) => Err(CosemError::Encode(format!(
                "cannot encode {:?} under declared type {declared:?}",
                value.kind()
            ))),
        }
    }

    pub fn write_tag(&mut self, tag: DataTag) {
        self.buffer.put_u8(tag.to_byte());
    }

    /// A-XDR length/count: one byte below 0x80, otherwise 0x80 | n followed
    /// by n big-endian length bytes.
    pub fn write_length(&mut self, length: usize) {
        if length < 0x80 {
            self.buffer.put_u8(length as u8);
        } else {
            let bytes = length.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            self.buffer.put_u8(0x80 | (bytes.len() - skip) as u8);
            self.buffer.put_slice(&bytes[skip..]);
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32(value);
    }

    pub fn write_octets(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

fn narrow(value: i64, kind: ValueKind) -> CosemResult<Value> {
    let out_of_range = || CosemError::Encode(format!("{value} out of range for {kind:?}"));
    Ok(match kind {
        ValueKind::Integer8 => Value::Integer8(i8::try_from(value).map_err(|_| out_of_range())?),
        ValueKind::Integer16 => Value::Integer16(i16::try_from(value).map_err(|_| out_of_range())?),
        ValueKind::Integer32 => Value::Integer32(i32::try_from(value).map_err(|_| out_of_range())?),
        ValueKind::Integer64 => Value::Integer64(value),
        ValueKind::Unsigned8 => Value::Unsigned8(u8::try_from(value).map_err(|_| out_of_range())?),
        ValueKind::Unsigned16 => {
            Value::Unsigned16(u16::try_from(value).map_err(|_| out_of_range())?)
        }
        ValueKind::Unsigned32 => {
            Value::Unsigned32(u32::try_from(value).map_err(|_| out_of_range())?)
        }
        ValueKind::Unsigned64 => {
            Value::Unsigned64(u64::try_from(value).map_err(|_| out_of_range())?)
        }
        ValueKind::Enum => Value::Enum(u8::try_from(value).map_err(|_| out_of_range())?),
        ValueKind::Bcd => Value::Bcd(u8::try_from(value).map_err(|_| out_of_range())?),
        other => return Err(CosemError::Encode(format!("{other:?} is not integral"))),
    })
}
