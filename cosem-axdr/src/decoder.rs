use crate::tags::DataTag;
use cosem_core::{
    BitString, CosemDate, CosemDateTime, CosemError, CosemResult, CosemTime, Value, ValueKind,
};

/// A-XDR decoder: a cursor over a byte slice.
///
/// All failures (unknown tag, truncated payload, oversized count) are
/// [`CosemError::Decode`]; a malformed buffer never decodes to a default.
pub struct Decoder<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Decode one value, advancing the cursor past it.
    pub fn read_value(&mut self) -> CosemResult<Value> {
        let tag = DataTag::from_byte(self.read_u8()?)?;
        match tag {
            DataTag::NullData | DataTag::DontCare => Ok(Value::Null),
            DataTag::Boolean => Ok(Value::Boolean(self.read_u8()? != 0)),
            DataTag::Integer => Ok(Value::Integer8(self.read_u8()? as i8)),
            DataTag::Long => Ok(Value::Integer16(i16::from_be_bytes(self.read_fixed()?))),
            DataTag::DoubleLong => Ok(Value::Integer32(i32::from_be_bytes(self.read_fixed()?))),
            DataTag::Long64 => Ok(Value::Integer64(i64::from_be_bytes(self.read_fixed()?))),
            DataTag::Unsigned => Ok(Value::Unsigned8(self.read_u8()?)),
            DataTag::LongUnsigned => Ok(Value::Unsigned16(u16::from_be_bytes(self.read_fixed()?))),
            DataTag::DoubleLongUnsigned => {
                Ok(Value::Unsigned32(u32::from_be_bytes(self.read_fixed()?)))
            }
            DataTag::Long64Unsigned => {
                Ok(Value::Unsigned64(u64::from_be_bytes(self.read_fixed()?)))
            }
            DataTag::Float32 => Ok(Value::Float32(f32::from_bits(u32::from_be_bytes(
                self.read_fixed()?,
            )))),
            DataTag::Float64 => Ok(Value::Float64(f64::from_bits(u64::from_be_bytes(
                self.read_fixed()?,
            )))),
            DataTag::Enum => Ok(Value::Enum(self.read_u8()?)),
            DataTag::Bcd => Ok(Value::Bcd(self.read_u8()?)),
            DataTag::OctetString => {
                let length = self.read_length()?;
                Ok(Value::OctetString(self.read_bytes(length)?.to_vec()))
            }
            DataTag::VisibleString => {
                let length = self.read_length()?;
                Ok(Value::VisibleString(self.read_bytes(length)?.to_vec()))
            }
            DataTag::Utf8String => {
                let length = self.read_length()?;
                Ok(Value::Utf8String(self.read_bytes(length)?.to_vec()))
            }
            DataTag::BitString => {
                let bit_count = self.read_length()?;
                let bytes = self.read_bytes(bit_count.div_ceil(8))?.to_vec();
                BitString::new(bytes, bit_count)
                    .map(Value::BitString)
                    .map_err(|e| CosemError::Decode(e.to_string()))
            }
            DataTag::Array => {
                let count = self.read_length()?;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.read_value()?);
                }
                Value::array(items).map_err(|e| CosemError::Decode(e.to_string()))
            }
            DataTag::Structure => {
                let count = self.read_length()?;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.read_value()?);
                }
                Ok(Value::Structure(items))
            }
            DataTag::Date => {
                let bytes = self.read_bytes(CosemDate::LENGTH)?;
                Ok(Value::Date(CosemDate::decode(bytes)?))
            }
            DataTag::Time => {
                let bytes = self.read_bytes(CosemTime::LENGTH)?;
                Ok(Value::Time(CosemTime::decode(bytes)?))
            }
            DataTag::DateTime => {
                let bytes = self.read_bytes(CosemDateTime::LENGTH)?;
                Ok(Value::DateTime(CosemDateTime::decode(bytes)?))
            }
            DataTag::CompactArray => Err(CosemError::Decode(
                "compact-array values are not supported".into(),
            )),
        }
    }

    /// Decode one value under a type hint. An octet string of calendar
    /// length is re-shaped when the hint names a calendar type; any other
    /// kind mismatch is a decode error. `DontCare` accepts anything.
    pub fn read_value_expecting(&mut self, expected: ValueKind) -> CosemResult<Value> {
        let value = self.read_value()?;
        if expected == ValueKind::DontCare || value.kind() == expected || value.is_null() {
            return Ok(value);
        }
        match (expected, &value) {
            (ValueKind::DateTime, Value::OctetString(bytes)) => {
                Ok(Value::DateTime(CosemDateTime::decode(bytes)?))
            }
            (ValueKind::Date, Value::OctetString(bytes)) => {
                Ok(Value::Date(CosemDate::decode(bytes)?))
            }
            (ValueKind::Time, Value::OctetString(bytes)) => {
                Ok(Value::Time(CosemTime::decode(bytes)?))
            }
            _ => Err(CosemError::Decode(format!(
                "expected a {expected:?} value, decoded {:?}",
                value.kind()
            ))),
        }
    }

    pub fn read_u8(&mut self) -> CosemResult<u8> {
        let byte = *self
            .buffer
            .get(self.position)
            .ok_or_else(|| CosemError::Decode("unexpected end of input".into()))?;
        self.position += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> CosemResult<u16> {
        Ok(u16::from_be_bytes(self.read_fixed()?))
    }

    pub fn read_u32(&mut self) -> CosemResult<u32> {
        Ok(u32::from_be_bytes(self.read_fixed()?))
    }

    /// A-XDR length/count, short or long form.
    pub fn read_length(&mut self) -> CosemResult<usize> {
        let first = self.read_u8()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        let width = (first & 0x7F) as usize;
        if width == 0 || width > 4 {
            return Err(CosemError::Decode(format!(
                "invalid length-of-length {width}"
            )));
        }
        let mut length = 0usize;
        for _ in 0..width {
            length = (length << 8) | self.read_u8()? as usize;
        }
        Ok(length)
    }

    pub fn read_bytes(&mut self, count: usize) -> CosemResult<&'a [u8]> {
        if self.remaining() < count {
            return Err(CosemError::Decode(format!(
                "need {count} bytes, {} remain",
                self.remaining()
            )));
        }
        let slice = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn read_fixed<const N: usize>(&mut self) -> CosemResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        bytes
            .try_into()
            .map_err(|_| CosemError::Decode("fixed-width read failed".into()))
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosem_core::ClockStatus;

    fn round_trip(value: Value) {
        let bytes = crate::encode(&value).unwrap();
        let (decoded, consumed) = crate::decode(&bytes).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn round_trip_boundary_values() {
        round_trip(Value::Null);
        round_trip(Value::Boolean(false));
        round_trip(Value::Boolean(true));
        round_trip(Value::Integer8(i8::MIN));
        round_trip(Value::Integer8(i8::MAX));
        round_trip(Value::Integer16(i16::MIN));
        round_trip(Value::Integer16(i16::MAX));
        round_trip(Value::Integer32(i32::MIN));
        round_trip(Value::Integer32(i32::MAX));
        round_trip(Value::Integer64(i64::MIN));
        round_trip(Value::Integer64(i64::MAX));
        round_trip(Value::Unsigned8(0));
        round_trip(Value::Unsigned8(u8::MAX));
        round_trip(Value::Unsigned16(u16::MAX));
        round_trip(Value::Unsigned32(u32::MAX));
        round_trip(Value::Unsigned64(u64::MAX));
        round_trip(Value::Float32(f32::MIN_POSITIVE));
        round_trip(Value::Float64(-0.0));
        round_trip(Value::Enum(255));
        round_trip(Value::Bcd(0x99));
        round_trip(Value::OctetString(vec![]));
        round_trip(Value::OctetString(vec![0xAB; 300]));
        round_trip(Value::VisibleString(b"total energy".to_vec()));
        round_trip(Value::Utf8String("kWh".as_bytes().to_vec()));
        round_trip(Value::BitString(BitString::new(vec![0b1010_0000], 3).unwrap()));
    }

    #[test]
    fn round_trip_calendar_values() {
        round_trip(Value::Date(CosemDate::new(2026, 8, 8).unwrap()));
        round_trip(Value::Time(CosemTime::new(23, 59, 59).unwrap()));
        round_trip(Value::DateTime(
            CosemDateTime::new(2026, 8, 8, 14, 30, 0, 60, &[ClockStatus::DaylightSavingActive])
                .unwrap(),
        ));
        // All-fields-skipped date-time keeps its skip flags.
        round_trip(Value::DateTime(CosemDateTime::wildcard()));
    }

    #[test]
    fn nested_array_of_structures() {
        let row = |n: u16| {
            Value::Structure(vec![
                Value::OctetString(vec![1, 0, 1, 8, 0, 255]),
                Value::Unsigned16(n),
                Value::Enum(30),
            ])
        };
        let array = Value::array(vec![row(1), row(2), row(3)]).unwrap();
        let bytes = crate::encode(&array).unwrap();
        assert_eq!(bytes[0], DataTag::Array.to_byte());
        assert_eq!(bytes[1], 3);
        assert_eq!(bytes[2], DataTag::Structure.to_byte());
        let (decoded, consumed) = crate::decode(&bytes).unwrap();
        assert_eq!(decoded, array);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn long_form_count_round_trips() {
        let items = (0..200).map(Value::Unsigned8).collect::<Vec<_>>();
        let array = Value::array(items).unwrap();
        let bytes = crate::encode(&array).unwrap();
        assert_eq!(&bytes[0..3], &[0x01, 0x81, 200]);
        let (decoded, _) = crate::decode(&bytes).unwrap();
        assert_eq!(decoded.as_array().unwrap().len(), 200);
    }

    #[test]
    fn truncated_input_is_a_decode_error() {
        // Unsigned32 with only two payload bytes.
        let err = crate::decode(&[0x06, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, CosemError::Decode(_)));
        // Octet string announcing more bytes than present.
        let err = crate::decode(&[0x09, 0x05, 0x01]).unwrap_err();
        assert!(matches!(err, CosemError::Decode(_)));
        // Array whose third element is missing.
        let err = crate::decode(&[0x01, 0x03, 0x11, 0x01, 0x11, 0x02]).unwrap_err();
        assert!(matches!(err, CosemError::Decode(_)));
    }

    #[test]
    fn unknown_tag_is_a_decode_error() {
        assert!(matches!(
            crate::decode(&[0x2F, 0x00]),
            Err(CosemError::Decode(_))
        ));
    }

    #[test]
    fn hinted_decode_reshapes_octets() {
        let dt = CosemDateTime::new(2026, 1, 1, 0, 0, 0, 0, &[]).unwrap();
        let bytes = crate::encode(&Value::OctetString(dt.encode().to_vec())).unwrap();
        let mut decoder = Decoder::new(&bytes);
        let value = decoder.read_value_expecting(ValueKind::DateTime).unwrap();
        assert_eq!(value, Value::DateTime(dt));

        let bytes = crate::encode(&Value::Boolean(true)).unwrap();
        let mut decoder = Decoder::new(&bytes);
        assert!(decoder.read_value_expecting(ValueKind::Unsigned32).is_err());
    }
}
