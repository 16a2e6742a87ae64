//! The IEC 62056-6-2 common-data-type tag table.

use cosem_core::{CosemError, CosemResult, ValueKind};

/// Wire tag identifying the type of an encoded value. The numeric codes
/// must stay byte-exact for interoperability with real meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataTag {
    NullData = 0x00,
    Array = 0x01,
    Structure = 0x02,
    Boolean = 0x03,
    BitString = 0x04,
    DoubleLong = 0x05,
    DoubleLongUnsigned = 0x06,
    OctetString = 0x09,
    VisibleString = 0x0A,
    Utf8String = 0x0C,
    Bcd = 0x0D,
    Integer = 0x0F,
    Long = 0x10,
    Unsigned = 0x11,
    LongUnsigned = 0x12,
    CompactArray = 0x13,
    Long64 = 0x14,
    Long64Unsigned = 0x15,
    Enum = 0x16,
    Float32 = 0x17,
    Float64 = 0x18,
    DateTime = 0x19,
    Date = 0x1A,
    Time = 0x1B,
    DontCare = 0xFF,
}

impl DataTag {
    pub fn from_byte(byte: u8) -> CosemResult<Self> {
        Ok(match byte {
            0x00 => DataTag::NullData,
            0x01 => DataTag::Array,
            0x02 => DataTag::Structure,
            0x03 => DataTag::Boolean,
            0x04 => DataTag::BitString,
            0x05 => DataTag::DoubleLong,
            0x06 => DataTag::DoubleLongUnsigned,
            0x09 => DataTag::OctetString,
            0x0A => DataTag::VisibleString,
            0x0C => DataTag::Utf8String,
            0x0D => DataTag::Bcd,
            0x0F => DataTag::Integer,
            0x10 => DataTag::Long,
            0x11 => DataTag::Unsigned,
            0x12 => DataTag::LongUnsigned,
            0x13 => DataTag::CompactArray,
            0x14 => DataTag::Long64,
            0x15 => DataTag::Long64Unsigned,
            0x16 => DataTag::Enum,
            0x17 => DataTag::Float32,
            0x18 => DataTag::Float64,
            0x19 => DataTag::DateTime,
            0x1A => DataTag::Date,
            0x1B => DataTag::Time,
            0xFF => DataTag::DontCare,
            other => {
                return Err(CosemError::Decode(format!("unknown data tag {other:#04x}")));
            }
        })
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// The tag a value of the given kind encodes under.
    pub fn for_kind(kind: ValueKind) -> DataTag {
        match kind {
            ValueKind::Null => DataTag::NullData,
            ValueKind::Array => DataTag::Array,
            ValueKind::Structure => DataTag::Structure,
            ValueKind::Boolean => DataTag::Boolean,
            ValueKind::BitString => DataTag::BitString,
            ValueKind::Integer32 => DataTag::DoubleLong,
            ValueKind::Unsigned32 => DataTag::DoubleLongUnsigned,
            ValueKind::OctetString => DataTag::OctetString,
            ValueKind::VisibleString => DataTag::VisibleString,
            ValueKind::Utf8String => DataTag::Utf8String,
            ValueKind::Bcd => DataTag::Bcd,
            ValueKind::Integer8 => DataTag::Integer,
            ValueKind::Integer16 => DataTag::Long,
            ValueKind::Unsigned8 => DataTag::Unsigned,
            ValueKind::Unsigned16 => DataTag::LongUnsigned,
            ValueKind::Integer64 => DataTag::Long64,
            ValueKind::Unsigned64 => DataTag::Long64Unsigned,
            ValueKind::Enum => DataTag::Enum,
            ValueKind::Float32 => DataTag::Float32,
            ValueKind::Float64 => DataTag::Float64,
            ValueKind::DateTime => DataTag::DateTime,
            ValueKind::Date => DataTag::Date,
            ValueKind::Time => DataTag::Time,
            ValueKind::DontCare => DataTag::DontCare,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes_are_exact() {
        assert_eq!(DataTag::NullData.to_byte(), 0);
        assert_eq!(DataTag::Array.to_byte(), 1);
        assert_eq!(DataTag::Structure.to_byte(), 2);
        assert_eq!(DataTag::Boolean.to_byte(), 3);
        assert_eq!(DataTag::BitString.to_byte(), 4);
        assert_eq!(DataTag::DoubleLong.to_byte(), 5);
        assert_eq!(DataTag::DoubleLongUnsigned.to_byte(), 6);
        assert_eq!(DataTag::OctetString.to_byte(), 9);
        assert_eq!(DataTag::VisibleString.to_byte(), 10);
        assert_eq!(DataTag::Utf8String.to_byte(), 12);
        assert_eq!(DataTag::Integer.to_byte(), 15);
        assert_eq!(DataTag::Long.to_byte(), 16);
        assert_eq!(DataTag::Unsigned.to_byte(), 17);
        assert_eq!(DataTag::LongUnsigned.to_byte(), 18);
        assert_eq!(DataTag::Long64.to_byte(), 20);
        assert_eq!(DataTag::Long64Unsigned.to_byte(), 21);
        assert_eq!(DataTag::Enum.to_byte(), 22);
        assert_eq!(DataTag::Float32.to_byte(), 23);
        assert_eq!(DataTag::Float64.to_byte(), 24);
        assert_eq!(DataTag::DateTime.to_byte(), 25);
        assert_eq!(DataTag::Date.to_byte(), 26);
        assert_eq!(DataTag::Time.to_byte(), 27);
    }

    #[test]
    fn round_trip_through_bytes() {
        for byte in [0u8, 1, 2, 3, 4, 5, 6, 9, 10, 12, 13, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 255] {
            assert_eq!(DataTag::from_byte(byte).unwrap().to_byte(), byte);
        }
        assert!(DataTag::from_byte(0x07).is_err());
        assert!(DataTag::from_byte(0x20).is_err());
    }
}
