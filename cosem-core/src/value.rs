//! The typed value tree exchanged with a meter.
//!
//! Every attribute value, method parameter and profile cell is a [`Value`]:
//! a tagged variant mirroring the COSEM common data types, recursive for
//! ARRAY and STRUCTURE. The wire representation lives in the `cosem-axdr`
//! crate; this module is the in-memory model only.

use crate::bitstring::BitString;
use crate::calendar::{CosemDate, CosemDateTime, CosemTime};
use crate::error::{CosemError, CosemResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded COSEM data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer8(i8),
    Integer16(i16),
    Integer32(i32),
    Integer64(i64),
    Unsigned8(u8),
    Unsigned16(u16),
    Unsigned32(u32),
    Unsigned64(u64),
    Float32(f32),
    Float64(f64),
    Enum(u8),
    Bcd(u8),
    OctetString(Vec<u8>),
    VisibleString(Vec<u8>),
    Utf8String(Vec<u8>),
    BitString(BitString),
    Array(Vec<Value>),
    Structure(Vec<Value>),
    Date(CosemDate),
    Time(CosemTime),
    DateTime(CosemDateTime),
}

/// The kind of a [`Value`], used as the declared or display type of an
/// attribute. `DontCare` marks an undeclared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer8,
    Integer16,
    Integer32,
    Integer64,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Float32,
    Float64,
    Enum,
    Bcd,
    OctetString,
    VisibleString,
    Utf8String,
    BitString,
    Array,
    Structure,
    Date,
    Time,
    DateTime,
    DontCare,
}

impl ValueKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Integer8
                | ValueKind::Integer16
                | ValueKind::Integer32
                | ValueKind::Integer64
                | ValueKind::Unsigned8
                | ValueKind::Unsigned16
                | ValueKind::Unsigned32
                | ValueKind::Unsigned64
                | ValueKind::Float32
                | ValueKind::Float64
                | ValueKind::Enum
                | ValueKind::Bcd
        )
    }

    /// Infer a concrete kind from a runtime value. Used where a column or
    /// attribute type was never declared and the first encode must pick one.
    pub fn infer_from(value: &Value) -> ValueKind {
        value.kind()
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer8(_) => ValueKind::Integer8,
            Value::Integer16(_) => ValueKind::Integer16,
            Value::Integer32(_) => ValueKind::Integer32,
            Value::Integer64(_) => ValueKind::Integer64,
            Value::Unsigned8(_) => ValueKind::Unsigned8,
            Value::Unsigned16(_) => ValueKind::Unsigned16,
            Value::Unsigned32(_) => ValueKind::Unsigned32,
            Value::Unsigned64(_) => ValueKind::Unsigned64,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::Enum(_) => ValueKind::Enum,
            Value::Bcd(_) => ValueKind::Bcd,
            Value::OctetString(_) => ValueKind::OctetString,
            Value::VisibleString(_) => ValueKind::VisibleString,
            Value::Utf8String(_) => ValueKind::Utf8String,
            Value::BitString(_) => ValueKind::BitString,
            Value::Array(_) => ValueKind::Array,
            Value::Structure(_) => ValueKind::Structure,
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Build an array value, enforcing that all elements share one kind.
    pub fn array(elements: Vec<Value>) -> CosemResult<Self> {
        if let Some(first) = elements.first() {
            let kind = first.kind();
            for (i, element) in elements.iter().enumerate() {
                if element.kind() != kind {
                    return Err(CosemError::InvalidData(format!(
                        "array of {kind:?} holds {:?} at index {i}",
                        element.kind()
                    )));
                }
            }
        }
        Ok(Value::Array(elements))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    pub fn as_bool(&self) -> CosemResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(type_mismatch("Boolean", other)),
        }
    }

    pub fn as_i8(&self) -> CosemResult<i8> {
        match self {
            Value::Integer8(v) => Ok(*v),
            other => Err(type_mismatch("Integer8", other)),
        }
    }

    pub fn as_i16(&self) -> CosemResult<i16> {
        match self {
            Value::Integer16(v) => Ok(*v),
            other => Err(type_mismatch("Integer16", other)),
        }
    }

    pub fn as_u8(&self) -> CosemResult<u8> {
        match self {
            Value::Unsigned8(v) | Value::Enum(v) => Ok(*v),
            other => Err(type_mismatch("Unsigned8", other)),
        }
    }

    pub fn as_u16(&self) -> CosemResult<u16> {
        match self {
            Value::Unsigned16(v) => Ok(*v),
            other => Err(type_mismatch("Unsigned16", other)),
        }
    }

    pub fn as_u32(&self) -> CosemResult<u32> {
        match self {
            Value::Unsigned32(v) => Ok(*v),
            other => Err(type_mismatch("Unsigned32", other)),
        }
    }

    pub fn as_octets(&self) -> CosemResult<&[u8]> {
        match self {
            Value::OctetString(v) => Ok(v),
            other => Err(type_mismatch("OctetString", other)),
        }
    }

    pub fn as_array(&self) -> CosemResult<&[Value]> {
        match self {
            Value::Array(v) => Ok(v),
            other => Err(type_mismatch("Array", other)),
        }
    }

    pub fn as_structure(&self) -> CosemResult<&[Value]> {
        match self {
            Value::Structure(v) => Ok(v),
            other => Err(type_mismatch("Structure", other)),
        }
    }

    pub fn as_date_time(&self) -> CosemResult<&CosemDateTime> {
        match self {
            Value::DateTime(v) => Ok(v),
            other => Err(type_mismatch("DateTime", other)),
        }
    }

    /// The value as a signed 64-bit integer, accepting any integral kind.
    pub fn to_i64(&self) -> CosemResult<i64> {
        match self {
            Value::Integer8(v) => Ok(*v as i64),
            Value::Integer16(v) => Ok(*v as i64),
            Value::Integer32(v) => Ok(*v as i64),
            Value::Integer64(v) => Ok(*v),
            Value::Unsigned8(v) | Value::Enum(v) | Value::Bcd(v) => Ok(*v as i64),
            Value::Unsigned16(v) => Ok(*v as i64),
            Value::Unsigned32(v) => Ok(*v as i64),
            Value::Unsigned64(v) => i64::try_from(*v)
                .map_err(|_| CosemError::InvalidData(format!("{v} exceeds i64 range"))),
            other => Err(type_mismatch("integral value", other)),
        }
    }
}

fn type_mismatch(expected: &str, got: &Value) -> CosemError {
    CosemError::InvalidData(format!("expected {expected}, got {:?}", got.kind()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer8(v) => write!(f, "{v}"),
            Value::Integer16(v) => write!(f, "{v}"),
            Value::Integer32(v) => write!(f, "{v}"),
            Value::Integer64(v) => write!(f, "{v}"),
            Value::Unsigned8(v) => write!(f, "{v}"),
            Value::Unsigned16(v) => write!(f, "{v}"),
            Value::Unsigned32(v) => write!(f, "{v}"),
            Value::Unsigned64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Enum(v) => write!(f, "enum({v})"),
            Value::Bcd(v) => write!(f, "bcd({v:#04x})"),
            Value::OctetString(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            Value::VisibleString(s) | Value::Utf8String(s) => {
                write!(f, "{}", String::from_utf8_lossy(s))
            }
            Value::BitString(bits) => write!(f, "{bits}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Structure(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Value::Unsigned32(7).kind(), ValueKind::Unsigned32);
        assert_eq!(Value::Structure(vec![]).kind(), ValueKind::Structure);
        assert!(Value::Enum(3).is_numeric());
        assert!(!Value::OctetString(vec![]).is_numeric());
    }

    #[test]
    fn homogeneous_array_enforced() {
        let ok = Value::array(vec![Value::Unsigned16(1), Value::Unsigned16(2)]);
        assert!(ok.is_ok());
        let bad = Value::array(vec![Value::Unsigned16(1), Value::Boolean(true)]);
        assert!(bad.is_err());
    }

    #[test]
    fn accessor_mismatch_is_typed_error() {
        let err = Value::Boolean(true).as_u32().unwrap_err();
        assert!(matches!(err, CosemError::InvalidData(_)));
    }

    #[test]
    fn to_i64_widens_integrals() {
        assert_eq!(Value::Integer8(-3).to_i64().unwrap(), -3);
        assert_eq!(Value::Unsigned32(70000).to_i64().unwrap(), 70000);
        assert!(Value::Unsigned64(u64::MAX).to_i64().is_err());
        assert!(Value::OctetString(vec![]).to_i64().is_err());
    }
}
