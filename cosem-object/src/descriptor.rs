//! Object and capture-object descriptors as exchanged inside attribute
//! values (association object list, profile capture-object list).

use cosem_core::{CosemError, CosemResult, ObisCode, Value};
use std::fmt;

/// Identifies a COSEM object: class, logical name, class version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosemObjectDescriptor {
    pub class_id: u16,
    pub logical_name: ObisCode,
    pub version: u8,
}

impl CosemObjectDescriptor {
    pub fn new(class_id: u16, logical_name: ObisCode, version: u8) -> Self {
        Self {
            class_id,
            logical_name,
            version,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Structure(vec![
            Value::Unsigned16(self.class_id),
            Value::OctetString(self.logical_name.to_bytes().to_vec()),
            Value::Unsigned8(self.version),
        ])
    }

    pub fn from_value(value: &Value) -> CosemResult<Self> {
        let fields = value.as_structure()?;
        if fields.len() != 3 {
            return Err(CosemError::InvalidData(format!(
                "object descriptor needs 3 elements, got {}",
                fields.len()
            )));
        }
        Ok(Self {
            class_id: fields[0].as_u16()?,
            logical_name: ObisCode::from_bytes(fields[1].as_octets()?)?,
            version: fields[2].as_u8()?,
        })
    }
}

impl fmt::Display for CosemObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} obis {} v{}",
            self.class_id, self.logical_name, self.version
        )
    }
}

/// One column binding of a Profile Generic: which attribute of which
/// object is sampled, and optionally which element of a structured value
/// (`data_index` 0 means the whole value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureObjectDefinition {
    pub class_id: u16,
    pub logical_name: ObisCode,
    pub attribute_index: u8,
    pub data_index: u16,
}

impl CaptureObjectDefinition {
    pub fn new(class_id: u16, logical_name: ObisCode, attribute_index: u8) -> Self {
        Self {
            class_id,
            logical_name,
            attribute_index,
            data_index: 0,
        }
    }

    pub fn with_data_index(mut self, data_index: u16) -> Self {
        self.data_index = data_index;
        self
    }

    /// The 4-element wire structure: class id (LongUnsigned), logical name
    /// (OctetString), attribute index (Integer), data index (LongUnsigned).
    pub fn to_value(&self) -> Value {
        Value::Structure(vec![
            Value::Unsigned16(self.class_id),
            Value::OctetString(self.logical_name.to_bytes().to_vec()),
            Value::Integer8(self.attribute_index as i8),
            Value::Unsigned16(self.data_index),
        ])
    }

    pub fn from_value(value: &Value) -> CosemResult<Self> {
        let fields = value.as_structure()?;
        if fields.len() != 4 {
            return Err(CosemError::InvalidData(format!(
                "capture object definition needs 4 elements, got {}",
                fields.len()
            )));
        }
        let attribute_index = fields[2].as_i8()?;
        if attribute_index < 1 {
            return Err(CosemError::InvalidData(format!(
                "capture attribute index must be >= 1, got {attribute_index}"
            )));
        }
        Ok(Self {
            class_id: fields[0].as_u16()?,
            logical_name: ObisCode::from_bytes(fields[1].as_octets()?)?,
            attribute_index: attribute_index as u8,
            data_index: fields[3].as_u16()?,
        })
    }
}

impl fmt::Display for CaptureObjectDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} attr {} data {}",
            self.class_id, self.logical_name, self.attribute_index, self.data_index
        )
    }
}
