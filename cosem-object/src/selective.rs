//! Selective access: the selector qualifying a Get on a multi-row
//! attribute, restricting which rows come back.

use crate::descriptor::CaptureObjectDefinition;
use cosem_core::{CosemDateTime, CosemError, CosemResult, Value};

/// A decoded access selection for Profile Generic's buffer attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectiveAccess {
    /// Selector 1: rows whose timestamp column lies in `[from, to]`
    /// inclusive. `restricting` names the column the range applies to.
    Range {
        restricting: CaptureObjectDefinition,
        from: CosemDateTime,
        to: CosemDateTime,
    },
    /// Selector 2: up to `count` rows starting at the 0-based entry
    /// `start`, clamped at the buffer end.
    Entry { start: u32, count: u32 },
}

impl SelectiveAccess {
    pub fn selector(&self) -> u8 {
        match self {
            SelectiveAccess::Range { .. } => 1,
            SelectiveAccess::Entry { .. } => 2,
        }
    }

    /// Decode from the wire pair (selector byte, parameter value).
    pub fn from_parameters(selector: u8, parameters: &Value) -> CosemResult<Self> {
        match selector {
            1 => {
                let fields = parameters
                    .as_structure()
                    .map_err(|e| CosemError::Decode(e.to_string()))?;
                if fields.len() != 3 {
                    return Err(CosemError::Decode(format!(
                        "range descriptor needs 3 elements, got {}",
                        fields.len()
                    )));
                }
                Ok(SelectiveAccess::Range {
                    restricting: CaptureObjectDefinition::from_value(&fields[0])
                        .map_err(|e| CosemError::Decode(e.to_string()))?,
                    from: date_time_of(&fields[1])?,
                    to: date_time_of(&fields[2])?,
                })
            }
            2 => {
                let fields = parameters
                    .as_structure()
                    .map_err(|e| CosemError::Decode(e.to_string()))?;
                if fields.len() != 2 {
                    return Err(CosemError::Decode(format!(
                        "entry descriptor needs 2 elements, got {}",
                        fields.len()
                    )));
                }
                Ok(SelectiveAccess::Entry {
                    start: fields[0]
                        .as_u32()
                        .map_err(|e| CosemError::Decode(e.to_string()))?,
                    count: fields[1]
                        .as_u32()
                        .map_err(|e| CosemError::Decode(e.to_string()))?,
                })
            }
            other => Err(CosemError::Decode(format!(
                "unknown access selector {other}"
            ))),
        }
    }

    /// The wire parameter value matching [`SelectiveAccess::selector`].
    pub fn to_parameters(&self) -> Value {
        match self {
            SelectiveAccess::Range {
                restricting,
                from,
                to,
            } => Value::Structure(vec![
                restricting.to_value(),
                Value::OctetString(from.encode().to_vec()),
                Value::OctetString(to.encode().to_vec()),
            ]),
            SelectiveAccess::Entry { start, count } => Value::Structure(vec![
                Value::Unsigned32(*start),
                Value::Unsigned32(*count),
            ]),
        }
    }
}

fn date_time_of(value: &Value) -> CosemResult<CosemDateTime> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::OctetString(bytes) => CosemDateTime::decode(bytes),
        other => Err(CosemError::Decode(format!(
            "expected a date-time, got {:?}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosem_core::ObisCode;

    #[test]
    fn entry_selector_round_trip() {
        let access = SelectiveAccess::Entry {
            start: 100,
            count: 50,
        };
        let decoded =
            SelectiveAccess::from_parameters(access.selector(), &access.to_parameters()).unwrap();
        assert_eq!(decoded, access);
    }

    #[test]
    fn range_selector_round_trip() {
        let access = SelectiveAccess::Range {
            restricting: CaptureObjectDefinition::new(8, ObisCode::new(0, 0, 1, 0, 0, 255), 2),
            from: CosemDateTime::new(2026, 8, 1, 0, 0, 0, 0, &[]).unwrap(),
            to: CosemDateTime::new(2026, 8, 8, 0, 0, 0, 0, &[]).unwrap(),
        };
        let decoded =
            SelectiveAccess::from_parameters(access.selector(), &access.to_parameters()).unwrap();
        assert_eq!(decoded, access);
    }

    #[test]
    fn malformed_parameters_are_decode_errors() {
        assert!(matches!(
            SelectiveAccess::from_parameters(3, &Value::Null),
            Err(CosemError::Decode(_))
        ));
        assert!(matches!(
            SelectiveAccess::from_parameters(2, &Value::Structure(vec![Value::Unsigned32(1)])),
            Err(CosemError::Decode(_))
        ));
        assert!(matches!(
            SelectiveAccess::from_parameters(1, &Value::Unsigned8(0)),
            Err(CosemError::Decode(_))
        ));
    }
}
