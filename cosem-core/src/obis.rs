//! OBIS (Object Identification System) codes.
//!
//! An OBIS code is the 6-byte logical name of a COSEM object, written as
//! six dot-separated decimals ("1.0.1.8.0.255") or in the reduced meter
//! notation ("1-0:1.8.0*255").

use crate::error::{CosemError, CosemResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// 6-byte logical name identifying a COSEM object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObisCode {
    bytes: [u8; 6],
}

fn extended_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // "A-B:C.D.E" with an optional "*F" billing-period suffix.
        Regex::new(r"^(\d{1,3})-(\d{1,3}):(\d{1,3})\.(\d{1,3})\.(\d{1,3})(?:\*(\d{1,3}))?$")
            .expect("obis pattern")
    })
}

impl ObisCode {
    pub fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            bytes: [a, b, c, d, e, f],
        }
    }

    /// Build a logical name from raw bytes, which must be exactly 6 long.
    pub fn from_bytes(bytes: &[u8]) -> CosemResult<Self> {
        let bytes: [u8; 6] = bytes.try_into().map_err(|_| {
            CosemError::InvalidLogicalName(format!("expected 6 bytes, got {}", bytes.len()))
        })?;
        Ok(Self { bytes })
    }

    /// Parse a logical name from its text form.
    ///
    /// Accepts the dot form "a.b.c.d.e.f" and the reduced form
    /// "a-b:c.d.e" / "a-b:c.d.e*f" (a missing F group defaults to 255).
    pub fn parse(s: &str) -> CosemResult<Self> {
        if let Some(caps) = extended_format().captures(s) {
            let mut bytes = [0u8; 6];
            for (i, slot) in bytes.iter_mut().enumerate().take(5) {
                *slot = caps[i + 1].parse::<u8>().map_err(|_| {
                    CosemError::InvalidLogicalName(format!("group out of range in {s:?}"))
                })?;
            }
            bytes[5] = match caps.get(6) {
                Some(f) => f.as_str().parse::<u8>().map_err(|_| {
                    CosemError::InvalidLogicalName(format!("group out of range in {s:?}"))
                })?,
                None => 255,
            };
            return Ok(Self { bytes });
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 6 {
            return Err(CosemError::InvalidLogicalName(format!(
                "expected 6 dot-separated groups, got {} in {s:?}",
                parts.len()
            )));
        }
        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            *slot = part.parse::<u8>().map_err(|_| {
                CosemError::InvalidLogicalName(format!("group {part:?} is not a byte in {s:?}"))
            })?;
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    pub fn to_bytes(self) -> [u8; 6] {
        self.bytes
    }

    pub fn a(&self) -> u8 {
        self.bytes[0]
    }

    pub fn b(&self) -> u8 {
        self.bytes[1]
    }

    pub fn c(&self) -> u8 {
        self.bytes[2]
    }

    pub fn d(&self) -> u8 {
        self.bytes[3]
    }

    pub fn e(&self) -> u8 {
        self.bytes[4]
    }

    pub fn f(&self) -> u8 {
        self.bytes[5]
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

impl FromStr for ObisCode {
    type Err = CosemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_form_round_trips() {
        let code = ObisCode::parse("1.0.99.1.0.255").unwrap();
        assert_eq!(code, ObisCode::new(1, 0, 99, 1, 0, 255));
        assert_eq!(code.to_string(), "1.0.99.1.0.255");
    }

    #[test]
    fn reduced_form() {
        let code = ObisCode::parse("1-0:1.8.0*255").unwrap();
        assert_eq!(code, ObisCode::new(1, 0, 1, 8, 0, 255));
        // A missing billing-period group defaults to 255.
        let code = ObisCode::parse("0-0:1.0.0").unwrap();
        assert_eq!(code, ObisCode::new(0, 0, 1, 0, 0, 255));
    }

    #[test]
    fn wrong_group_count_is_rejected() {
        assert!(matches!(
            ObisCode::parse("1.0.1.8.0"),
            Err(CosemError::InvalidLogicalName(_))
        ));
        assert!(matches!(
            ObisCode::parse("1.0.1.8.0.255.0"),
            Err(CosemError::InvalidLogicalName(_))
        ));
    }

    #[test]
    fn from_bytes_requires_six() {
        assert!(ObisCode::from_bytes(&[1, 2, 3, 4, 5]).is_err());
        let code = ObisCode::from_bytes(&[1, 0, 1, 8, 0, 255]).unwrap();
        assert_eq!(code.f(), 255);
    }

    #[test]
    fn out_of_range_group() {
        assert!(ObisCode::parse("256.0.1.8.0.255").is_err());
    }
}
