use super::BYTE_NOT_SPECIFIED;
use crate::error::{CosemError, CosemResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 4-byte COSEM time: hour, minute, second, hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosemTime {
    octets: [u8; 4],
}

impl CosemTime {
    pub const LENGTH: usize = 4;

    pub fn new(hour: u8, minute: u8, second: u8) -> CosemResult<Self> {
        Self::with_hundredths(hour, minute, second, BYTE_NOT_SPECIFIED)
    }

    pub fn with_hundredths(hour: u8, minute: u8, second: u8, hundredths: u8) -> CosemResult<Self> {
        verify(hour, "hour", 23)?;
        verify(minute, "minute", 59)?;
        verify(second, "second", 59)?;
        verify(hundredths, "hundredths", 99)?;
        Ok(Self {
            octets: [hour, minute, second, hundredths],
        })
    }

    /// A time with every field unspecified.
    pub fn wildcard() -> Self {
        Self { octets: [0xFF; 4] }
    }

    pub fn decode(octets: &[u8]) -> CosemResult<Self> {
        let octets: [u8; 4] = octets.try_into().map_err(|_| {
            CosemError::Decode(format!("time needs {} bytes, got {}", Self::LENGTH, octets.len()))
        })?;
        Ok(Self { octets })
    }

    pub fn encode(&self) -> [u8; 4] {
        self.octets
    }

    pub fn hour(&self) -> Option<u8> {
        field(self.octets[0])
    }

    pub fn minute(&self) -> Option<u8> {
        field(self.octets[1])
    }

    pub fn second(&self) -> Option<u8> {
        field(self.octets[2])
    }

    pub fn hundredths(&self) -> Option<u8> {
        field(self.octets[3])
    }

    pub fn is_fully_specified(&self) -> bool {
        self.hour().is_some() && self.minute().is_some() && self.second().is_some()
    }

    pub(crate) fn sort_key(&self) -> (u8, u8, u8, u8) {
        (
            self.hour().unwrap_or(0),
            self.minute().unwrap_or(0),
            self.second().unwrap_or(0),
            self.hundredths().unwrap_or(0),
        )
    }
}

fn field(raw: u8) -> Option<u8> {
    if raw == BYTE_NOT_SPECIFIED {
        None
    } else {
        Some(raw)
    }
}

fn verify(value: u8, name: &str, max: u8) -> CosemResult<()> {
    if value > max && value != BYTE_NOT_SPECIFIED {
        return Err(CosemError::InvalidData(format!(
            "{name} {value} out of range [0, {max}]"
        )));
    }
    Ok(())
}

impl fmt::Display for CosemTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hour(), self.minute(), self.second()) {
            (Some(h), Some(m), Some(s)) => write!(f, "{h:02}:{m:02}:{s:02}"),
            _ => write!(f, "xx:xx:xx"),
        }
    }
}
