use super::{BYTE_NOT_SPECIFIED, YEAR_NOT_SPECIFIED};
use crate::error::{CosemError, CosemResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// Special month values.
const DST_END: u8 = 0xFD;
const DST_BEGIN: u8 = 0xFE;
// Special day-of-month values.
const SECOND_LAST_DAY: u8 = 0xFD;
const LAST_DAY: u8 = 0xFE;

/// 5-byte COSEM date: year (2), month, day of month, day of week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosemDate {
    octets: [u8; 5],
}

impl CosemDate {
    pub const LENGTH: usize = 5;

    /// Build a date. Wildcards use the sentinel values (0xFFFF year,
    /// 0xFF month/day), month also accepts the DST markers 0xFE/0xFD and
    /// day of month the last/second-last markers 0xFE/0xFD.
    pub fn new(year: u16, month: u8, day_of_month: u8) -> CosemResult<Self> {
        Self::with_day_of_week(year, month, day_of_month, BYTE_NOT_SPECIFIED)
    }

    pub fn with_day_of_week(
        year: u16,
        month: u8,
        day_of_month: u8,
        day_of_week: u8,
    ) -> CosemResult<Self> {
        verify_month(month)?;
        verify_day_of_month(day_of_month)?;
        verify_day_of_week(day_of_week)?;
        Ok(Self {
            octets: [
                (year >> 8) as u8,
                (year & 0xFF) as u8,
                month,
                day_of_month,
                day_of_week,
            ],
        })
    }

    /// A date with every field unspecified.
    pub fn wildcard() -> Self {
        Self {
            octets: [0xFF; 5],
        }
    }

    pub fn decode(octets: &[u8]) -> CosemResult<Self> {
        let octets: [u8; 5] = octets.try_into().map_err(|_| {
            CosemError::Decode(format!("date needs {} bytes, got {}", Self::LENGTH, octets.len()))
        })?;
        Ok(Self { octets })
    }

    pub fn encode(&self) -> [u8; 5] {
        self.octets
    }

    fn raw_year(&self) -> u16 {
        ((self.octets[0] as u16) << 8) | self.octets[1] as u16
    }

    /// The year, or `None` if unspecified.
    pub fn year(&self) -> Option<u16> {
        match self.raw_year() {
            YEAR_NOT_SPECIFIED => None,
            y => Some(y),
        }
    }

    pub fn month(&self) -> Option<u8> {
        match self.octets[2] {
            BYTE_NOT_SPECIFIED => None,
            m => Some(m),
        }
    }

    pub fn day_of_month(&self) -> Option<u8> {
        match self.octets[3] {
            BYTE_NOT_SPECIFIED => None,
            d => Some(d),
        }
    }

    pub fn day_of_week(&self) -> Option<u8> {
        match self.octets[4] {
            BYTE_NOT_SPECIFIED => None,
            d => Some(d),
        }
    }

    pub fn is_fully_specified(&self) -> bool {
        self.year().is_some()
            && self.month().map_or(false, |m| m <= 12)
            && self.day_of_month().map_or(false, |d| d <= 31)
    }

    /// Ordering key with wildcards sorting before any concrete value.
    pub(crate) fn sort_key(&self) -> (u16, u8, u8) {
        (
            self.year().unwrap_or(0),
            self.month().unwrap_or(0),
            self.day_of_month().unwrap_or(0),
        )
    }
}

fn verify_month(month: u8) -> CosemResult<()> {
    match month {
        1..=12 | DST_END | DST_BEGIN | BYTE_NOT_SPECIFIED => Ok(()),
        other => Err(CosemError::InvalidData(format!(
            "month {other} out of range"
        ))),
    }
}

fn verify_day_of_month(day: u8) -> CosemResult<()> {
    match day {
        1..=31 | SECOND_LAST_DAY | LAST_DAY | BYTE_NOT_SPECIFIED => Ok(()),
        other => Err(CosemError::InvalidData(format!(
            "day of month {other} out of range"
        ))),
    }
}

fn verify_day_of_week(day: u8) -> CosemResult<()> {
    match day {
        1..=7 | BYTE_NOT_SPECIFIED => Ok(()),
        other => Err(CosemError::InvalidData(format!(
            "day of week {other} out of range"
        ))),
    }
}

impl fmt::Display for CosemDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.year(), self.month(), self.day_of_month()) {
            (Some(y), Some(m), Some(d)) => write!(f, "{y:04}-{m:02}-{d:02}"),
            _ => write!(f, "xxxx-xx-xx"),
        }
    }
}
