//! Scaler and unit of numeric register values.
//!
//! The scaler is stored as its base-10 exponent, never as the multiplier,
//! so set-then-get of any power of ten is exact.

use cosem_core::{CosemError, CosemResult, Value};

/// Common unit codes from the DLMS unit table.
pub mod units {
    pub const NONE: u8 = 0x00;
    pub const WATT: u8 = 0x1B;
    pub const VOLT_AMPERE: u8 = 0x1C;
    pub const WATT_HOUR: u8 = 0x1E;
    pub const VAR_HOUR: u8 = 0x20;
    pub const AMPERE: u8 = 0x21;
    pub const VOLT: u8 = 0x23;
    pub const HERTZ: u8 = 0x2C;
    pub const CELSIUS: u8 = 0x2E;
}

/// (scaler exponent, unit code) attached to a register value:
/// `effective = raw * 10^scaler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalerUnit {
    pub scaler: i8,
    pub unit: u8,
}

impl ScalerUnit {
    pub fn new(scaler: i8, unit: u8) -> Self {
        Self { scaler, unit }
    }

    pub fn none() -> Self {
        Self {
            scaler: 0,
            unit: units::NONE,
        }
    }

    /// Build from a multiplier that must be an exact power of ten
    /// (0.001, 1, 10, 1000, ...).
    pub fn from_factor(factor: f64, unit: u8) -> CosemResult<Self> {
        if factor <= 0.0 {
            return Err(CosemError::InvalidData(format!(
                "scaler factor must be positive, got {factor}"
            )));
        }
        let exponent = factor.log10().round();
        if 10f64.powi(exponent as i32) != factor {
            return Err(CosemError::InvalidData(format!(
                "scaler factor {factor} is not a power of ten"
            )));
        }
        if !(-128.0..=127.0).contains(&exponent) {
            return Err(CosemError::InvalidData(format!(
                "scaler exponent {exponent} out of range"
            )));
        }
        Ok(Self {
            scaler: exponent as i8,
            unit,
        })
    }

    /// The multiplier `10^scaler`.
    pub fn factor(&self) -> f64 {
        10f64.powi(self.scaler as i32)
    }

    pub fn scale(&self, raw: f64) -> f64 {
        raw * self.factor()
    }

    pub fn unscale(&self, scaled: f64) -> f64 {
        scaled / self.factor()
    }

    /// The 2-element wire structure (Integer8 scaler, Enum unit).
    pub fn to_value(&self) -> Value {
        Value::Structure(vec![Value::Integer8(self.scaler), Value::Enum(self.unit)])
    }

    pub fn from_value(value: &Value) -> CosemResult<Self> {
        let fields = value.as_structure()?;
        if fields.len() != 2 {
            return Err(CosemError::InvalidData(format!(
                "scaler-unit needs 2 elements, got {}",
                fields.len()
            )));
        }
        Ok(Self {
            scaler: fields[0].as_i8()?,
            unit: fields[1].as_u8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_round_trip_is_exact() {
        for factor in [0.001, 1.0, 10.0, 1000.0] {
            let su = ScalerUnit::from_factor(factor, units::WATT_HOUR).unwrap();
            assert_eq!(su.factor(), factor);
        }
        assert_eq!(ScalerUnit::from_factor(0.001, 0).unwrap().scaler, -3);
        assert_eq!(ScalerUnit::from_factor(1000.0, 0).unwrap().scaler, 3);
    }

    #[test]
    fn non_power_of_ten_rejected() {
        assert!(ScalerUnit::from_factor(2.0, 0).is_err());
        assert!(ScalerUnit::from_factor(0.0, 0).is_err());
        assert!(ScalerUnit::from_factor(-10.0, 0).is_err());
    }

    #[test]
    fn wire_structure_round_trip() {
        let su = ScalerUnit::new(-3, units::WATT);
        let value = su.to_value();
        assert_eq!(
            value,
            Value::Structure(vec![Value::Integer8(-3), Value::Enum(units::WATT)])
        );
        assert_eq!(ScalerUnit::from_value(&value).unwrap(), su);
    }

    #[test]
    fn scaling_applies_the_exponent() {
        let su = ScalerUnit::new(3, units::WATT);
        assert_eq!(su.scale(12.0), 12_000.0);
        assert_eq!(su.unscale(12_000.0), 12.0);
    }
}
