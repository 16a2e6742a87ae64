//! Clock interface class (class id 8).
//!
//! The meter's real-time clock with timezone and daylight-saving data.
//!
//! Attributes: 1 logical_name, 2 time, 3 time_zone, 4 status,
//! 5 dst_begin, 6 dst_end, 7 dst_deviation, 8 dst_enabled, 9 clock_base.
//! Methods: 1 adjust_to_quarter, 2 adjust_to_minute,
//! 3 preset_adjusting_time, 4 shift_time.

use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemDateTime, CosemError, CosemResult, ObisCode, Value};
use tokio::sync::RwLock;

const SHIFT_LIMIT_SECONDS: i64 = 900;

#[derive(Debug)]
pub struct Clock {
    core: ObjectCore,
    time: RwLock<CosemDateTime>,
    time_zone: RwLock<i16>,
    status: RwLock<u8>,
    dst_begin: RwLock<Option<CosemDateTime>>,
    dst_end: RwLock<Option<CosemDateTime>>,
    dst_deviation: RwLock<i8>,
    dst_enabled: RwLock<bool>,
    clock_base: RwLock<u8>,
}

impl Clock {
    pub const ATTRIBUTE_COUNT: u8 = 9;
    pub const METHOD_COUNT: u8 = 4;

    pub const METHOD_ADJUST_TO_QUARTER: u8 = 1;
    pub const METHOD_ADJUST_TO_MINUTE: u8 = 2;
    pub const METHOD_PRESET_ADJUSTING_TIME: u8 = 3;
    pub const METHOD_SHIFT_TIME: u8 = 4;

    /// The conventional clock name 0-0:1.0.0.255.
    pub fn default_name() -> ObisCode {
        ObisCode::new(0, 0, 1, 0, 0, 255)
    }

    pub fn new(logical_name: ObisCode, time: CosemDateTime, time_zone: i16) -> Self {
        Self {
            core: ObjectCore::new(InterfaceClass::Clock, 0, Some(logical_name)),
            time: RwLock::new(time),
            time_zone: RwLock::new(time_zone),
            status: RwLock::new(0),
            dst_begin: RwLock::new(None),
            dst_end: RwLock::new(None),
            dst_deviation: RwLock::new(60),
            dst_enabled: RwLock::new(false),
            clock_base: RwLock::new(0),
        }
    }

    pub async fn time(&self) -> CosemDateTime {
        *self.time.read().await
    }

    pub async fn set_time(&self, time: CosemDateTime) {
        *self.time.write().await = time;
    }

    pub async fn time_zone(&self) -> i16 {
        *self.time_zone.read().await
    }

    /// Shift the clock by `seconds`, limited to +-900.
    pub async fn shift_time(&self, seconds: i64) -> CosemResult<()> {
        if seconds.abs() > SHIFT_LIMIT_SECONDS {
            return Err(CosemError::InvalidData(format!(
                "shift of {seconds} s exceeds +-{SHIFT_LIMIT_SECONDS} s"
            )));
        }
        let mut time = self.time.write().await;
        *time = time.add_seconds(seconds)?;
        Ok(())
    }

    /// Round to the nearest quarter hour.
    pub async fn adjust_to_quarter(&self) -> CosemResult<()> {
        self.adjust_to_multiple(900).await
    }

    /// Round to the nearest full minute.
    pub async fn adjust_to_minute(&self) -> CosemResult<()> {
        self.adjust_to_multiple(60).await
    }

    async fn adjust_to_multiple(&self, step: i64) -> CosemResult<()> {
        let mut time = self.time.write().await;
        let (Some(hour), Some(minute), Some(second)) = (
            time.time().hour(),
            time.time().minute(),
            time.time().second(),
        ) else {
            return Err(CosemError::InvalidData(
                "cannot adjust a clock with unspecified time fields".into(),
            ));
        };
        let of_day = hour as i64 * 3600 + minute as i64 * 60 + second as i64;
        let rounded = (of_day + step / 2) / step * step;
        *time = time.add_seconds(rounded - of_day)?;
        Ok(())
    }

    fn date_time_parameter(parameters: Option<Value>) -> CosemResult<CosemDateTime> {
        match parameters {
            Some(Value::DateTime(dt)) => Ok(dt),
            Some(Value::OctetString(bytes)) => CosemDateTime::decode(&bytes),
            Some(other) => Err(CosemError::InvalidData(format!(
                "expected a date-time parameter, got {:?}",
                other.kind()
            ))),
            None => Err(CosemError::InvalidData("missing date-time parameter".into())),
        }
    }

    async fn optional_date_time(slot: &RwLock<Option<CosemDateTime>>) -> Value {
        match *slot.read().await {
            Some(dt) => Value::OctetString(dt.encode().to_vec()),
            None => Value::Null,
        }
    }

    fn parse_optional_date_time(value: &Value) -> CosemResult<Option<CosemDateTime>> {
        match value {
            Value::Null => Ok(None),
            Value::OctetString(bytes) => Ok(Some(CosemDateTime::decode(bytes)?)),
            Value::DateTime(dt) => Ok(Some(*dt)),
            other => Err(CosemError::InvalidData(format!(
                "expected a date-time or null, got {:?}",
                other.kind()
            ))),
        }
    }
}

#[async_trait]
impl CosemObject for Clock {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn attribute_count(&self) -> u8 {
        Self::ATTRIBUTE_COUNT
    }

    fn method_count(&self) -> u8 {
        Self::METHOD_COUNT
    }

    async fn get_attribute(
        &self,
        index: u8,
        _access: Option<&SelectiveAccess>,
    ) -> CosemResult<Value> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        Ok(match index {
            1 => self.core.logical_name_value().await,
            2 => Value::OctetString(self.time.read().await.encode().to_vec()),
            3 => Value::Integer16(*self.time_zone.read().await),
            4 => Value::Unsigned8(*self.status.read().await),
            5 => Self::optional_date_time(&self.dst_begin).await,
            6 => Self::optional_date_time(&self.dst_end).await,
            7 => Value::Integer8(*self.dst_deviation.read().await),
            8 => Value::Boolean(*self.dst_enabled.read().await),
            _ => Value::Enum(*self.clock_base.read().await),
        })
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => self.core.apply_logical_name_value(&value).await?,
            2 => {
                let dt = match &value {
                    Value::OctetString(bytes) => CosemDateTime::decode(bytes)?,
                    Value::DateTime(dt) => *dt,
                    other => {
                        return Err(CosemError::InvalidData(format!(
                            "clock time must be a date-time, got {:?}",
                            other.kind()
                        )));
                    }
                };
                self.set_time(dt).await;
            }
            3 => *self.time_zone.write().await = value.as_i16()?,
            4 => *self.status.write().await = value.as_u8()?,
            5 => *self.dst_begin.write().await = Self::parse_optional_date_time(&value)?,
            6 => *self.dst_end.write().await = Self::parse_optional_date_time(&value)?,
            7 => *self.dst_deviation.write().await = value.as_i8()?,
            8 => *self.dst_enabled.write().await = value.as_bool()?,
            _ => *self.clock_base.write().await = value.as_u8()?,
        }
        Ok(())
    }

    async fn invoke(&self, index: u8, parameters: Option<Value>) -> CosemResult<Option<Value>> {
        self.core.check_method_index(index, self.method_count())?;
        match index {
            Self::METHOD_ADJUST_TO_QUARTER => self.adjust_to_quarter().await?,
            Self::METHOD_ADJUST_TO_MINUTE => self.adjust_to_minute().await?,
            Self::METHOD_PRESET_ADJUSTING_TIME => {
                let dt = Self::date_time_parameter(parameters)?;
                self.set_time(dt).await;
            }
            _ => {
                let seconds = parameters
                    .ok_or_else(|| CosemError::InvalidData("missing shift parameter".into()))?
                    .to_i64()?;
                self.shift_time(seconds).await?;
            }
        }
        Ok(None)
    }
}
