//! Register interface class (class id 3).
//!
//! A numeric quantity with a scaler and unit.
//!
//! Attributes: 1 logical_name, 2 value, 3 scaler_unit.
//! Methods: 1 reset.

use crate::attribute::AttributeMetadata;
use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::scaler_unit::ScalerUnit;
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult, ObisCode, Value, ValueKind};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct Register {
    core: ObjectCore,
    value: RwLock<Value>,
    scaler_unit: RwLock<ScalerUnit>,
}

impl Register {
    pub const ATTRIBUTE_COUNT: u8 = 3;
    pub const METHOD_COUNT: u8 = 1;
    pub const METHOD_RESET: u8 = 1;

    pub fn new(logical_name: ObisCode, value: Value, scaler_unit: ScalerUnit) -> Self {
        Self {
            core: ObjectCore::new(InterfaceClass::Register, 0, Some(logical_name)),
            value: RwLock::new(value),
            scaler_unit: RwLock::new(scaler_unit),
        }
    }

    /// A register whose value attribute has a declared wire type; the
    /// scaler-unit attribute is marked static (it rarely changes and is
    /// cached after one read).
    pub async fn with_declared_type(
        logical_name: ObisCode,
        value: Value,
        scaler_unit: ScalerUnit,
        kind: ValueKind,
    ) -> Self {
        let register = Self::new(logical_name, value, scaler_unit);
        register
            .core
            .set_attribute_metadata(2, AttributeMetadata::typed(kind))
            .await;
        register
            .core
            .set_attribute_metadata(
                3,
                AttributeMetadata {
                    data_type: ValueKind::Structure,
                    is_static: true,
                    ..Default::default()
                },
            )
            .await;
        register
    }

    pub async fn value(&self) -> Value {
        self.value.read().await.clone()
    }

    pub async fn set_value(&self, value: Value) -> CosemResult<()> {
        if !value.is_numeric() && !value.is_null() {
            return Err(CosemError::InvalidData(format!(
                "register value must be numeric, got {:?}",
                value.kind()
            )));
        }
        *self.value.write().await = value;
        Ok(())
    }

    pub async fn scaler_unit(&self) -> ScalerUnit {
        *self.scaler_unit.read().await
    }

    pub async fn set_scaler_unit(&self, scaler_unit: ScalerUnit) {
        *self.scaler_unit.write().await = scaler_unit;
    }

    /// The value with the scaler applied.
    pub async fn scaled_value(&self) -> CosemResult<f64> {
        let raw = match &*self.value.read().await {
            Value::Float32(v) => *v as f64,
            Value::Float64(v) => *v,
            other => other.to_i64()? as f64,
        };
        Ok(self.scaler_unit.read().await.scale(raw))
    }

    /// Zero the value, preserving its kind.
    pub async fn reset(&self) {
        let mut value = self.value.write().await;
        *value = match &*value {
            Value::Integer8(_) => Value::Integer8(0),
            Value::Integer16(_) => Value::Integer16(0),
            Value::Integer32(_) => Value::Integer32(0),
            Value::Integer64(_) => Value::Integer64(0),
            Value::Unsigned8(_) => Value::Unsigned8(0),
            Value::Unsigned16(_) => Value::Unsigned16(0),
            Value::Unsigned32(_) => Value::Unsigned32(0),
            Value::Unsigned64(_) => Value::Unsigned64(0),
            Value::Float32(_) => Value::Float32(0.0),
            Value::Float64(_) => Value::Float64(0.0),
            Value::Enum(_) => Value::Enum(0),
            Value::Bcd(_) => Value::Bcd(0),
            other => other.clone(),
        };
    }
}

#[async_trait]
impl CosemObject for Register {
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
        match index {
            1 => Ok(self.core.logical_name_value().await),
            2 => Ok(self.value().await),
            _ => Ok(self.scaler_unit().await.to_value()),
        }
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => self.core.apply_logical_name_value(&value).await,
            2 => self.set_value(value).await,
            _ => {
                self.set_scaler_unit(ScalerUnit::from_value(&value)?).await;
                Ok(())
            }
        }
    }

    async fn invoke(&self, index: u8, _parameters: Option<Value>) -> CosemResult<Option<Value>> {
        self.core.check_method_index(index, self.method_count())?;
        self.reset().await;
        Ok(None)
    }
}
