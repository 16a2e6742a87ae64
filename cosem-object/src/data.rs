//! Data interface class (class id 1).
//!
//! The simplest COSEM object: a logical name and one value.
//!
//! Attributes: 1 logical_name, 2 value. No methods.

use crate::attribute::AttributeMetadata;
use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult, ObisCode, Value, ValueKind};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct Data {
    core: ObjectCore,
    value: RwLock<Value>,
}

impl Data {
    pub const ATTRIBUTE_COUNT: u8 = 2;

    pub fn new(logical_name: ObisCode, value: Value) -> Self {
        Self {
            core: ObjectCore::new(InterfaceClass::Data, 0, Some(logical_name)),
            value: RwLock::new(value),
        }
    }

    /// A Data object with a declared value type recorded in its metadata.
    pub async fn with_declared_type(logical_name: ObisCode, value: Value, kind: ValueKind) -> Self {
        let data = Self::new(logical_name, value);
        data.core
            .set_attribute_metadata(2, AttributeMetadata::typed(kind))
            .await;
        data
    }

    pub async fn value(&self) -> Value {
        self.value.read().await.clone()
    }

    pub async fn set_value(&self, value: Value) {
        *self.value.write().await = value;
    }
}

#[async_trait]
impl CosemObject for Data {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn attribute_count(&self) -> u8 {
        Self::ATTRIBUTE_COUNT
    }

    fn method_count(&self) -> u8 {
        0
    }

    async fn get_attribute(
        &self,
        index: u8,
        _access: Option<&SelectiveAccess>,
    ) -> CosemResult<Value> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => Ok(self.core.logical_name_value().await),
            _ => Ok(self.value().await),
        }
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => self.core.apply_logical_name_value(&value).await,
            _ => {
                self.set_value(value).await;
                Ok(())
            }
        }
    }

    async fn invoke(&self, index: u8, _parameters: Option<Value>) -> CosemResult<Option<Value>> {
        Err(CosemError::InvalidMethodIndex { index, count: 0 })
    }
}
