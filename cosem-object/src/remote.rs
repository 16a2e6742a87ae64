//! Client-side mirror of a server object, built when an association
//! object list is replayed.

use crate::attribute::{AccessMode, AttributeMetadata, MethodAccess, MethodMetadata};
use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult, ObisCode, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::RwLock;

/// A mirror object: it has the identity and access metadata of the remote
/// object and caches the attribute values read from it. `get_attribute`
/// serves the cache; `set_attribute` fills it. The read-scheduling
/// metadata ([`CosemObject::attribute_indices_to_read`]) decides which
/// attributes still need a wire read.
#[derive(Debug)]
pub struct RemoteObject {
    core: ObjectCore,
    attribute_count: AtomicU8,
    method_count: AtomicU8,
    cache: RwLock<BTreeMap<u8, Value>>,
}

impl RemoteObject {
    pub fn new(class: InterfaceClass, version: u8, logical_name: ObisCode) -> Self {
        Self {
            core: ObjectCore::new(class, version, Some(logical_name)),
            attribute_count: AtomicU8::new(1),
            method_count: AtomicU8::new(0),
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Apply a decoded access_rights structure: {attribute_access: ARRAY
    /// of {attribute_id, access_mode, access_selectors}, method_access:
    /// ARRAY of {method_id, access_mode}}. The highest listed indices set
    /// the mirror's attribute and method counts.
    pub async fn apply_access_rights(&self, rights: &Value) -> CosemResult<()> {
        let fields = rights.as_structure()?;
        if fields.len() != 2 {
            return Err(CosemError::InvalidData(format!(
                "access_rights needs 2 elements, got {}",
                fields.len()
            )));
        }

        for item in fields[0].as_array()? {
            let item = item.as_structure()?;
            if item.len() < 2 {
                return Err(CosemError::InvalidData(
                    "attribute access item needs at least 2 elements".into(),
                ));
            }
            let index = item[0].as_i8()?;
            if index < 1 {
                return Err(CosemError::InvalidData(format!(
                    "attribute index {index} out of range"
                )));
            }
            let index = index as u8;
            let access = AccessMode::from_code(item[1].as_u8()?)?;
            self.core
                .set_attribute_metadata(
                    index,
                    AttributeMetadata {
                        access,
                        ..Default::default()
                    },
                )
                .await;
            self.attribute_count.fetch_max(index, Ordering::Relaxed);
        }

        for item in fields[1].as_array()? {
            let item = item.as_structure()?;
            if item.len() != 2 {
                return Err(CosemError::InvalidData(
                    "method access item needs 2 elements".into(),
                ));
            }
            let index = item[0].as_i8()?;
            if index < 1 {
                return Err(CosemError::InvalidData(format!(
                    "method index {index} out of range"
                )));
            }
            let index = index as u8;
            let access = MethodAccess::from_code(item[1].as_u8()?)?;
            self.core
                .set_method_metadata(index, MethodMetadata { access })
                .await;
            self.method_count.fetch_max(index, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[async_trait]
impl CosemObject for RemoteObject {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn attribute_count(&self) -> u8 {
        self.attribute_count.load(Ordering::Relaxed)
    }

    fn method_count(&self) -> u8 {
        self.method_count.load(Ordering::Relaxed)
    }

    async fn get_attribute(
        &self,
        index: u8,
        _access: Option<&SelectiveAccess>,
    ) -> CosemResult<Value> {
        self.core
            .check_attribute_index(index, self.attribute_count())?;
        if index == 1 {
            return Ok(self.core.logical_name_value().await);
        }
        Ok(self
            .cache
            .read()
            .await
            .get(&index)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core
            .check_attribute_index(index, self.attribute_count())?;
        if index == 1 {
            return self.core.apply_logical_name_value(&value).await;
        }
        self.cache.write().await.insert(index, value);
        self.core.mark_attribute_read(index).await;
        Ok(())
    }

    async fn invoke(&self, index: u8, _parameters: Option<Value>) -> CosemResult<Option<Value>> {
        self.core.check_method_index(index, self.method_count())?;
        Err(CosemError::Protocol(
            "a mirror object cannot execute methods locally".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rights(attribute_count: u8, method_count: u8) -> Value {
        let attribute_access = (1..=attribute_count)
            .map(|i| {
                Value::Structure(vec![
                    Value::Integer8(i as i8),
                    Value::Enum(if i == 1 { 1 } else { 3 }),
                    Value::Null,
                ])
            })
            .collect();
        let method_access = (1..=method_count)
            .map(|i| Value::Structure(vec![Value::Integer8(i as i8), Value::Enum(1)]))
            .collect();
        Value::Structure(vec![Value::Array(attribute_access), Value::Array(method_access)])
    }

    #[tokio::test]
    async fn access_rights_set_counts_and_modes() {
        let mirror = RemoteObject::new(InterfaceClass::Register, 0, ObisCode::new(1, 0, 1, 8, 0, 255));
        mirror.apply_access_rights(&rights(3, 1)).await.unwrap();
        assert_eq!(mirror.attribute_count(), 3);
        assert_eq!(mirror.method_count(), 1);
        assert_eq!(mirror.core().attribute(1).await.access, AccessMode::Read);
        assert_eq!(mirror.core().attribute(2).await.access, AccessMode::ReadWrite);
    }

    #[tokio::test]
    async fn cache_serves_written_values() {
        let mirror = RemoteObject::new(InterfaceClass::Register, 0, ObisCode::new(1, 0, 1, 8, 0, 255));
        mirror.apply_access_rights(&rights(3, 0)).await.unwrap();

        assert_eq!(mirror.get_attribute(2, None).await.unwrap(), Value::Null);
        mirror.set_attribute(2, Value::Unsigned32(42)).await.unwrap();
        assert_eq!(
            mirror.get_attribute(2, None).await.unwrap(),
            Value::Unsigned32(42)
        );
        assert!(mirror.get_attribute(4, None).await.is_err());
    }

    #[tokio::test]
    async fn filling_the_cache_marks_reads() {
        let mirror = RemoteObject::new(InterfaceClass::Register, 0, ObisCode::new(1, 0, 1, 8, 0, 255));
        mirror.apply_access_rights(&rights(2, 0)).await.unwrap();
        assert!(mirror.core().attribute(2).await.last_read.is_none());
        mirror.set_attribute(2, Value::Unsigned32(1)).await.unwrap();
        assert!(mirror.core().attribute(2).await.last_read.is_some());
    }
}
