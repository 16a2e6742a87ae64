//! Association LN interface class (class id 15).
//!
//! Represents a client's logical-name association and publishes the
//! accessible object list with its access rights.
//!
//! Attributes: 1 logical_name, 2 object_list, 3 associated_partners_id,
//! 4 application_context_name, 5 xdlms_context_info,
//! 6 authentication_mechanism_name, 7 secret, 8 association_status.

use crate::collection::ObjectCollection;
use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult, ObisCode, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Association state, per the association_status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationStatus {
    NonAssociated,
    AssociationPending,
    Associated,
}

impl AssociationStatus {
    pub fn code(&self) -> u8 {
        match self {
            AssociationStatus::NonAssociated => 0,
            AssociationStatus::AssociationPending => 1,
            AssociationStatus::Associated => 2,
        }
    }

    pub fn from_code(code: u8) -> CosemResult<Self> {
        match code {
            0 => Ok(AssociationStatus::NonAssociated),
            1 => Ok(AssociationStatus::AssociationPending),
            2 => Ok(AssociationStatus::Associated),
            other => Err(CosemError::InvalidData(format!(
                "unknown association status {other}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct AssociationLn {
    core: ObjectCore,
    /// The published object list is a live view over the device's
    /// collection, shared with the dispatcher.
    objects: Arc<RwLock<ObjectCollection>>,
    client_sap: RwLock<u8>,
    server_sap: RwLock<u16>,
    application_context_name: RwLock<Vec<u8>>,
    xdlms_context_info: RwLock<Value>,
    authentication_mechanism_name: RwLock<Vec<u8>>,
    secret: RwLock<Vec<u8>>,
    status: RwLock<AssociationStatus>,
}

impl AssociationLn {
    pub const ATTRIBUTE_COUNT: u8 = 8;

    /// The conventional current-association name 0-0:40.0.0.255.
    pub fn default_name() -> ObisCode {
        ObisCode::new(0, 0, 40, 0, 0, 255)
    }

    pub fn new(logical_name: ObisCode, objects: Arc<RwLock<ObjectCollection>>) -> Self {
        Self {
            core: ObjectCore::new(InterfaceClass::AssociationLn, 1, Some(logical_name)),
            objects,
            client_sap: RwLock::new(0x10),
            server_sap: RwLock::new(0x01),
            application_context_name: RwLock::new(Vec::new()),
            xdlms_context_info: RwLock::new(Value::Null),
            authentication_mechanism_name: RwLock::new(Vec::new()),
            secret: RwLock::new(Vec::new()),
            status: RwLock::new(AssociationStatus::NonAssociated),
        }
    }

    pub async fn set_partners(&self, client_sap: u8, server_sap: u16) {
        *self.client_sap.write().await = client_sap;
        *self.server_sap.write().await = server_sap;
    }

    pub async fn status(&self) -> AssociationStatus {
        *self.status.read().await
    }

    pub async fn set_status(&self, status: AssociationStatus) {
        *self.status.write().await = status;
    }

    pub async fn secret(&self) -> Vec<u8> {
        self.secret.read().await.clone()
    }
}

#[async_trait]
impl CosemObject for AssociationLn {
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
        Ok(match index {
            1 => self.core.logical_name_value().await,
            2 => self.objects.read().await.to_object_list_value().await?,
            3 => Value::Structure(vec![
                Value::Integer8(*self.client_sap.read().await as i8),
                Value::Unsigned16(*self.server_sap.read().await),
            ]),
            4 => Value::OctetString(self.application_context_name.read().await.clone()),
            5 => self.xdlms_context_info.read().await.clone(),
            6 => Value::OctetString(self.authentication_mechanism_name.read().await.clone()),
            // The secret never reads back.
            7 => Value::OctetString(Vec::new()),
            _ => Value::Enum(self.status.read().await.code()),
        })
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => self.core.apply_logical_name_value(&value).await?,
            2 => {
                return Err(CosemError::AccessDenied(
                    "the object list is published, not written".into(),
                ));
            }
            3 => {
                let fields = value.as_structure()?;
                if fields.len() != 2 {
                    return Err(CosemError::InvalidData(
                        "associated_partners_id needs 2 elements".into(),
                    ));
                }
                let client = fields[0].as_i8()?;
                self.set_partners(client as u8, fields[1].as_u16()?).await;
            }
            4 => {
                *self.application_context_name.write().await = value.as_octets()?.to_vec();
            }
            5 => *self.xdlms_context_info.write().await = value,
            6 => {
                *self.authentication_mechanism_name.write().await = value.as_octets()?.to_vec();
            }
            7 => *self.secret.write().await = value.as_octets()?.to_vec(),
            _ => *self.status.write().await = AssociationStatus::from_code(value.as_u8()?)?,
        }
        Ok(())
    }

    async fn invoke(&self, index: u8, _parameters: Option<Value>) -> CosemResult<Option<Value>> {
        Err(CosemError::InvalidMethodIndex { index, count: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Data;

    async fn association() -> AssociationLn {
        let mut collection = ObjectCollection::new();
        collection
            .register(Arc::new(Data::new(
                ObisCode::new(0, 0, 96, 1, 0, 255),
                Value::Null,
            )))
            .await
            .unwrap();
        let objects = Arc::new(RwLock::new(collection));
        AssociationLn::new(AssociationLn::default_name(), objects)
    }

    #[tokio::test]
    async fn publishes_the_object_list() {
        let association = association().await;
        let listed = association.get_attribute(2, None).await.unwrap();
        let entries = listed.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        let fields = entries[0].as_structure().unwrap();
        assert_eq!(fields[0], Value::Unsigned16(1));
        // 3-element attribute access items, 2-element method access items.
        let rights = fields[3].as_structure().unwrap();
        let attribute_items = rights[0].as_array().unwrap();
        assert_eq!(attribute_items[0].as_structure().unwrap().len(), 3);

        let err = association
            .set_attribute(2, Value::Array(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, CosemError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn secret_is_write_only() {
        let association = association().await;
        association
            .set_attribute(7, Value::OctetString(b"12345678".to_vec()))
            .await
            .unwrap();
        assert_eq!(association.secret().await, b"12345678".to_vec());
        assert_eq!(
            association.get_attribute(7, None).await.unwrap(),
            Value::OctetString(Vec::new())
        );
    }

    #[tokio::test]
    async fn partners_and_status() {
        let association = association().await;
        association
            .set_attribute(
                3,
                Value::Structure(vec![Value::Integer8(0x20), Value::Unsigned16(1)]),
            )
            .await
            .unwrap();
        let partners = association.get_attribute(3, None).await.unwrap();
        assert_eq!(
            partners,
            Value::Structure(vec![Value::Integer8(0x20), Value::Unsigned16(1)])
        );

        association.set_status(AssociationStatus::Associated).await;
        assert_eq!(
            association.get_attribute(8, None).await.unwrap(),
            Value::Enum(2)
        );
        assert!(association.set_attribute(8, Value::Enum(9)).await.is_err());
    }
}
