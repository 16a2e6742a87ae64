//! The generic COSEM object contract.

use crate::attribute::{AttributeMetadata, MethodMetadata};
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult, ObisCode, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Closed enumeration of the COSEM interface classes this stack knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceClass {
    Data,
    Register,
    ExtendedRegister,
    DemandRegister,
    ProfileGeneric,
    Clock,
    ScriptTable,
    SpecialDaysTable,
    AssociationSn,
    AssociationLn,
    SapAssignment,
    ImageTransfer,
    ActivityCalendar,
    RegisterMonitor,
    SingleActionSchedule,
    IecHdlcSetup,
    SecuritySetup,
    DisconnectControl,
    Limiter,
}

impl InterfaceClass {
    pub fn class_id(&self) -> u16 {
        match self {
            InterfaceClass::Data => 1,
            InterfaceClass::Register => 3,
            InterfaceClass::ExtendedRegister => 4,
            InterfaceClass::DemandRegister => 5,
            InterfaceClass::ProfileGeneric => 7,
            InterfaceClass::Clock => 8,
            InterfaceClass::ScriptTable => 9,
            InterfaceClass::SpecialDaysTable => 11,
            InterfaceClass::AssociationSn => 12,
            InterfaceClass::AssociationLn => 15,
            InterfaceClass::SapAssignment => 17,
            InterfaceClass::ImageTransfer => 18,
            InterfaceClass::ActivityCalendar => 20,
            InterfaceClass::RegisterMonitor => 21,
            InterfaceClass::SingleActionSchedule => 22,
            InterfaceClass::IecHdlcSetup => 23,
            InterfaceClass::SecuritySetup => 64,
            InterfaceClass::DisconnectControl => 70,
            InterfaceClass::Limiter => 71,
        }
    }

    pub fn from_class_id(id: u16) -> CosemResult<Self> {
        Ok(match id {
            1 => InterfaceClass::Data,
            3 => InterfaceClass::Register,
            4 => InterfaceClass::ExtendedRegister,
            5 => InterfaceClass::DemandRegister,
            7 => InterfaceClass::ProfileGeneric,
            8 => InterfaceClass::Clock,
            9 => InterfaceClass::ScriptTable,
            11 => InterfaceClass::SpecialDaysTable,
            12 => InterfaceClass::AssociationSn,
            15 => InterfaceClass::AssociationLn,
            17 => InterfaceClass::SapAssignment,
            18 => InterfaceClass::ImageTransfer,
            20 => InterfaceClass::ActivityCalendar,
            21 => InterfaceClass::RegisterMonitor,
            22 => InterfaceClass::SingleActionSchedule,
            23 => InterfaceClass::IecHdlcSetup,
            64 => InterfaceClass::SecuritySetup,
            70 => InterfaceClass::DisconnectControl,
            71 => InterfaceClass::Limiter,
            other => {
                return Err(CosemError::InvalidData(format!(
                    "unknown interface class id {other}"
                )));
            }
        })
    }
}

/// State shared by every COSEM object: identity plus attribute and method
/// metadata. Concrete classes embed one `ObjectCore` instead of inheriting.
#[derive(Debug)]
pub struct ObjectCore {
    class: InterfaceClass,
    version: u8,
    logical_name: RwLock<Option<ObisCode>>,
    short_name: RwLock<u16>,
    attributes: RwLock<BTreeMap<u8, AttributeMetadata>>,
    methods: RwLock<BTreeMap<u8, MethodMetadata>>,
}

impl ObjectCore {
    pub fn new(class: InterfaceClass, version: u8, logical_name: Option<ObisCode>) -> Self {
        Self {
            class,
            version,
            logical_name: RwLock::new(logical_name),
            short_name: RwLock::new(0),
            attributes: RwLock::new(BTreeMap::new()),
            methods: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn class(&self) -> InterfaceClass {
        self.class
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub async fn logical_name(&self) -> Option<ObisCode> {
        *self.logical_name.read().await
    }

    pub async fn set_logical_name(&self, name: ObisCode) {
        *self.logical_name.write().await = Some(name);
    }

    pub async fn short_name(&self) -> u16 {
        *self.short_name.read().await
    }

    pub async fn set_short_name(&self, short_name: u16) {
        *self.short_name.write().await = short_name;
    }

    /// Attribute 1 as a wire value: the 6-byte logical name, or Null while
    /// unset.
    pub async fn logical_name_value(&self) -> Value {
        match *self.logical_name.read().await {
            Some(name) => Value::OctetString(name.to_bytes().to_vec()),
            None => Value::Null,
        }
    }

    /// Apply a written attribute-1 value. A Null value is a no-op (the
    /// current name is preserved); anything else must be a 6-byte octet
    /// string.
    pub async fn apply_logical_name_value(&self, value: &Value) -> CosemResult<()> {
        match value {
            Value::Null => Ok(()),
            Value::OctetString(bytes) => {
                let name = ObisCode::from_bytes(bytes)?;
                self.set_logical_name(name).await;
                Ok(())
            }
            other => Err(CosemError::InvalidData(format!(
                "logical name must be an octet string, got {:?}",
                other.kind()
            ))),
        }
    }

    /// Metadata of an attribute, defaulted when absent.
    pub async fn attribute(&self, index: u8) -> AttributeMetadata {
        self.attributes
            .read()
            .await
            .get(&index)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set_attribute_metadata(&self, index: u8, metadata: AttributeMetadata) {
        self.attributes.write().await.insert(index, metadata);
    }

    /// Metadata of a method, defaulted when absent.
    pub async fn method(&self, index: u8) -> MethodMetadata {
        self.methods
            .read()
            .await
            .get(&index)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set_method_metadata(&self, index: u8, metadata: MethodMetadata) {
        self.methods.write().await.insert(index, metadata);
    }

    /// Record a successful read. A static attribute transitions to "read"
    /// once and never back.
    pub async fn mark_attribute_read(&self, index: u8) {
        let mut attributes = self.attributes.write().await;
        attributes.entry(index).or_default().last_read = Some(SystemTime::now());
    }

    /// The attribute indices a polling client still needs to read:
    /// attribute 1 only while the logical name is unset, a static attribute
    /// only while never read, every other attribute whose access mode
    /// allows reading.
    pub async fn attribute_indices_to_read(&self, attribute_count: u8) -> Vec<u8> {
        let name_set = self.logical_name.read().await.is_some();
        let attributes = self.attributes.read().await;
        let mut indices = Vec::new();
        for index in 1..=attribute_count {
            if index == 1 {
                if !name_set {
                    indices.push(index);
                }
                continue;
            }
            let metadata = attributes.get(&index).copied().unwrap_or_default();
            if !metadata.access.can_read() {
                continue;
            }
            if metadata.is_static && metadata.last_read.is_some() {
                continue;
            }
            indices.push(index);
        }
        indices
    }

    pub fn check_attribute_index(&self, index: u8, count: u8) -> CosemResult<()> {
        if index == 0 || index > count {
            return Err(CosemError::InvalidAttributeIndex { index, count });
        }
        Ok(())
    }

    pub fn check_method_index(&self, index: u8, count: u8) -> CosemResult<()> {
        if index == 0 || index > count {
            return Err(CosemError::InvalidMethodIndex { index, count });
        }
        Ok(())
    }
}

/// The operations every COSEM object supports. Attribute and method
/// indices are 1-based; index 1 is always the logical name.
#[async_trait]
pub trait CosemObject: Send + Sync + fmt::Debug {
    fn core(&self) -> &ObjectCore;

    /// Number of attributes, fixed per interface class.
    fn attribute_count(&self) -> u8;

    /// Number of methods, fixed per interface class.
    fn method_count(&self) -> u8;

    async fn get_attribute(
        &self,
        index: u8,
        access: Option<&SelectiveAccess>,
    ) -> CosemResult<Value>;

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()>;

    async fn invoke(&self, index: u8, parameters: Option<Value>) -> CosemResult<Option<Value>>;

    /// Invoke with the owning collection in reach. Methods that sample
    /// other objects (Profile Generic's capture) override this; everything
    /// else falls through to [`CosemObject::invoke`].
    async fn invoke_with_collection(
        &self,
        index: u8,
        parameters: Option<Value>,
        _collection: &crate::collection::ObjectCollection,
    ) -> CosemResult<Option<Value>> {
        self.invoke(index, parameters).await
    }

    fn interface_class(&self) -> InterfaceClass {
        self.core().class()
    }

    fn version(&self) -> u8 {
        self.core().version()
    }

    async fn logical_name(&self) -> Option<ObisCode> {
        self.core().logical_name().await
    }

    async fn short_name(&self) -> u16 {
        self.core().short_name().await
    }

    /// Read-scheduling view over this object's metadata.
    async fn attribute_indices_to_read(&self) -> Vec<u8> {
        self.core()
            .attribute_indices_to_read(self.attribute_count())
            .await
    }
}
