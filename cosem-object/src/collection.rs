//! The object registry: an ordered, uniquely-named collection of COSEM
//! objects, also renderable as the association object-list value.

use crate::object::{CosemObject, InterfaceClass};
use crate::remote::RemoteObject;
use cosem_core::{CosemError, CosemResult, ObisCode, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Stable handle of an object inside its collection.
pub type ObjectHandle = usize;

/// Ordered set of objects owned by a logical device or association.
///
/// Objects are held by value in an arena; lookups go through index maps
/// keyed by logical name and by non-zero short name. No object holds a
/// live back-pointer to the collection.
#[derive(Debug, Default)]
pub struct ObjectCollection {
    objects: Vec<Arc<dyn CosemObject>>,
    by_name: HashMap<ObisCode, ObjectHandle>,
    by_short_name: HashMap<u16, ObjectHandle>,
}

impl ObjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object. Rejects a duplicate non-empty logical name or a
    /// duplicate non-zero short name.
    pub async fn register(&mut self, object: Arc<dyn CosemObject>) -> CosemResult<ObjectHandle> {
        let handle = self.objects.len();
        if let Some(name) = object.logical_name().await {
            if self.by_name.contains_key(&name) {
                return Err(CosemError::InvalidData(format!(
                    "an object named {name} is already registered"
                )));
            }
            self.by_name.insert(name, handle);
        }
        let short_name = object.short_name().await;
        if short_name != 0 {
            if self.by_short_name.contains_key(&short_name) {
                return Err(CosemError::InvalidData(format!(
                    "short name {short_name:#06x} is already registered"
                )));
            }
            self.by_short_name.insert(short_name, handle);
        }
        self.objects.push(object);
        Ok(handle)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&Arc<dyn CosemObject>> {
        self.objects.get(handle)
    }

    pub fn find(&self, name: &ObisCode) -> Option<Arc<dyn CosemObject>> {
        self.by_name.get(name).map(|&h| self.objects[h].clone())
    }

    pub fn find_by_short_name(&self, short_name: u16) -> Option<Arc<dyn CosemObject>> {
        self.by_short_name
            .get(&short_name)
            .map(|&h| self.objects[h].clone())
    }

    /// All objects of one interface class, in registration order.
    pub fn of_class(&self, class: InterfaceClass) -> Vec<Arc<dyn CosemObject>> {
        self.objects
            .iter()
            .filter(|o| o.interface_class() == class)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CosemObject>> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Render the collection as the association object-list value: an
    /// ARRAY of {class_id, version, logical_name, access_rights}, where
    /// access_rights is {attribute_access: ARRAY of {attribute_id,
    /// access_mode, access_selectors}, method_access: ARRAY of
    /// {method_id, access_mode}} per the Association-LN definition.
    pub async fn to_object_list_value(&self) -> CosemResult<Value> {
        let mut entries = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let name = object.logical_name().await.ok_or_else(|| {
                CosemError::InvalidData("unnamed object cannot appear in an object list".into())
            })?;

            let mut attribute_access = Vec::new();
            for index in 1..=object.attribute_count() {
                let metadata = object.core().attribute(index).await;
                attribute_access.push(Value::Structure(vec![
                    Value::Integer8(index as i8),
                    Value::Enum(metadata.access.code()),
                    Value::Null,
                ]));
            }
            let mut method_access = Vec::new();
            for index in 1..=object.method_count() {
                let metadata = object.core().method(index).await;
                method_access.push(Value::Structure(vec![
                    Value::Integer8(index as i8),
                    Value::Enum(metadata.access.code()),
                ]));
            }

            entries.push(Value::Structure(vec![
                Value::Unsigned16(object.interface_class().class_id()),
                Value::Unsigned8(object.version()),
                Value::OctetString(name.to_bytes().to_vec()),
                Value::Structure(vec![
                    Value::array(attribute_access)?,
                    Value::array(method_access)?,
                ]),
            ]));
        }
        Value::array(entries)
    }

    /// Replay a decoded object-list value into a collection of
    /// [`RemoteObject`] mirrors, one per listed object. Unknown class ids
    /// fail the replay; access rights are applied to the mirror metadata.
    pub async fn from_object_list_value(value: &Value) -> CosemResult<Self> {
        let mut collection = Self::new();
        for entry in value.as_array()? {
            let fields = entry.as_structure()?;
            if fields.len() < 3 {
                return Err(CosemError::InvalidData(format!(
                    "object list entry needs at least 3 elements, got {}",
                    fields.len()
                )));
            }
            let class = InterfaceClass::from_class_id(fields[0].as_u16()?)?;
            let version = fields[1].as_u8()?;
            let name = ObisCode::from_bytes(fields[2].as_octets()?)?;

            let mirror = RemoteObject::new(class, version, name);
            if let Some(rights) = fields.get(3) {
                mirror.apply_access_rights(rights).await?;
            }
            collection.register(Arc::new(mirror)).await?;
        }
        Ok(collection)
    }
}
