//! Request dispatch: registry lookup, policy gate, object call.

use crate::access::{attribute_access, method_access, AuthenticationLevel};
use crate::request::{DataAccessError, ObjectName, ServiceRequest, ServiceResponse};
use cosem_core::CosemResult;
use cosem_object::{CosemObject, ObjectCollection};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The server-side engine: owns the object registry and executes
/// dispatched service requests under the access-control policy.
pub struct CosemServer {
    objects: Arc<RwLock<ObjectCollection>>,
}

impl CosemServer {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(ObjectCollection::new())),
        }
    }

    /// The shared registry, e.g. for an Association LN object publishing
    /// the object list, or for a periodic capture task.
    pub fn collection(&self) -> Arc<RwLock<ObjectCollection>> {
        self.objects.clone()
    }

    pub async fn register_object(&self, object: Arc<dyn CosemObject>) -> CosemResult<()> {
        self.objects.write().await.register(object).await?;
        Ok(())
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Execute one request at the given authentication level.
    ///
    /// Every failure maps to a distinct negative response; a denied access
    /// is never served as an empty value.
    pub async fn dispatch(
        &self,
        request: &ServiceRequest,
        level: AuthenticationLevel,
    ) -> ServiceResponse {
        let objects = self.objects.read().await;
        let address = request.address();
        let object = match address.name {
            ObjectName::Logical(obis) => objects.find(&obis),
            ObjectName::Short(short_name) => objects.find_by_short_name(short_name),
        };
        let Some(object) = object else {
            log::debug!("{}: object not found", address.name);
            return ServiceResponse::Error(DataAccessError::ObjectUnavailable);
        };
        if object.interface_class().class_id() != address.class_id {
            log::debug!(
                "{}: class {} requested, object is {}",
                address.name,
                address.class_id,
                object.interface_class().class_id()
            );
            return ServiceResponse::Error(DataAccessError::ObjectClassInconsistent);
        }

        match request {
            ServiceRequest::Get { access, .. } => {
                let granted = attribute_access(level, object.interface_class(), address.index)
                    .min(object.core().attribute(address.index).await.access);
                if !granted.can_read() {
                    log::debug!("{} attr {}: read denied", address.name, address.index);
                    return ServiceResponse::Error(DataAccessError::ReadWriteDenied);
                }
                match object.get_attribute(address.index, access.as_ref()).await {
                    Ok(value) => {
                        object.core().mark_attribute_read(address.index).await;
                        ServiceResponse::Data(value)
                    }
                    Err(error) => {
                        log::debug!("{} attr {}: {error}", address.name, address.index);
                        ServiceResponse::Error(DataAccessError::from(&error))
                    }
                }
            }
            ServiceRequest::Set { value, .. } => {
                let granted = attribute_access(level, object.interface_class(), address.index)
                    .min(object.core().attribute(address.index).await.access);
                if !granted.can_write() {
                    log::debug!("{} attr {}: write denied", address.name, address.index);
                    return ServiceResponse::Error(DataAccessError::ReadWriteDenied);
                }
                match object.set_attribute(address.index, value.clone()).await {
                    Ok(()) => ServiceResponse::Success,
                    Err(error) => {
                        log::debug!("{} attr {}: {error}", address.name, address.index);
                        ServiceResponse::Error(DataAccessError::from(&error))
                    }
                }
            }
            ServiceRequest::Action { parameters, .. } => {
                let granted = method_access(level, object.interface_class(), address.index);
                if !granted.allowed()
                    || !object.core().method(address.index).await.access.allowed()
                {
                    log::debug!("{} method {}: denied", address.name, address.index);
                    return ServiceResponse::Error(DataAccessError::ScopeOfAccessViolated);
                }
                match object
                    .invoke_with_collection(address.index, parameters.clone(), &objects)
                    .await
                {
                    Ok(return_parameters) => ServiceResponse::ActionData(return_parameters),
                    Err(error) => {
                        log::debug!("{} method {}: {error}", address.name, address.index);
                        ServiceResponse::Error(DataAccessError::from(&error))
                    }
                }
            }
        }
    }
}

impl Default for CosemServer {
    fn default() -> Self {
        Self::new()
    }
}
