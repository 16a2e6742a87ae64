//! Security Setup interface class (class id 64).
//!
//! Holds the association's security policy, suite and system titles. The
//! ciphering itself happens outside this stack; this object only carries
//! the configuration.
//!
//! Attributes: 1 logical_name, 2 security_policy, 3 security_suite,
//! 4 client_system_title, 5 server_system_title.
//! Methods: 1 security_activate.

use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::selective::SelectiveAccess;
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult, ObisCode, Value};
use tokio::sync::RwLock;

/// Security policy levels, ordered: activating a policy never lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityPolicy {
    Nothing,
    Authenticated,
    Encrypted,
    AuthenticatedAndEncrypted,
}

impl SecurityPolicy {
    pub fn code(&self) -> u8 {
        match self {
            SecurityPolicy::Nothing => 0,
            SecurityPolicy::Authenticated => 1,
            SecurityPolicy::Encrypted => 2,
            SecurityPolicy::AuthenticatedAndEncrypted => 3,
        }
    }

    pub fn from_code(code: u8) -> CosemResult<Self> {
        match code {
            0 => Ok(SecurityPolicy::Nothing),
            1 => Ok(SecurityPolicy::Authenticated),
            2 => Ok(SecurityPolicy::Encrypted),
            3 => Ok(SecurityPolicy::AuthenticatedAndEncrypted),
            other => Err(CosemError::InvalidData(format!(
                "unknown security policy {other}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct SecuritySetup {
    core: ObjectCore,
    policy: RwLock<SecurityPolicy>,
    suite: RwLock<u8>,
    client_system_title: RwLock<Vec<u8>>,
    server_system_title: RwLock<Vec<u8>>,
}

impl SecuritySetup {
    pub const ATTRIBUTE_COUNT: u8 = 5;
    pub const METHOD_COUNT: u8 = 1;
    pub const METHOD_SECURITY_ACTIVATE: u8 = 1;

    /// The conventional security-setup name 0-0:43.0.0.255.
    pub fn default_name() -> ObisCode {
        ObisCode::new(0, 0, 43, 0, 0, 255)
    }

    pub fn new(logical_name: ObisCode, server_system_title: Vec<u8>) -> Self {
        Self {
            core: ObjectCore::new(InterfaceClass::SecuritySetup, 0, Some(logical_name)),
            policy: RwLock::new(SecurityPolicy::Nothing),
            suite: RwLock::new(0),
            client_system_title: RwLock::new(Vec::new()),
            server_system_title: RwLock::new(server_system_title),
        }
    }

    pub async fn policy(&self) -> SecurityPolicy {
        *self.policy.read().await
    }

    /// Raise the policy. Lowering an active policy is refused.
    pub async fn activate(&self, requested: SecurityPolicy) -> CosemResult<()> {
        let mut policy = self.policy.write().await;
        if requested < *policy {
            return Err(CosemError::AccessDenied(format!(
                "security policy cannot drop from {:?} to {requested:?}",
                *policy
            )));
        }
        *policy = requested;
        Ok(())
    }
}

#[async_trait]
impl CosemObject for SecuritySetup {
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
            2 => Value::Enum(self.policy.read().await.code()),
            3 => Value::Enum(*self.suite.read().await),
            4 => Value::OctetString(self.client_system_title.read().await.clone()),
            _ => Value::OctetString(self.server_system_title.read().await.clone()),
        })
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => self.core.apply_logical_name_value(&value).await?,
            2 => *self.policy.write().await = SecurityPolicy::from_code(value.as_u8()?)?,
            3 => *self.suite.write().await = value.as_u8()?,
            4 => *self.client_system_title.write().await = value.as_octets()?.to_vec(),
            _ => *self.server_system_title.write().await = value.as_octets()?.to_vec(),
        }
        Ok(())
    }

    async fn invoke(&self, index: u8, parameters: Option<Value>) -> CosemResult<Option<Value>> {
        self.core.check_method_index(index, self.method_count())?;
        let requested = parameters
            .ok_or_else(|| CosemError::InvalidData("missing security policy parameter".into()))?
            .as_u8()?;
        self.activate(SecurityPolicy::from_code(requested)?).await?;
        Ok(None)
    }
}
