//! The service request/response model consumed by the dispatcher.

use cosem_core::{CosemError, ObisCode, Value};
use cosem_object::SelectiveAccess;
use std::fmt;

/// How the request names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectName {
    Logical(ObisCode),
    Short(u16),
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectName::Logical(obis) => write!(f, "{obis}"),
            ObjectName::Short(sn) => write!(f, "sn {sn:#06x}"),
        }
    }
}

/// Target of a Get/Set/Action: class, name and 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeAddress {
    pub class_id: u16,
    pub name: ObjectName,
    pub index: u8,
}

impl AttributeAddress {
    pub fn logical(class_id: u16, obis: ObisCode, index: u8) -> Self {
        Self {
            class_id,
            name: ObjectName::Logical(obis),
            index,
        }
    }
}

/// The three confirmed services this stack dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Get,
    Set,
    Action,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    Get {
        address: AttributeAddress,
        access: Option<SelectiveAccess>,
    },
    Set {
        address: AttributeAddress,
        access: Option<SelectiveAccess>,
        value: Value,
    },
    Action {
        address: AttributeAddress,
        parameters: Option<Value>,
    },
}

impl ServiceRequest {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceRequest::Get { .. } => ServiceKind::Get,
            ServiceRequest::Set { .. } => ServiceKind::Set,
            ServiceRequest::Action { .. } => ServiceKind::Action,
        }
    }

    pub fn address(&self) -> &AttributeAddress {
        match self {
            ServiceRequest::Get { address, .. }
            | ServiceRequest::Set { address, .. }
            | ServiceRequest::Action { address, .. } => address,
        }
    }
}

/// Negative outcome codes, byte-exact to the data-access-result
/// enumeration of the standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAccessError {
    HardwareFault,
    TemporaryFailure,
    ReadWriteDenied,
    ObjectUndefined,
    ObjectClassInconsistent,
    ObjectUnavailable,
    TypeUnmatched,
    ScopeOfAccessViolated,
    OtherReason,
}

impl DataAccessError {
    pub fn code(&self) -> u8 {
        match self {
            DataAccessError::HardwareFault => 1,
            DataAccessError::TemporaryFailure => 2,
            DataAccessError::ReadWriteDenied => 3,
            DataAccessError::ObjectUndefined => 4,
            DataAccessError::ObjectClassInconsistent => 9,
            DataAccessError::ObjectUnavailable => 11,
            DataAccessError::TypeUnmatched => 12,
            DataAccessError::ScopeOfAccessViolated => 13,
            DataAccessError::OtherReason => 250,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => DataAccessError::HardwareFault,
            2 => DataAccessError::TemporaryFailure,
            3 => DataAccessError::ReadWriteDenied,
            4 => DataAccessError::ObjectUndefined,
            9 => DataAccessError::ObjectClassInconsistent,
            11 => DataAccessError::ObjectUnavailable,
            12 => DataAccessError::TypeUnmatched,
            13 => DataAccessError::ScopeOfAccessViolated,
            _ => DataAccessError::OtherReason,
        }
    }
}

impl From<&CosemError> for DataAccessError {
    fn from(error: &CosemError) -> Self {
        match error {
            CosemError::InvalidAttributeIndex { .. } | CosemError::InvalidMethodIndex { .. } => {
                DataAccessError::ObjectUndefined
            }
            CosemError::AccessDenied(_) => DataAccessError::ReadWriteDenied,
            CosemError::Decode(_) | CosemError::InvalidData(_) | CosemError::Encode(_) => {
                DataAccessError::TypeUnmatched
            }
            CosemError::InvalidLogicalName(_) => DataAccessError::TypeUnmatched,
            CosemError::Protocol(_) => DataAccessError::OtherReason,
        }
    }
}

/// Outcome of one dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    /// Successful Get: the attribute value.
    Data(Value),
    /// Successful Set.
    Success,
    /// Successful Action, possibly with return parameters.
    ActionData(Option<Value>),
    /// A protocol-level negative response; never an empty value.
    Error(DataAccessError),
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        !matches!(self, ServiceResponse::Error(_))
    }
}
