//! Per-attribute and per-method access metadata.

use cosem_core::{CosemError, CosemResult, ValueKind};
use std::time::SystemTime;

/// Access mode of a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    NoAccess,
    Read,
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(&self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }

    /// The attribute_access_mode enumeration code of the association
    /// object list (no_access 0, read 1, write 2, read_write 3).
    pub fn code(&self) -> u8 {
        match self {
            AccessMode::NoAccess => 0,
            AccessMode::Read => 1,
            AccessMode::ReadWrite => 3,
        }
    }

    pub fn from_code(code: u8) -> CosemResult<Self> {
        match code {
            0 => Ok(AccessMode::NoAccess),
            1 => Ok(AccessMode::Read),
            // Write-only collapses onto read-write in this model.
            2 | 3 => Ok(AccessMode::ReadWrite),
            other => Err(CosemError::InvalidData(format!(
                "unknown access mode code {other}"
            ))),
        }
    }

    /// The stricter of two modes.
    pub fn min(self, other: AccessMode) -> AccessMode {
        use AccessMode::*;
        match (self, other) {
            (NoAccess, _) | (_, NoAccess) => NoAccess,
            (Read, _) | (_, Read) => Read,
            (ReadWrite, ReadWrite) => ReadWrite,
        }
    }
}

/// Access mode of a single method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAccess {
    NoAccess,
    Access,
}

impl MethodAccess {
    pub fn allowed(&self) -> bool {
        matches!(self, MethodAccess::Access)
    }

    pub fn code(&self) -> u8 {
        match self {
            MethodAccess::NoAccess => 0,
            MethodAccess::Access => 1,
        }
    }

    pub fn from_code(code: u8) -> CosemResult<Self> {
        match code {
            0 => Ok(MethodAccess::NoAccess),
            // Authenticated-access codes also grant access here.
            1 | 2 => Ok(MethodAccess::Access),
            other => Err(CosemError::InvalidData(format!(
                "unknown method access code {other}"
            ))),
        }
    }
}

/// Metadata kept for one attribute index.
///
/// An absent entry behaves like the default: read-write, undeclared types,
/// not static, never read. Absence must never act as a deny.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeMetadata {
    pub access: AccessMode,
    /// Declared wire type of the attribute value.
    pub data_type: ValueKind,
    /// Display-time reinterpretation, e.g. a raw OCTET_STRING re-shown as
    /// DATETIME.
    pub ui_type: ValueKind,
    /// Static attributes are read once and then served from cache.
    pub is_static: bool,
    pub last_read: Option<SystemTime>,
}

impl Default for AttributeMetadata {
    fn default() -> Self {
        Self {
            access: AccessMode::ReadWrite,
            data_type: ValueKind::DontCare,
            ui_type: ValueKind::DontCare,
            is_static: false,
            last_read: None,
        }
    }
}

impl AttributeMetadata {
    pub fn read_only() -> Self {
        Self {
            access: AccessMode::Read,
            ..Default::default()
        }
    }

    pub fn with_access(access: AccessMode) -> Self {
        Self {
            access,
            ..Default::default()
        }
    }

    pub fn typed(data_type: ValueKind) -> Self {
        Self {
            data_type,
            ..Default::default()
        }
    }

    /// The kind buffer columns and display layers should use: the UI type
    /// when declared, otherwise the wire type.
    pub fn effective_kind(&self) -> ValueKind {
        if self.ui_type != ValueKind::DontCare {
            self.ui_type
        } else {
            self.data_type
        }
    }
}

/// Metadata kept for one method index. Defaults to accessible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodMetadata {
    pub access: MethodAccess,
}

impl Default for MethodMetadata {
    fn default() -> Self {
        Self {
            access: MethodAccess::Access,
        }
    }
}
