//! The access-control policy consulted before every dispatched call.
//!
//! The policy is a pure function of the authentication level and the
//! target's interface class; the dispatcher combines its verdict with the
//! object's own attribute metadata, the stricter side winning.

use cosem_object::{AccessMode, InterfaceClass, MethodAccess};

/// Authentication level negotiated for the association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthenticationLevel {
    /// No authentication.
    None,
    /// Low-level secret (password) authentication.
    Low,
    /// High-level (challenge) authentication.
    High,
}

/// Attribute access granted by the server policy:
/// - `None`: read only, everywhere;
/// - `Low`: read-write on the Clock, read elsewhere;
/// - `High`: read-write everywhere.
pub fn attribute_access(
    level: AuthenticationLevel,
    class: InterfaceClass,
    _index: u8,
) -> AccessMode {
    match level {
        AuthenticationLevel::None => AccessMode::Read,
        AuthenticationLevel::Low => {
            if class == InterfaceClass::Clock {
                AccessMode::ReadWrite
            } else {
                AccessMode::Read
            }
        }
        AuthenticationLevel::High => AccessMode::ReadWrite,
    }
}

/// Method access granted by the server policy: none without
/// authentication, Clock methods only at low level, everything at high.
pub fn method_access(
    level: AuthenticationLevel,
    class: InterfaceClass,
    _index: u8,
) -> MethodAccess {
    match level {
        AuthenticationLevel::None => MethodAccess::NoAccess,
        AuthenticationLevel::Low => {
            if class == InterfaceClass::Clock {
                MethodAccess::Access
            } else {
                MethodAccess::NoAccess
            }
        }
        AuthenticationLevel::High => MethodAccess::Access,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_authentication_reads_everywhere() {
        for class in [
            InterfaceClass::Data,
            InterfaceClass::Register,
            InterfaceClass::Clock,
            InterfaceClass::ProfileGeneric,
            InterfaceClass::AssociationLn,
            InterfaceClass::SecuritySetup,
        ] {
            for index in 1..=8 {
                assert_eq!(
                    attribute_access(AuthenticationLevel::None, class, index),
                    AccessMode::Read
                );
                assert_eq!(
                    method_access(AuthenticationLevel::None, class, index),
                    MethodAccess::NoAccess
                );
            }
        }
    }

    #[test]
    fn low_level_writes_only_the_clock() {
        assert_eq!(
            attribute_access(AuthenticationLevel::Low, InterfaceClass::Clock, 2),
            AccessMode::ReadWrite
        );
        assert_eq!(
            attribute_access(AuthenticationLevel::Low, InterfaceClass::Register, 2),
            AccessMode::Read
        );
        assert_eq!(
            method_access(AuthenticationLevel::Low, InterfaceClass::Clock, 1),
            MethodAccess::Access
        );
        assert_eq!(
            method_access(AuthenticationLevel::Low, InterfaceClass::Register, 1),
            MethodAccess::NoAccess
        );
    }

    #[test]
    fn high_level_has_full_access() {
        assert_eq!(
            attribute_access(AuthenticationLevel::High, InterfaceClass::Register, 2),
            AccessMode::ReadWrite
        );
        assert_eq!(
            method_access(AuthenticationLevel::High, InterfaceClass::ProfileGeneric, 2),
            MethodAccess::Access
        );
    }
}
