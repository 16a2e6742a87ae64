//! Server-side request dispatch for the COSEM object model.
//!
//! An inbound decrypted APDU names a service (Get, Set or Action), an
//! object, an attribute or method index and optionally an access
//! selector. The dispatcher resolves the object in the registry, gates
//! the call through the access-control policy, executes it and produces
//! the response APDU.

pub mod access;
pub mod apdu;
pub mod dispatcher;
pub mod request;
pub mod transport;

pub use access::{attribute_access, method_access, AuthenticationLevel};
pub use dispatcher::CosemServer;
pub use request::{
    AttributeAddress, DataAccessError, ObjectName, ServiceKind, ServiceRequest, ServiceResponse,
};
pub use transport::{roundtrip, serve, ApduLink, ChannelLink};
