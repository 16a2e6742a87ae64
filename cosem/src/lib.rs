//! COSEM data-model stack for DLMS (IEC 62056) smart metering.
//!
//! # Architecture
//!
//! This library is organized as a workspace with layered crates:
//!
//! - `cosem-core`: errors, OBIS codes, values, calendar types
//! - `cosem-axdr`: A-XDR encoding/decoding of data values
//! - `cosem-object`: the object model and interface classes
//! - `cosem-server`: access policy, service dispatch, APDU codec
//!
//! # Usage
//!
//! ```no_run
//! use cosem::object::{Register, ScalerUnit, units};
//! use cosem::server::CosemServer;
//! use cosem::{ObisCode, Value};
//! use std::sync::Arc;
//!
//! # async fn demo() -> cosem::CosemResult<()> {
//! let server = CosemServer::new();
//! server
//!     .register_object(Arc::new(Register::new(
//!         ObisCode::parse("1.0.1.8.0.255")?,
//!         Value::Unsigned32(0),
//!         ScalerUnit::new(0, units::WATT_HOUR),
//!     )))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use cosem_core::{
    BitString, ClockStatus, CosemDate, CosemDateTime, CosemError, CosemResult, CosemTime,
    ObisCode, Value, ValueKind,
};

/// A-XDR value codec.
pub mod axdr {
    pub use cosem_axdr::*;
}

/// Object model and interface classes.
pub mod object {
    pub use cosem_object::*;
}

/// Dispatch, access policy and the transport boundary.
pub mod server {
    pub use cosem_server::*;
}
