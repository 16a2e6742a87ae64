//! Core types for the COSEM data model.
//!
//! This crate holds the protocol-independent building blocks shared by the
//! rest of the stack: the error type, OBIS codes, the recursive [`Value`]
//! tree, bit strings and the COSEM calendar types.

pub mod calendar;
pub mod error;
pub mod obis;
pub mod value;

mod bitstring;

pub use bitstring::BitString;
pub use calendar::{ClockStatus, CosemDate, CosemDateTime, CosemTime};
pub use error::{CosemError, CosemResult};
pub use obis::ObisCode;
pub use value::{Value, ValueKind};
