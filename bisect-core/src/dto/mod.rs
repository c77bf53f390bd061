//! Data Transfer Objects
//!
//! This module contains the request shapes accepted over the wire. They are
//! deserialized only after the schema validator has accepted the raw input,
//! so their serde errors never reach clients in normal operation.

pub mod job;
pub mod patch;
