//! Bisect Core
//!
//! Core types and abstractions for the bisect broker.
//!
//! This crate contains:
//! - Domain types: the job record and its enumerations
//! - DTOs: request shapes accepted over the wire
//! - Schema: the attribute registry, input validation and filter coercion

pub mod domain;
pub mod dto;
pub mod schema;
