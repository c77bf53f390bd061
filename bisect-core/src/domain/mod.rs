//! Core domain types
//!
//! This module contains the domain structures shared between the broker
//! (which stores them) and worker bots (which report progress into them).

pub mod job;
