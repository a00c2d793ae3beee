//! # Strata Core
//!
//! Core types, traits, and error definitions for Strata.
//! This crate provides the pagination value objects, the persistence
//! capability used to fill them, and the error taxonomy shared by the
//! cache, configuration and security crates.

pub mod error;
pub mod pagination;
pub mod result;
pub mod telemetry;
pub mod traits;

pub use error::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
