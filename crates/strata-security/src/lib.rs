//! # Strata Security
//!
//! Request-scoped security context: the authenticated principal and the
//! provider trait used to look it up.

pub mod context;
pub mod principal;

pub use context::*;
pub use principal::*;
