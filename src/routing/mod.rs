//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → authorizer.rs (strip port, allow-list lookup)
//!     → Return: service name or Rejected
//! ```
//!
//! # Design Decisions
//! - Allow-list built at startup, immutable at runtime
//! - Deterministic: same host always yields the same decision

pub mod authorizer;

pub use authorizer::{AllowList, Rejected};
