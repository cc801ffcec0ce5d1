//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery lookup / request to backend:
//!     → timeouts.rs (enforce lookup / dispatch deadline)
//!     → On expiry: stage fails once, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - One attempt per stage: a resolved endpoint is never retried or swapped

pub mod timeouts;
