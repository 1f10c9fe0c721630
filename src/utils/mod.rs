//! Utility functions and helpers for the phishlens service.
//!
//! - `logging`: Tracing and logging initialization with security filters.

pub mod logging;
