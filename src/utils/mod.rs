//! Utility modules for GreenChoice
//!
//! Configuration, error types and logging setup shared by the library and the binary.

pub mod config;
pub mod error;
pub mod logger;
