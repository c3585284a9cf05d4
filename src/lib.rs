//! AOTS: Automated moving-average tier scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod market;
pub mod engine;
pub mod notify;
pub mod health;
