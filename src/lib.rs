//! FRONTRUN: front-run decision core
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod contracts;
pub mod strategy;
pub mod engine;
