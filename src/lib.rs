//! PADDOCK: racing analytics API.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod access;
pub mod data;
pub mod llm;
pub mod engine;
pub mod api;
