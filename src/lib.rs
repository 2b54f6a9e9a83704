//! Remote Config Sync Library
//!
//! This module exports the core components for testing and integration.

pub mod assembler;
pub mod cli;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod store;
pub mod tree;
pub mod types;
