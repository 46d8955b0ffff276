//! sqlscope
//!
//! Validates SQL query strings embedded at application call sites against a live
//! database schema, then reconciles the query's parameters and output columns
//! with what the call site supplies and expects.
//!
//! - `core` - application bootstrap, CLI, configuration, constants
//! - `data` - validation-result caching, validation providers, error type
//! - `domain` - call-site model, analyzers, reconciler, registry, driver

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
