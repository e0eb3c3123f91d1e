//! Core library components.
//!
//! This module contains the reusable business logic for encryption at rest,
//! .env parsing, schema validation, and environment diffing.

pub mod config;
pub mod constants;
pub mod crypto;
pub mod detect;
pub mod diff;
pub mod env;
pub mod rotation;
pub mod schema;
