//! Utility modules shared across layers.
//!
//! - [`code_generator`] - Short code generation and shape validation
//! - [`url_validator`] - Absolute http(s) URL validation
//! - [`db_error`] - PostgreSQL error classification

pub mod code_generator;
pub mod db_error;
pub mod url_validator;
