//! Infrastructure layer for external integrations.
//!
//! Implements the store and cache traits against PostgreSQL and Redis, plus
//! in-process variants used for local runs and tests.
//!
//! # Modules
//!
//! - [`cache`] - Cache implementations (Redis and in-memory)
//! - [`persistence`] - Store implementations (PostgreSQL and in-memory)

pub mod cache;
pub mod persistence;
