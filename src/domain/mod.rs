//! Domain layer: entities and the store contract.
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Data access trait definitions
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; orchestration lives in [`crate::application::services`].

pub mod entities;
pub mod repositories;
