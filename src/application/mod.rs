//! Application layer: the shortening pipeline.
//!
//! Services consume the store and cache traits and expose the two operations
//! the HTTP layer needs. Work that must outlive a request runs on the
//! bounded [`background::BackgroundTasks`] runner.
//!
//! # Available Services
//!
//! - [`services::DefaultUrlService`] - Store-backed shortening and redirects
//! - [`services::CachedUrlService`] - Cache-aside decorator for redirects

pub mod background;
pub mod services;
