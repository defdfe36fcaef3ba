//! Shared types for the sketch2solve coaching backend
//!
//! Holds the error type, the persisted data model, and the per-session
//! event channel used by every part of the service.

pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
