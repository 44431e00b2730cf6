//! # ClassHub Common Library
//!
//! Shared code for the ClassHub services:
//! - Database schema, initialization and row models
//! - Role model and authorization predicates
//! - Attendance and submission statistics
//! - Notification events and SSE helpers
//! - Configuration loading and root folder resolution
//! - Request identity verification primitives

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod roles;
pub mod sse;
pub mod stats;
pub mod time;

pub use error::{Error, Result};
pub use roles::Role;
