//! Ad Service - CRUD over classified ads with cache-aside reads
//!
//! A relational store holds the ads; a key-value cache fronts single-ad reads
//! and the default landing page.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod service;
pub mod store;
pub mod tasks;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

pub use api::{create_router, AppState};
pub use config::Config;
pub use repository::{AdRepository, CachedAdRepository};
pub use service::{AdService, AdServiceImpl, ServiceError};
pub use tasks::spawn_cleanup_task;
