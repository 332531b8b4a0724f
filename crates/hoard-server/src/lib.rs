//! Hoard Server - REST API for dragon treasures
//!
//! Treasures and their owners are stored in PostgreSQL and exposed under
//! `/api` through per-operation exposure groups, declared validation
//! constraints, collection filters and fixed-size pagination.

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod fixtures;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod security;
pub mod serializer;
pub mod validation;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::{create_router, serve};
