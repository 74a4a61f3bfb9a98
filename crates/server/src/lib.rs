pub mod api;
pub mod auth;
pub mod authorize;
pub mod blob_factory;
pub mod config;
pub mod disposition;
pub mod error;
pub mod session_factory;
