// Panache as a library: the binary and the integration tests both build on it.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod image_host;
pub mod routes;
pub mod state;
pub mod upload;
