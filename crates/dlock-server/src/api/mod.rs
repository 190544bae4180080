//! HTTP API for the lock node

pub mod lock;

pub use lock::routes;
