//! Configuration and HTTP response models

pub mod config;
pub mod response;

pub use config::{Cli, Configuration};
