//! dlock server - HTTP surface, configuration, and startup for a lock node

pub mod api;
pub mod model;
pub mod startup;
