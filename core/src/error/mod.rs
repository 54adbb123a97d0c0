//! Error types shared across the access layer.

pub use access_error::AccessError;

pub mod access_error;
