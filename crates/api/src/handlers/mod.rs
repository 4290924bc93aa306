//! Request handlers, grouped by resource.

pub mod files;
pub mod health;
pub mod jobs;
pub mod materials;
pub mod upload;
