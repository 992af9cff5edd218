//! Bridge between the egui shell and the tokio-backed gallery client.

pub mod commands;
pub mod runtime;
