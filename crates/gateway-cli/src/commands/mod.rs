//! CLI commands module.

pub mod chat;
pub mod completions;
pub mod config;
pub mod models;
pub mod monitor;
pub mod verify;
