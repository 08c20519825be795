//! Data models for tokens, bills and configuration.

pub mod bill;
pub mod config;
pub mod token;
