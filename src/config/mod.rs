//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading (Config, QueueConfig, ParametersConfig, ...)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks over a loaded config

mod defaults;
mod types;
pub mod validation;

pub use types::{
    Config, ConfigError, HttpConfig, LocalConfig, LogFormat, ParametersConfig, QueueConfig,
    RestartConfig, ServiceConfig, ShutdownConfig,
};
