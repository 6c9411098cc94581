//! Configuration module
//!
//! This module contains configuration structures and loading logic.

pub mod app_config;

pub use app_config::AppConfig;
