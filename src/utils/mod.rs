// Shared utilities: configuration, errors, logging and small fs helpers
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod logging;
pub mod validation;
