//! logship command-line library.
//!
//! Exposes the CLI modules for integration testing.
//! In production, `logship` is used as a binary (main.rs).

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics_server;
pub mod output;
