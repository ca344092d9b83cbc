//! Typeshift - file-format conversion relay
//!
//! This library crate exposes the server, auth and config layers for integration testing.

pub mod auth;
pub mod config;
pub mod server;
