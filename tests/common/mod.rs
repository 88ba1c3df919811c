//! Common test utilities and fixtures for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: backend response bodies and on-disk credential layouts
//! - `log_capture`: tracing capture for asserting on emitted logs
//! - `logger`: phase-tracking test logger

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
pub mod logger;
