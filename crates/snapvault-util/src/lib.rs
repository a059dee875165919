//! Shared utilities for snapvault.
//!
//! This crate provides common utilities used across the snapvault workspace:
//! - Logging setup with tracing
//! - Slash-form relative path helpers
//! - RAII-based timing for long-running filesystem operations

pub mod log;
pub mod path;
pub mod timing;

pub use timing::TimingGuard;
