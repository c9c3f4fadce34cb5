//! Shared utilities for Agora.

pub mod logger;
pub mod time;
