//! Type system utilities and aliases.
//!
//! This module provides type aliases and utilities for commonly used
//! callback and shared-state types.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>` and step callbacks.

pub mod aliases;

pub use aliases::*;
