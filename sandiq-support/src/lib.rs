//! # Sandiq Support
//!
//! Shared utilities for the Sandiq IoC container.
//!
//! This crate provides:
//! - Text rendering for error messages (chains, cycle diagrams, suggestions)
//! - Component name validation

pub mod naming;
pub mod rendering;
