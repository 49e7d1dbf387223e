//! Tangelo Core - Shared types library.
//!
//! This crate provides common types used across all Tangelo components.
//! It contains only types and traits - no I/O, no database access, no HTTP
//! clients - which keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
