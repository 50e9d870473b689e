//! Clementine Core - Shared types library.
//!
//! This crate provides common types used across all Clementine components:
//! - `client` - The SDK: transport, session, cache, and mutation layers
//! - `cli` - Command-line tool for browsing, cart operations, and administration
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs plus role and status enums
//! - [`dto`] - Wire DTOs exchanged with the Clementine REST backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod dto;
pub mod types;

pub use dto::*;
pub use types::*;
