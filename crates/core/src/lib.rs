//! TechLog Core - Shared types library.
//!
//! This crate provides the domain types used across TechLog components:
//! - `web` - The blog itself (public pages, writing, admin dashboard)
//! - `cli` - Operator commands (seeding, connectivity checks)
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. Everything persistent lives in the hosted backend; these types
//! describe the rows the application reads and writes there.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles and article drafts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
