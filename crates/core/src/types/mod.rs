//! Core types for TechLog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod article;
pub mod email;
pub mod id;
pub mod role;

pub use article::{ArticleDraft, DraftError};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::Role;
