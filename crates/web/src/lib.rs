//! TechLog web application library.
//!
//! The blog is served by the `techlog-web` binary; everything it needs lives
//! here so the router can be built and tested without a network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
