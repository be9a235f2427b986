//! Pulseboard: analytics backend for a social-media dashboard.
//!
//! The service fronts an external evaluation API. It injects a bearer token
//! into proxied calls and hosts the top-users ranking pipeline behind a
//! typed JSON API.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
