//! # muster-common
//!
//! Shared types and utilities for Muster: domain models, configuration,
//! the central error type, validation helpers, and id generation.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod snowflake;
pub mod validation;
