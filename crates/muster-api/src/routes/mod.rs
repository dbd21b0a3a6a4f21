//! API route modules.

pub mod games;
pub mod health;
pub mod sanctions;
pub mod users;
