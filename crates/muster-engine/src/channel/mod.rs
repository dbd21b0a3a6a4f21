//! Channel lifecycle — creation, reminders, summary, destruction, and
//! membership reconciliation for per-game mustering channels.

pub mod controller;
pub mod reconciler;
