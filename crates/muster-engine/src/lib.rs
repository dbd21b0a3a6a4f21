//! # muster-engine
//!
//! The game lifecycle and waitlist reconciliation engine: eligibility,
//! credit accounting, sanctions, the per-game roster with its promotion
//! algorithm, the time-driven game and channel lifecycles, membership
//! reconciliation against the chat platform, and the periodic scheduler
//! that drives it all.
//!
//! Decision logic is pure and synchronous (unit-testable without a
//! database); the async functions around it only load snapshots, hold the
//! per-game lock, and apply the decisions.

pub mod channel;
pub mod credit;
pub mod eligibility;
pub mod lifecycle;
pub mod roster;
pub mod sanctions;
pub mod scheduler;

use muster_common::error::MusterError;
use muster_platform::PlatformError;

/// Lift a platform failure into the shared error type. The platform crate
/// cannot be a muster-common dependency (it depends on muster-common), so
/// the conversion lives here at the first consumer.
pub(crate) fn platform_err(e: PlatformError) -> MusterError {
    MusterError::Platform(e.to_string())
}
