//! Repository modules — one per entity, plain async functions over the pool.

pub mod bans;
pub mod channels;
pub mod credits;
pub mod games;
pub mod players;
pub mod ranks;
pub mod strikes;
pub mod users;
