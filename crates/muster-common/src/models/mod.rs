//! Domain models shared across Muster crates.

pub mod channel;
pub mod game;
pub mod player;
pub mod sanction;
pub mod user;

pub use channel::{ChannelPhase, GameChannel};
pub use game::{Game, GameStatus};
pub use player::{Membership, PlayerEntry};
pub use sanction::{Ban, BanKind, Strike};
pub use user::{BonusCredit, Rank, User, UserIdentity};
