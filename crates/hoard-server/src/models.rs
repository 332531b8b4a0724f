//! Database models for the treasure hoard.

pub mod treasure;
pub mod user;

pub use treasure::{DragonTreasure, TREASURE_COLUMNS};
pub use user::{NewUser, User, UserWithTreasures};
