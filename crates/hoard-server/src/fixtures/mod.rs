//! Randomized fixture factories for tests and seed data.

pub mod treasure_factory;
pub mod user_factory;

pub use treasure_factory::TreasureFactory;
pub use user_factory::UserFactory;
