// Hoard Auth - Password hashing for the dragon treasure hoard

pub mod hasher;

pub use hasher::{Argon2Hasher, PasswordHasher};
