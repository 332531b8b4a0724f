//! Treasure fixtures.

use anyhow::{bail, Context, Result};
use fake::faker::boolean::en::Boolean;
use fake::faker::lorem::en::Paragraph;
use fake::Fake;
use sqlx::PgPool;

use crate::models::{DragonTreasure, User};
use crate::repository;

/// Names the generated treasures are drawn from. All fit the 2..=50 character bound.
pub const TREASURE_NAMES: &[&str] = &[
    "pile of gold coins",
    "diamond-encrusted throne",
    "rare magic staff",
    "enchanted sword",
    "set of intricately crafted goblets",
    "collection of ancient tomes",
    "hoard of shiny gemstones",
    "chest filled with priceless works of art",
    "giant pearl",
    "crown made of pure platinum",
    "giant egg (possibly a dragon egg?)",
    "set of ornate armor",
    "statue carved from a single block of marble",
    "box of mismatched socks",
    "giant jar of pickles",
    "collection of novelty mugs with funny sayings",
    "giant slinky",
];

/// Builds and persists randomized, valid treasures.
pub struct TreasureFactory;

impl TreasureFactory {
    /// A random treasure owned by `owner`.
    pub fn instantiate(owner: User) -> DragonTreasure {
        let index: usize = (0..TREASURE_NAMES.len()).fake();
        let description: String = Paragraph(1..4).fake();
        let value: i32 = (0..1_000_001).fake();
        let cool_factor: i32 = (0..11).fake();
        let is_published: bool = Boolean(70).fake();

        let mut treasure = DragonTreasure::new();
        treasure
            .set_name(TREASURE_NAMES[index])
            .set_text_description(&description)
            .set_value(value)
            .set_cool_factor(cool_factor)
            .set_is_published(is_published)
            .set_owner(Some(owner));
        treasure
    }

    /// Persists a random treasure and returns it as stored.
    pub async fn create_one(pool: &PgPool, owner: User) -> Result<DragonTreasure> {
        let treasure = Self::instantiate(owner);
        let id = repository::insert_treasure(pool, &treasure)
            .await
            .context("Failed to insert fixture treasure")?;
        repository::fetch_treasure(pool, id)
            .await?
            .with_context(|| format!("Fixture treasure {} vanished after insert", id))
    }

    /// Persists `count` treasures, each owned by a random user from `owners`.
    pub async fn create_many(
        pool: &PgPool,
        count: usize,
        owners: &[User],
    ) -> Result<Vec<DragonTreasure>> {
        if owners.is_empty() && count > 0 {
            bail!("Cannot create treasures without at least one owner");
        }
        let mut treasures = Vec::with_capacity(count);
        for _ in 0..count {
            let index: usize = (0..owners.len()).fake();
            treasures.push(Self::create_one(pool, owners[index].clone()).await?);
        }
        Ok(treasures)
    }
}
