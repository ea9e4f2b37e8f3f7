//! World-level persisted state.
//!
//! Stored next to the chunk files as a one-element record `[tick]`, using
//! the same array-wrapped layout as the chunk records.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Global simulation state saved with a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldState {
    /// Number of simulation ticks elapsed.
    pub tick: u64,
}

impl WorldState {
    /// Creates a state at the given tick.
    pub fn new(tick: u64) -> Self {
        Self { tick }
    }

    /// Moves to the next tick and returns it.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

impl Serialize for WorldState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.tick,).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WorldState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tick,) = <(u64,)>::deserialize(deserializer)?;
        Ok(Self { tick })
    }
}
