//! Battle and siege records for presentation.
//!
//! The resolver pushes one report per engagement onto the map. Reports are a
//! pure side channel: nothing in the simulation reads them back.

use crate::map::{ForceId, ProvinceId};

/// What kind of engagement a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleKind {
    Field,
    Siege,
}

/// How an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    AttackerWon,
    DefenderWon,
    Captured,
    Repulsed,
}

/// One CRT round (or one siege attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleRound {
    pub roll: i32,
    pub row: i32,
    pub column: usize,
    /// Sizes entering the round. For sieges the defender side carries the
    /// remaining defense value instead.
    pub attacker_size: i32,
    pub defender_size: i32,
    pub attacker_losses: i32,
    pub defender_losses: i32,
}

/// Round-by-round record of a single engagement.
#[derive(Debug, Clone)]
pub struct BattleReport {
    pub kind: BattleKind,
    pub province: ProvinceId,
    pub attacker: ForceId,
    pub defender: ForceId,
    pub rounds: Vec<BattleRound>,
    pub outcome: BattleOutcome,
}
