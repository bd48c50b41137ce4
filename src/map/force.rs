//! Faction state: holdings, armies, and the command-point budget.
//!
//! A force never disappears mid-session; it is merely "not alive" once it
//! holds no province and fields no army. Income and capital recomputation
//! that need the province arena live on [`crate::map::Map`].

use crate::ai::Director;

use super::{ArmyId, ForceId, ProvinceId};

/// Command-point cost of one AI/player operation (develop, fortify,
/// attract, legitimize, recruit-5).
pub const OPERATION_COST: i32 = 5;

/// Command-point cost of raising a new army.
pub const BUILD_ARMY_COST: i32 = 1;

/// A playable or AI faction.
#[derive(Debug, Clone)]
pub struct Force {
    pub id: ForceId,
    pub nickname: String,
    pub color: [u8; 3],
    pub capital: ProvinceId,
    pub provinces: Vec<ProvinceId>,
    pub armies: Vec<ArmyId>,
    pub command_points: i32,
    pub max_armies: i32,
    pub is_player: bool,
    pub director: Option<Director>,
}

impl Force {
    pub fn new(id: ForceId, nickname: String, color: [u8; 3], capital: ProvinceId) -> Self {
        Force {
            id,
            nickname,
            color,
            capital,
            provinces: Vec::new(),
            armies: Vec::new(),
            command_points: 0,
            max_armies: 1,
            is_player: false,
            director: None,
        }
    }

    /// A force is alive while it owns a province or fields an army.
    pub fn is_alive(&self) -> bool {
        !self.provinces.is_empty() || !self.armies.is_empty()
    }

    /// Spends command points if the budget allows. Never goes negative.
    pub fn spend(&mut self, cost: i32) -> bool {
        if self.command_points < cost {
            return false;
        }
        self.command_points -= cost;
        true
    }
}
