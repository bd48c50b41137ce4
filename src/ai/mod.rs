//! The AI director: one per non-player force.
//!
//! A director's turn is a fixed pipeline — pick or keep a target, value the
//! holdings, raise armies, sweep the weighted operation table, spend the
//! residual budget on recruitment, hand out movement orders, then react to
//! any siege in progress by retargeting the besieger. Everything is
//! recomputed from the map each turn; the director itself carries almost no
//! state between turns.

pub mod movement;
pub mod operations;
pub mod valuation;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::map::{ForceId, Map};
use crate::rng::GameRng;

/// Own army total at or above which the director picks on the strongest
/// neighbor instead of the weakest.
const CONFIDENT_ARMY_TOTAL: i32 = 125;

/// Fixed temperament of a director, set at scenario load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Aggressive,
    Mean,
    Defensive,
    Besieger,
    Developer,
}

impl Personality {
    pub fn name(self) -> &'static str {
        match self {
            Personality::Aggressive => "aggressive",
            Personality::Mean => "mean",
            Personality::Defensive => "defensive",
            Personality::Besieger => "besieger",
            Personality::Developer => "developer",
        }
    }

    pub fn from_name(s: &str) -> Option<Personality> {
        match s {
            "aggressive" => Some(Personality::Aggressive),
            "mean" => Some(Personality::Mean),
            "defensive" => Some(Personality::Defensive),
            "besieger" => Some(Personality::Besieger),
            "developer" => Some(Personality::Developer),
            _ => None,
        }
    }
}

/// Decision-maker for one AI force.
#[derive(Debug, Clone)]
pub struct Director {
    pub personality: Personality,
    pub difficulty: i32,
    pub target: Option<ForceId>,
}

impl Director {
    pub fn new(personality: Personality, difficulty: i32) -> Self {
        Director { personality, difficulty, target: None }
    }

    /// Runs the full decision pipeline for one turn.
    pub fn conduct(&mut self, map: &mut Map, force: ForceId, rng: &mut GameRng) {
        self.select_target(map, force);

        let values = valuation::compute_values(map, force);
        operations::build_armies(map, force, &values);

        let candidates = operations::build_candidates(map, force, self.personality, &values);
        operations::run_sweep(map, force, rng, &candidates);
        operations::residual_recruitment(map, force);

        movement::assign_movement(map, force, self.personality, self.target, rng);

        self.reevaluate_target(map, force);
    }

    /// Keeps the current target while it lives and still borders our
    /// territory; otherwise picks among forces holding ground adjacent to
    /// ours — the strongest when we feel confident, the weakest when not.
    fn select_target(&mut self, map: &Map, force: ForceId) {
        if let Some(t) = self.target {
            if map.force(t).is_alive() && borders(map, force, t) {
                return;
            }
            self.target = None;
        }

        let mut neighbors: Vec<ForceId> = map
            .forces()
            .iter()
            .filter(|f| f.id != force && f.is_alive() && borders(map, force, f.id))
            .map(|f| f.id)
            .collect();
        if neighbors.is_empty() {
            return;
        }

        let confident = map.force_army_total(force) >= CONFIDENT_ARMY_TOTAL;
        neighbors.sort_by_key(|&t| (map.force_army_total(t), t));
        self.target = if confident { neighbors.last().copied() } else { neighbors.first().copied() };
        debug!(force = %map.force(force).nickname, target = ?self.target, "target selected");
    }

    /// A siege in progress overrides strategy: retarget the weakest force
    /// currently besieging one of our provinces.
    fn reevaluate_target(&mut self, map: &Map, force: ForceId) {
        let besieging: Vec<ForceId> = map
            .force(force)
            .provinces
            .iter()
            .filter_map(|&p| map.besieger(p))
            .map(|a| map.army(a).owner)
            .collect();
        if let Some(&weakest) = besieging
            .iter()
            .min_by_key(|&&t| (map.force_army_total(t), t))
        {
            self.target = Some(weakest);
        }
    }
}

/// True iff any province of `a` touches a province of `b`.
fn borders(map: &Map, a: ForceId, b: ForceId) -> bool {
    map.force(a)
        .provinces
        .iter()
        .any(|&p| map.neighbors(p).iter().any(|&n| map.province(n).owner == b))
}
