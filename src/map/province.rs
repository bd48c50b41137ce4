//! Province state and its per-turn natural evolution.
//!
//! A province is the atomic unit of ownership, economy, and siege. Its
//! per-turn drift (development, population growth, legitimacy, defense
//! regeneration) lives in [`Province::next_turn`]; player/AI commands only
//! apply their effect here — command-point costs are enforced by the caller.

use super::{ArmyId, ForceId, ProvinceId};

/// Hard upper bound on province population.
pub const POPULATION_CAP: f32 = 3_000_000.0;

/// Population stops growing naturally at this size.
pub const GROWTH_SOFT_CAP: f32 = 1_000_000.0;

/// Mountainous provinces hit the growth ceiling earlier.
pub const MOUNTAIN_GROWTH_SOFT_CAP: f32 = 500_000.0;

/// Defense regenerated per turn while not under siege.
pub const DEFENSE_REGEN: f32 = 20.0;

/// Legitimacy accumulated per turn toward the computed maximum.
pub const LEGAL_PROGRESS_PER_TURN: f32 = 5.0;

/// Extra growth applied on the turn an attraction drive resolves.
pub const ATTRACT_GROWTH_BONUS: f32 = 0.004;

/// Development added by one develop command.
pub const DEVELOP_AMOUNT: i32 = 10;

/// Defense added by one fortify command.
pub const FORTIFY_AMOUNT: f32 = 100.0;

/// Atomic territorial unit: economic, demographic, and defensive state.
#[derive(Debug, Clone)]
pub struct Province {
    pub id: ProvinceId,
    pub name: String,
    pub owner: ForceId,
    /// The single army stationed here, if any.
    pub army_on: Option<ArmyId>,
    pub economy: i32,
    pub population: f32,
    pub defense: f32,
    pub max_defense: f32,
    pub development: i32,
    pub max_development: i32,
    pub growth_rate: f32,
    /// Assimilation/unrest fraction in [0, 1].
    pub huhuaness: f32,
    pub legal_progress: f32,
    pub max_legal_progress: f32,
    /// Limits the add-legal-progress command to once per turn.
    pub legal_added_this_turn: bool,
    pub attracting: bool,
    pub is_major: bool,
    pub is_plain: bool,
    pub is_mountain: bool,
    legal_forces: Vec<ForceId>,
}

impl Province {
    /// Creates a province with derived fields computed from the given state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProvinceId,
        name: String,
        owner: ForceId,
        economy: i32,
        population: f32,
        max_defense: f32,
        growth_rate: f32,
    ) -> Self {
        let mut p = Province {
            id,
            name,
            owner,
            army_on: None,
            economy,
            population,
            defense: max_defense,
            max_defense,
            development: 0,
            max_development: 0,
            growth_rate,
            huhuaness: 0.0,
            legal_progress: 0.0,
            max_legal_progress: 0.0,
            legal_added_this_turn: false,
            attracting: false,
            is_major: false,
            is_plain: false,
            is_mountain: false,
            legal_forces: Vec::new(),
        };
        p.max_development = compute_max_development(p.population, p.is_plain, p.is_mountain);
        p
    }

    /// True iff the current owner holds a recognized claim.
    pub fn is_legal(&self) -> bool {
        self.legal_forces.contains(&self.owner)
    }

    /// True iff the given force holds a recognized claim here.
    pub fn is_legal_for(&self, force: ForceId) -> bool {
        self.legal_forces.contains(&force)
    }

    /// Grants the given force a recognized claim. Idempotent.
    pub fn add_legal_force(&mut self, force: ForceId) {
        if !self.legal_forces.contains(&force) {
            self.legal_forces.push(force);
        }
    }

    /// The set of forces with recognized claims.
    pub fn legal_forces(&self) -> &[ForceId] {
        &self.legal_forces
    }

    /// Replaces the claim set wholesale. Used when restoring a session.
    pub fn set_legal_forces(&mut self, forces: Vec<ForceId>) {
        self.legal_forces = forces;
    }

    /// Transfers ownership. When the new holder has no recognized claim,
    /// legitimacy tracking restarts from zero with a maximum derived from
    /// the province's current weight.
    pub fn set_owner(&mut self, new_owner: ForceId) {
        if !self.legal_forces.contains(&new_owner) {
            self.legal_progress = 0.0;
            self.max_legal_progress = 60.0 + self.population / 10_000.0;
            self.legal_added_this_turn = false;
        }
        self.owner = new_owner;
    }

    /// Develop command: accumulates development toward the next economy tier.
    pub fn develop(&mut self) {
        self.development += DEVELOP_AMOUNT;
    }

    /// Fortify command: raises defense, clamped to the maximum.
    pub fn fortify(&mut self) {
        self.defense = (self.defense + FORTIFY_AMOUNT).min(self.max_defense);
    }

    /// Attract command: flags a population drive that resolves next turn.
    pub fn attract(&mut self) {
        self.attracting = true;
    }

    /// Legitimize command. Returns false if already used this turn.
    pub fn add_legal_progress(&mut self, amount: f32) -> bool {
        if self.legal_added_this_turn || self.is_legal() {
            return false;
        }
        self.legal_progress += amount;
        self.legal_added_this_turn = true;
        true
    }

    /// Advances the province by one turn.
    ///
    /// Order of effects: development conversion, attraction decay,
    /// legitimacy drift, population growth, defense regeneration, and the
    /// max-development recompute. `under_siege` suppresses defense regen.
    pub fn next_turn(&mut self, under_siege: bool) {
        // Accumulated development converts into the next economy tier,
        // unsettling the population slightly.
        if self.max_development > 0 && self.development >= self.max_development {
            self.economy += 1;
            self.development = 0;
            self.huhuaness = (self.huhuaness - 0.01).max(0.0);
        }

        let mut growth = self.growth_rate;
        if self.attracting {
            self.attracting = false;
            growth += ATTRACT_GROWTH_BONUS;
            self.huhuaness = (self.huhuaness + 0.01).min(1.0);
        }

        if !self.is_legal() {
            self.legal_progress += LEGAL_PROGRESS_PER_TURN;
            if self.max_legal_progress > 0.0 && self.legal_progress >= self.max_legal_progress {
                self.legal_progress = self.max_legal_progress;
                let owner = self.owner;
                self.add_legal_force(owner);
            }
        }
        self.legal_added_this_turn = false;

        let soft_cap = if self.is_mountain {
            MOUNTAIN_GROWTH_SOFT_CAP
        } else {
            GROWTH_SOFT_CAP
        };
        if self.population < soft_cap {
            self.population *= 1.0 + growth;
        }
        self.population = self.population.clamp(0.0, POPULATION_CAP);

        if !under_siege {
            self.defense = (self.defense + DEFENSE_REGEN).min(self.max_defense);
        }

        self.max_development = compute_max_development(self.population, self.is_plain, self.is_mountain);
    }
}

/// Development needed for the next economy tier, from population and terrain.
pub fn compute_max_development(population: f32, is_plain: bool, is_mountain: bool) -> i32 {
    let mut m = 30 + (population / 20_000.0) as i32;
    if is_plain {
        m -= 10;
    }
    if is_mountain {
        m += 10;
    }
    m.max(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn province() -> Province {
        Province::new(
            ProvinceId(0),
            "testland".to_string(),
            ForceId(0),
            5,
            50_000.0,
            1000.0,
            0.001,
        )
    }

    #[test]
    fn twenty_quiet_turns_grow_population_and_defense() {
        let mut p = province();
        p.defense = 500.0;
        p.add_legal_force(ForceId(0));
        for _ in 0..20 {
            p.next_turn(false);
        }
        // 50_000 * 1.001^20, within float tolerance.
        assert!((p.population - 51_005.0).abs() < 20.0, "population {}", p.population);
        assert!((p.defense - 900.0).abs() < f32::EPSILON);
        assert_eq!(p.economy, 5);
    }

    #[test]
    fn next_turn_keeps_invariants() {
        let mut p = province();
        p.population = 2_999_999.0;
        p.huhuaness = 1.0;
        p.defense = p.max_defense;
        p.next_turn(false);
        assert!(p.population <= POPULATION_CAP);
        assert!(p.defense <= p.max_defense);
        assert!((0.0..=1.0).contains(&p.huhuaness));
    }

    #[test]
    fn growth_stops_at_soft_cap() {
        let mut p = province();
        p.population = GROWTH_SOFT_CAP;
        p.next_turn(false);
        assert_eq!(p.population, GROWTH_SOFT_CAP);

        let mut m = province();
        m.is_mountain = true;
        m.population = MOUNTAIN_GROWTH_SOFT_CAP;
        m.next_turn(false);
        assert_eq!(m.population, MOUNTAIN_GROWTH_SOFT_CAP);
    }

    #[test]
    fn development_converts_to_economy_tier() {
        let mut p = province();
        p.huhuaness = 0.5;
        p.development = p.max_development;
        p.next_turn(false);
        assert_eq!(p.economy, 6);
        assert_eq!(p.development, 0);
        assert!((p.huhuaness - 0.49).abs() < 1e-6);
    }

    #[test]
    fn attraction_decays_into_huhuaness() {
        let mut p = province();
        p.attract();
        assert!(p.attracting);
        let before = p.population;
        p.next_turn(false);
        assert!(!p.attracting);
        assert!((p.huhuaness - 0.01).abs() < 1e-6);
        // Growth that turn carries the attraction bonus.
        let expected = before * (1.0 + 0.001 + ATTRACT_GROWTH_BONUS);
        assert!((p.population - expected).abs() < 1.0);
    }

    #[test]
    fn siege_suppresses_defense_regen() {
        let mut p = province();
        p.defense = 500.0;
        p.next_turn(true);
        assert_eq!(p.defense, 500.0);
    }

    #[test]
    fn legality_follows_claims_and_ownership() {
        let mut p = province();
        assert!(!p.is_legal());
        p.add_legal_force(ForceId(0));
        assert!(p.is_legal());
        p.set_owner(ForceId(1));
        assert!(!p.is_legal());
        assert_eq!(p.legal_progress, 0.0);
        assert!(p.max_legal_progress > 0.0);
    }

    #[test]
    fn illegal_hold_drifts_toward_legitimacy() {
        let mut p = province();
        p.add_legal_force(ForceId(0));
        p.set_owner(ForceId(1));
        let turns_needed = (p.max_legal_progress / LEGAL_PROGRESS_PER_TURN).ceil() as usize;
        for _ in 0..turns_needed {
            assert!(!p.is_legal());
            p.next_turn(false);
        }
        assert!(p.is_legal());
    }

    #[test]
    fn add_legal_progress_once_per_turn() {
        let mut p = province();
        p.add_legal_force(ForceId(0));
        p.set_owner(ForceId(1));
        assert!(p.add_legal_progress(10.0));
        assert!(!p.add_legal_progress(10.0));
        p.next_turn(false);
        assert!(p.add_legal_progress(10.0));
    }

    #[test]
    fn fortify_clamps_to_max() {
        let mut p = province();
        p.defense = p.max_defense - 10.0;
        p.fortify();
        assert_eq!(p.defense, p.max_defense);
    }
}
