//! Map: arena owner of all provinces, forces, and armies.
//!
//! The map holds every entity by index (no interior pointers), the symmetric
//! adjacency graph with typed links, the BFS connectivity queries, and the
//! round-robin turn driver. All mutation during a turn goes through the map,
//! which keeps the simulation strictly single-threaded and turn-synchronous.

pub mod army;
pub mod force;
pub mod province;

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info};

use crate::combat::{self, report::BattleReport};
use crate::rng::GameRng;

pub use army::Army;
pub use force::Force;
pub use province::Province;

/// Index of a province in the map arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProvinceId(pub u16);

/// Index of a force in the map arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForceId(pub u8);

/// Slot of an army in the map's army slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArmyId(pub u32);

/// The kind of border between two adjacent provinces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Normal,
    River,
    BigRiver,
}

/// Owns the whole entity graph and drives the turn order.
#[derive(Debug, Clone)]
pub struct Map {
    provinces: Vec<Province>,
    forces: Vec<Force>,
    /// Index-stable slab; destroyed armies leave a `None` slot behind.
    armies: Vec<Option<Army>>,
    neighbors: Vec<Vec<ProvinceId>>,
    links: HashMap<(u16, u16), LinkType>,
    /// 1-based round counter; increments when the turn order wraps.
    pub round: u32,
    turn_index: usize,
    /// Battle/siege records pushed by the resolver; a pure side channel.
    pub reports: Vec<BattleReport>,
}

impl Map {
    pub fn new() -> Self {
        Map {
            provinces: Vec::new(),
            forces: Vec::new(),
            armies: Vec::new(),
            neighbors: Vec::new(),
            links: HashMap::new(),
            round: 1,
            turn_index: 0,
            reports: Vec::new(),
        }
    }

    // ---- construction ----------------------------------------------------

    /// Adds a province to the arena and registers it with its owner.
    pub fn add_province(&mut self, mut province: Province) -> ProvinceId {
        let id = ProvinceId(self.provinces.len() as u16);
        province.id = id;
        let owner = province.owner;
        self.provinces.push(province);
        self.neighbors.push(Vec::new());
        if let Some(f) = self.forces.get_mut(owner.0 as usize) {
            f.provinces.push(id);
        }
        id
    }

    /// Adds a force to the arena.
    pub fn add_force(&mut self, mut force: Force) -> ForceId {
        let id = ForceId(self.forces.len() as u8);
        force.id = id;
        self.forces.push(force);
        id
    }

    /// Registers a symmetric link between two provinces.
    pub fn add_link(&mut self, a: ProvinceId, b: ProvinceId, kind: LinkType) {
        assert_ne!(a, b, "a province cannot border itself");
        self.neighbors[a.0 as usize].push(b);
        self.neighbors[b.0 as usize].push(a);
        self.links.insert(link_key(a, b), kind);
    }

    // ---- accessors -------------------------------------------------------

    pub fn province(&self, id: ProvinceId) -> &Province {
        &self.provinces[id.0 as usize]
    }

    pub fn province_mut(&mut self, id: ProvinceId) -> &mut Province {
        &mut self.provinces[id.0 as usize]
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn force(&self, id: ForceId) -> &Force {
        &self.forces[id.0 as usize]
    }

    pub fn force_mut(&mut self, id: ForceId) -> &mut Force {
        &mut self.forces[id.0 as usize]
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    /// Panics if the slot is empty — holding a stale `ArmyId` is a bug.
    pub fn army(&self, id: ArmyId) -> &Army {
        self.armies[id.0 as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("army {:?} no longer exists", id))
    }

    pub fn army_mut(&mut self, id: ArmyId) -> &mut Army {
        self.armies[id.0 as usize]
            .as_mut()
            .unwrap_or_else(|| panic!("army {:?} no longer exists", id))
    }

    pub fn try_army(&self, id: ArmyId) -> Option<&Army> {
        self.armies.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn set_turn_state(&mut self, round: u32, turn_index: usize) {
        self.round = round;
        self.turn_index = turn_index;
    }

    // ---- adjacency and connectivity --------------------------------------

    pub fn neighbors(&self, p: ProvinceId) -> &[ProvinceId] {
        &self.neighbors[p.0 as usize]
    }

    pub fn are_adjacent(&self, a: ProvinceId, b: ProvinceId) -> bool {
        self.neighbors[a.0 as usize].contains(&b)
    }

    /// Link type between two adjacent provinces.
    ///
    /// Panics when the provinces are not adjacent: callers must only query
    /// edges that exist.
    pub fn link_type(&self, a: ProvinceId, b: ProvinceId) -> LinkType {
        *self
            .links
            .get(&link_key(a, b))
            .unwrap_or_else(|| panic!("link type queried for non-adjacent provinces {:?}/{:?}", a, b))
    }

    /// True iff `a` and `b` are both owned by `force` and joined by a chain
    /// of provinces all owned by `force`. Symmetric by construction.
    pub fn is_connected(&self, a: ProvinceId, b: ProvinceId, force: ForceId) -> bool {
        if self.province(a).owner != force || self.province(b).owner != force {
            return false;
        }
        if a == b {
            return true;
        }
        let mut seen = vec![false; self.provinces.len()];
        let mut queue = VecDeque::new();
        seen[a.0 as usize] = true;
        queue.push_back(a);
        while let Some(cur) = queue.pop_front() {
            for &n in self.neighbors(cur) {
                if seen[n.0 as usize] || self.province(n).owner != force {
                    continue;
                }
                if n == b {
                    return true;
                }
                seen[n.0 as usize] = true;
                queue.push_back(n);
            }
        }
        false
    }

    /// Every province the army may set as a destination: its current
    /// province, any adjacent province, and any own-owned province reachable
    /// through a contiguous own-owned chain.
    pub fn provs_army_can_go(&self, army: ArmyId) -> Vec<ProvinceId> {
        let a = self.army(army);
        let cur = a.province;
        let force = a.owner;

        let mut out = vec![cur];
        for &n in self.neighbors(cur) {
            if !out.contains(&n) {
                out.push(n);
            }
        }
        if self.province(cur).owner == force {
            let mut seen = vec![false; self.provinces.len()];
            seen[cur.0 as usize] = true;
            let mut queue = VecDeque::new();
            queue.push_back(cur);
            while let Some(p) = queue.pop_front() {
                for &n in self.neighbors(p) {
                    if seen[n.0 as usize] || self.province(n).owner != force {
                        continue;
                    }
                    seen[n.0 as usize] = true;
                    if !out.contains(&n) {
                        out.push(n);
                    }
                    queue.push_back(n);
                }
            }
        }
        out
    }

    /// True iff an enemy army stands on the province.
    pub fn is_sieged_by_enemy(&self, p: ProvinceId) -> bool {
        self.besieger(p).is_some()
    }

    /// The enemy army on the province, if any.
    pub fn besieger(&self, p: ProvinceId) -> Option<ArmyId> {
        let prov = self.province(p);
        let aid = prov.army_on?;
        (self.army(aid).owner != prov.owner).then_some(aid)
    }

    // ---- army lifecycle --------------------------------------------------

    /// Raises a new army on an owned, empty province. Returns `None` when
    /// the slot is occupied.
    pub fn spawn_army(&mut self, force: ForceId, province: ProvinceId) -> Option<ArmyId> {
        if self.province(province).army_on.is_some() {
            return None;
        }
        let id = ArmyId(self.armies.len() as u32);
        self.armies.push(Some(Army::new(id, force, province)));
        self.province_mut(province).army_on = Some(id);
        self.force_mut(force).armies.push(id);
        Some(id)
    }

    /// Removes an army from the slab, its province slot, and its force list.
    pub fn remove_army(&mut self, id: ArmyId) {
        if let Some(army) = self.armies[id.0 as usize].take() {
            let p = self.province_mut(army.province);
            if p.army_on == Some(id) {
                p.army_on = None;
            }
            self.force_mut(army.owner).armies.retain(|&a| a != id);
        }
    }

    /// Moves an army between province slots. The destination must be empty.
    pub fn move_army_to(&mut self, id: ArmyId, dest: ProvinceId) {
        let from = self.army(id).province;
        debug_assert!(self.province(dest).army_on.is_none());
        self.province_mut(from).army_on = None;
        self.province_mut(dest).army_on = Some(id);
        self.army_mut(id).province = dest;
    }

    /// Transfers a province between forces and refreshes both sides'
    /// derived state (capital fallback, army caps).
    pub fn transfer_province(&mut self, p: ProvinceId, new_owner: ForceId) {
        let old_owner = self.province(p).owner;
        if old_owner == new_owner {
            return;
        }
        self.force_mut(old_owner).provinces.retain(|&q| q != p);
        self.force_mut(new_owner).provinces.push(p);
        self.province_mut(p).set_owner(new_owner);
        self.recompute_derived(old_owner);
        self.recompute_derived(new_owner);
        info!(
            province = %self.province(p).name,
            from = %self.force(old_owner).nickname,
            to = %self.force(new_owner).nickname,
            "province changed hands"
        );
    }

    /// Recomputes a force's army cap and, if its capital was lost, moves the
    /// capital to the highest-economy owned province.
    pub fn recompute_derived(&mut self, f: ForceId) {
        let majors = self
            .force(f)
            .provinces
            .iter()
            .filter(|&&p| self.province(p).is_major)
            .count() as i32;
        let capital_lost = self.province(self.force(f).capital).owner != f;
        let new_capital = if capital_lost {
            self.force(f)
                .provinces
                .iter()
                .copied()
                .max_by_key(|&p| (self.province(p).economy, std::cmp::Reverse(p)))
        } else {
            None
        };
        let force = self.force_mut(f);
        force.max_armies = majors.max(1);
        if let Some(cap) = new_capital {
            force.capital = cap;
        }
    }

    // ---- economy ---------------------------------------------------------

    /// Per-turn command-point income and army upkeep for a force.
    ///
    /// Income is the economy sum over owned provinces, halved for holdings
    /// without a recognized claim. Upkeep is one point per five soldiers.
    pub fn force_income(&self, f: ForceId) -> (i32, i32) {
        let mut income = 0;
        for &p in &self.force(f).provinces {
            let prov = self.province(p);
            income += if prov.is_legal() { prov.economy } else { prov.economy / 2 };
        }
        let upkeep: i32 = self
            .force(f)
            .armies
            .iter()
            .map(|&a| self.army(a).size / 5)
            .sum();
        (income, upkeep)
    }

    /// Mean huhuaness across a force's holdings (0 when it holds nothing).
    pub fn force_huhuaness(&self, f: ForceId) -> f32 {
        let provs = &self.force(f).provinces;
        if provs.is_empty() {
            return 0.0;
        }
        let sum: f32 = provs.iter().map(|&p| self.province(p).huhuaness).sum();
        sum / provs.len() as f32
    }

    /// Total soldiers across a force's armies.
    pub fn force_army_total(&self, f: ForceId) -> i32 {
        self.force(f).armies.iter().map(|&a| self.army(a).size).sum()
    }

    // ---- turn driver -----------------------------------------------------

    /// Advances to the next living force and resolves its full turn.
    /// Returns the force that moved, or `None` when no force is alive.
    pub fn next_turn(&mut self, rng: &mut GameRng) -> Option<ForceId> {
        let n = self.forces.len();
        for _ in 0..n {
            let idx = self.turn_index;
            let fid = ForceId(idx as u8);
            let alive = self.forces[idx].is_alive();
            if alive {
                self.run_force_turn(fid, rng);
            }
            self.turn_index += 1;
            if self.turn_index >= n {
                self.turn_index = 0;
                self.round += 1;
            }
            if alive {
                return Some(fid);
            }
        }
        None
    }

    /// The last force standing, if the session has resolved to one.
    pub fn sole_survivor(&self) -> Option<ForceId> {
        let mut alive = self.forces.iter().filter(|f| f.is_alive());
        match (alive.next(), alive.next()) {
            (Some(f), None) => Some(f.id),
            _ => None,
        }
    }

    fn run_force_turn(&mut self, fid: ForceId, rng: &mut GameRng) {
        debug!(round = self.round, force = %self.force(fid).nickname, "turn start");

        // AI decisions spend the existing budget before income arrives.
        if !self.force(fid).is_player {
            if let Some(mut director) = self.force_mut(fid).director.take() {
                director.conduct(self, fid, rng);
                self.force_mut(fid).director = Some(director);
            }
        }

        let (income, upkeep) = self.force_income(fid);
        {
            let force = self.force_mut(fid);
            force.command_points = (force.command_points + income - upkeep).max(0);
        }
        self.recompute_derived(fid);

        let owned: Vec<ProvinceId> = self.force(fid).provinces.clone();
        for p in owned {
            let sieged = self.is_sieged_by_enemy(p);
            self.province_mut(p).next_turn(sieged);
        }

        let armies: Vec<ArmyId> = self.force(fid).armies.clone();
        for a in armies {
            if self.try_army(a).is_some_and(|ar| ar.owner == fid) {
                combat::resolve_army_turn(self, rng, a);
            }
        }
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

fn link_key(a: ProvinceId, b: ProvinceId) -> (u16, u16) {
    if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Builds a map with `n` provinces in a line (0-1-2-..) split between
    /// two forces: the first `split` provinces to force 0, the rest to 1.
    pub fn line_map(n: u16, split: u16) -> Map {
        let mut map = Map::new();
        map.add_force(Force::new(ForceId(0), "alpha".into(), [200, 40, 40], ProvinceId(0)));
        map.add_force(Force::new(ForceId(1), "omega".into(), [40, 40, 200], ProvinceId(n.saturating_sub(1))));
        for i in 0..n {
            let owner = if i < split { ForceId(0) } else { ForceId(1) };
            let mut p = Province::new(
                ProvinceId(i),
                format!("prov{}", i),
                owner,
                5,
                50_000.0,
                1000.0,
                0.001,
            );
            p.add_legal_force(owner);
            map.add_province(p);
        }
        for i in 1..n {
            map.add_link(ProvinceId(i - 1), ProvinceId(i), LinkType::Normal);
        }
        map
    }
}
