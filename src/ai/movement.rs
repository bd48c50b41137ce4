//! Movement assignment for the AI's armies.
//!
//! Each army on owned ground gets at most one destination per turn, chosen
//! by a strict priority ladder: relieve a besieged holding it can decisively
//! beat, strike the target's richest reachable province, strike anything
//! foreign (aggressive only), shuffle toward the front with a value-weighted
//! random move, or wander. A per-turn assigned set stops two armies from
//! committing to the same province.

use std::collections::HashSet;

use tracing::debug;

use crate::map::{ArmyId, ForceId, Map, ProvinceId};
use crate::rng::GameRng;

use super::valuation::province_value;
use super::Personality;

/// Margin over the besieger's size required to commit to a relief battle.
const RELIEF_MARGIN: i32 = 10;

/// Assigns destinations for every army of the force standing on owned
/// ground. Skipped entirely on round 1 so opening budgets settle first.
pub fn assign_movement(
    map: &mut Map,
    force: ForceId,
    personality: Personality,
    target: Option<ForceId>,
    rng: &mut GameRng,
) {
    if map.round <= 1 {
        return;
    }
    let mut assigned: HashSet<ProvinceId> = HashSet::new();
    let armies: Vec<ArmyId> = map.force(force).armies.clone();

    for aid in armies {
        let Some(army) = map.try_army(aid) else { continue };
        if map.province(army.province).owner != force {
            continue;
        }
        let size = army.size;
        let current = army.province;
        let reachable = map.provs_army_can_go(aid);

        let dest = pick_destination(
            map, force, personality, target, &reachable, current, size, &assigned, rng,
        );
        if let Some(d) = dest {
            assigned.insert(d);
            debug!(army = ?aid, dest = ?d, "movement assigned");
        }
        map.army_mut(aid).dest = dest;
    }
}

#[allow(clippy::too_many_arguments)]
fn pick_destination(
    map: &Map,
    force: ForceId,
    personality: Personality,
    target: Option<ForceId>,
    reachable: &[ProvinceId],
    current: ProvinceId,
    size: i32,
    assigned: &HashSet<ProvinceId>,
    rng: &mut GameRng,
) -> Option<ProvinceId> {
    let open = |p: &ProvinceId| *p != current && !assigned.contains(p);

    // Relieve a besieged holding, but only with a decisive edge.
    for &p in reachable.iter().filter(|p| open(p)) {
        if map.province(p).owner != force {
            continue;
        }
        if let Some(besieger) = map.besieger(p) {
            if size >= map.army(besieger).size + RELIEF_MARGIN {
                return Some(p);
            }
        }
    }

    // Strike the target's richest reachable holding.
    if personality != Personality::Defensive {
        if let Some(t) = target {
            let holdings: Vec<ProvinceId> = reachable
                .iter()
                .copied()
                .filter(|p| open(p) && map.province(*p).owner == t)
                .collect();
            if let Some(p) = richest(map, &holdings, rng) {
                return Some(p);
            }
        }
    }

    // Aggressors strike anything foreign within reach.
    if personality == Personality::Aggressive {
        let foreign: Vec<ProvinceId> = reachable
            .iter()
            .copied()
            .filter(|p| open(p) && map.province(*p).owner != force)
            .collect();
        if let Some(p) = richest(map, &foreign, rng) {
            return Some(p);
        }
    }

    // Shift weight toward the front: owned provinces bordering the target,
    // picked by value-weighted roulette.
    if let Some(t) = target {
        let front: Vec<ProvinceId> = reachable
            .iter()
            .copied()
            .filter(|p| {
                open(p)
                    && map.province(*p).owner == force
                    && map.neighbors(*p).iter().any(|&n| map.province(n).owner == t)
            })
            .collect();
        if !front.is_empty() {
            let total: f32 = front.iter().map(|&p| province_value(map, p)).sum();
            if total > 0.0 {
                let mut pick = rng.roll_float01() * total;
                for &p in &front {
                    pick -= province_value(map, p);
                    if pick <= 0.0 {
                        return Some(p);
                    }
                }
            }
            return front.last().copied();
        }
    }

    // Failing everything: wander somewhere unassigned, or stay put.
    let anywhere: Vec<ProvinceId> = reachable.iter().copied().filter(open).collect();
    if anywhere.is_empty() {
        return None;
    }
    Some(anywhere[rng.roll_int(0, anywhere.len() as i32 - 1) as usize])
}

/// Highest-economy pick; ties resolved by a uniform draw.
fn richest(map: &Map, candidates: &[ProvinceId], rng: &mut GameRng) -> Option<ProvinceId> {
    let best = candidates.iter().map(|&p| map.province(p).economy).max()?;
    let tied: Vec<ProvinceId> = candidates
        .iter()
        .copied()
        .filter(|&p| map.province(p).economy == best)
        .collect();
    if tied.len() == 1 {
        Some(tied[0])
    } else {
        Some(tied[rng.roll_int(0, tied.len() as i32 - 1) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testutil::line_map;

    #[test]
    fn movement_is_skipped_on_round_one() {
        let mut map = line_map(6, 3);
        let aid = map.spawn_army(ForceId(0), ProvinceId(2)).unwrap();
        let mut rng = GameRng::seeded(0);
        assign_movement(&mut map, ForceId(0), Personality::Aggressive, Some(ForceId(1)), &mut rng);
        assert!(map.army(aid).dest.is_none());
    }

    #[test]
    fn relief_requires_decisive_margin() {
        let mut map = line_map(6, 3);
        map.set_turn_state(2, 0);
        // Enemy besieges our province 1 with 20 soldiers. The fallback for
        // an undersized relief army is the front move onto province 2.
        let intruder = map.spawn_army(ForceId(1), ProvinceId(3)).unwrap();
        map.army_mut(intruder).size = 20;
        map.move_army_to(intruder, ProvinceId(1));
        let relief = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();

        map.army_mut(relief).size = 25; // not enough margin
        let mut rng = GameRng::seeded(0);
        assign_movement(&mut map, ForceId(0), Personality::Aggressive, Some(ForceId(1)), &mut rng);
        assert_eq!(map.army(relief).dest, Some(ProvinceId(2)));

        map.army_mut(relief).size = 30; // 20 + 10 margin
        let mut rng = GameRng::seeded(0);
        assign_movement(&mut map, ForceId(0), Personality::Aggressive, Some(ForceId(1)), &mut rng);
        assert_eq!(map.army(relief).dest, Some(ProvinceId(1)));
    }

    #[test]
    fn strikes_targets_richest_reachable_holding() {
        let mut map = line_map(6, 3);
        map.set_turn_state(2, 0);
        map.province_mut(ProvinceId(3)).economy = 8;
        let aid = map.spawn_army(ForceId(0), ProvinceId(2)).unwrap();
        let mut rng = GameRng::seeded(0);
        assign_movement(&mut map, ForceId(0), Personality::Aggressive, Some(ForceId(1)), &mut rng);
        assert_eq!(map.army(aid).dest, Some(ProvinceId(3)));
    }

    #[test]
    fn two_armies_never_share_a_destination() {
        let mut map = line_map(6, 3);
        map.set_turn_state(2, 0);
        let a = map.spawn_army(ForceId(0), ProvinceId(1)).unwrap();
        let b = map.spawn_army(ForceId(0), ProvinceId(2)).unwrap();
        let mut rng = GameRng::seeded(42);
        assign_movement(&mut map, ForceId(0), Personality::Aggressive, Some(ForceId(1)), &mut rng);
        let da = map.army(a).dest;
        let db = map.army(b).dest;
        if let (Some(da), Some(db)) = (da, db) {
            assert_ne!(da, db);
        }
    }

    #[test]
    fn defensive_holds_the_front_instead_of_striking() {
        let mut map = line_map(6, 3);
        // Second border crossing so province 1 also touches the enemy.
        map.add_link(ProvinceId(1), ProvinceId(3), crate::map::LinkType::Normal);
        map.set_turn_state(2, 0);
        let aid = map.spawn_army(ForceId(0), ProvinceId(2)).unwrap();

        let mut rng = GameRng::seeded(3);
        assign_movement(&mut map, ForceId(0), Personality::Defensive, Some(ForceId(1)), &mut rng);
        assert_eq!(map.army(aid).dest, Some(ProvinceId(1)));

        let mut rng = GameRng::seeded(3);
        assign_movement(&mut map, ForceId(0), Personality::Aggressive, Some(ForceId(1)), &mut rng);
        assert_eq!(map.army(aid).dest, Some(ProvinceId(3)));
    }
}
