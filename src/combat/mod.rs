//! Movement and combat resolution.
//!
//! [`resolve_army_turn`] turns an army's pending destination into one of:
//! a merge with a friendly army, a field battle against an enemy army, a
//! march into empty ground (with a siege check on enemy soil), or nothing.
//! An army parked on enemy ground with no orders besieges every turn.

pub mod crt;
pub mod field;
pub mod report;
pub mod siege;

use tracing::debug;

use crate::map::{ArmyId, Map, ProvinceId};
use crate::rng::GameRng;

pub use field::{collateral_damage, resolve_field_combat, WALKIN_COLLATERAL_SIZE};
pub use siege::perform_siege;

/// Resolves one army's turn: movement intent, then any resulting battle or
/// siege. Invalid destinations degrade to staying put.
pub fn resolve_army_turn(map: &mut Map, rng: &mut GameRng, army: ArmyId) {
    if map.try_army(army).is_none() {
        return;
    }
    let current = map.army(army).province;
    let owner = map.army(army).owner;
    let dest = map.army(army).dest;

    match dest {
        None => {
            // Holding on foreign soil means besieging it.
            if map.province(current).owner != owner {
                perform_siege(map, rng, army, current);
            }
        }
        Some(d) if d == current => {
            map.army_mut(army).dest = None;
            if map.province(current).owner != owner {
                perform_siege(map, rng, army, current);
            }
        }
        Some(d) => {
            if !is_valid_destination(map, army, d) {
                debug!(?d, "invalid destination, holding");
                map.army_mut(army).dest = None;
                return;
            }
            map.army_mut(army).dest = None;
            match map.province(d).army_on {
                Some(other) if map.army(other).owner == owner => merge_armies(map, army, other),
                Some(other) => resolve_field_combat(map, rng, army, other, d),
                None => {
                    let enemy_ground = map.province(d).owner != owner;
                    map.move_army_to(army, d);
                    if enemy_ground {
                        if map.army(army).size >= WALKIN_COLLATERAL_SIZE {
                            collateral_damage(map, d);
                        }
                        perform_siege(map, rng, army, d);
                    }
                }
            }
        }
    }
}

/// A destination is valid when adjacent to the current province, joined to
/// it by a chain of own-owned provinces, or the current province itself.
pub fn is_valid_destination(map: &Map, army: ArmyId, dest: ProvinceId) -> bool {
    let a = map.army(army);
    dest == a.province
        || map.are_adjacent(a.province, dest)
        || map.is_connected(a.province, dest, a.owner)
}

/// Folds the moving army into a friendly army on the destination; the mover
/// is discarded, its soldiers absorbed up to the receiver's cap.
fn merge_armies(map: &mut Map, mover: ArmyId, receiver: ArmyId) {
    let size = map.army(mover).size;
    map.army_mut(receiver).reinforce(size);
    map.remove_army(mover);
    debug!(?receiver, added = size, "armies merged");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testutil::line_map;
    use crate::map::ForceId;

    #[test]
    fn merge_sums_sizes_and_discards_mover() {
        let mut map = line_map(4, 4);
        let a = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        let b = map.spawn_army(ForceId(0), ProvinceId(1)).unwrap();
        map.army_mut(a).size = 30;
        map.army_mut(b).size = 20;
        map.army_mut(a).dest = Some(ProvinceId(1));
        let mut rng = GameRng::seeded(0);
        resolve_army_turn(&mut map, &mut rng, a);
        assert!(map.try_army(a).is_none());
        assert_eq!(map.army(b).size, 50);
        assert_eq!(map.force(ForceId(0)).armies.len(), 1);
    }

    #[test]
    fn merge_respects_receiver_cap() {
        let mut map = line_map(4, 4);
        let a = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        let b = map.spawn_army(ForceId(0), ProvinceId(1)).unwrap();
        map.army_mut(a).size = 90;
        map.army_mut(b).size = 90;
        map.army_mut(a).dest = Some(ProvinceId(1));
        let mut rng = GameRng::seeded(0);
        resolve_army_turn(&mut map, &mut rng, a);
        assert_eq!(map.army(b).size, map.army(b).max_size);
    }

    #[test]
    fn march_into_friendly_empty_ground_occupies() {
        let mut map = line_map(4, 4);
        let a = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        map.army_mut(a).dest = Some(ProvinceId(3));
        let mut rng = GameRng::seeded(0);
        resolve_army_turn(&mut map, &mut rng, a);
        assert_eq!(map.army(a).province, ProvinceId(3));
        assert!(map.army(a).dest.is_none());
    }

    #[test]
    fn invalid_destination_is_a_no_op() {
        let mut map = line_map(6, 3);
        let a = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        // Province 5 is enemy ground beyond the border: not adjacent, not
        // connected through own territory.
        map.army_mut(a).dest = Some(ProvinceId(5));
        let mut rng = GameRng::seeded(0);
        resolve_army_turn(&mut map, &mut rng, a);
        assert_eq!(map.army(a).province, ProvinceId(0));
        assert!(map.army(a).dest.is_none());
    }

    #[test]
    fn parked_on_enemy_ground_besieges_every_turn() {
        let mut map = line_map(4, 2);
        let a = map.spawn_army(ForceId(0), ProvinceId(1)).unwrap();
        map.army_mut(a).size = 5;
        map.move_army_to(a, ProvinceId(2));
        map.province_mut(ProvinceId(2)).defense = 5000.0;
        let mut rng = GameRng::seeded(0);
        resolve_army_turn(&mut map, &mut rng, a);
        assert_eq!(map.reports.len(), 1);
        assert_eq!(map.reports[0].kind, report::BattleKind::Siege);
    }

    #[test]
    fn walk_in_on_enemy_ground_runs_capture_check() {
        let mut map = line_map(4, 2);
        let a = map.spawn_army(ForceId(0), ProvinceId(1)).unwrap();
        map.army_mut(a).size = 80;
        map.army_mut(a).dest = Some(ProvinceId(2));
        map.province_mut(ProvinceId(2)).defense = 0.0;
        let pop_before = map.province(ProvinceId(2)).population;
        let mut rng = GameRng::seeded(0);
        resolve_army_turn(&mut map, &mut rng, a);
        // Large walk-in bleeds the population, then captures outright.
        assert!(map.province(ProvinceId(2)).population < pop_before);
        assert_eq!(map.province(ProvinceId(2)).owner, ForceId(0));
    }
}
