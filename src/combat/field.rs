//! Field combat: army against army on a contested province.
//!
//! Roles come from ownership of the contested province — the side whose
//! force owns it defends, which means an army marching to reclaim its own
//! soil fights as the defender. Up to three CRT rounds run, then the loser
//! retreats or dies, the winner occupies, and large battles bleed the local
//! population.

use tracing::debug;

use crate::map::{ArmyId, ForceId, LinkType, Map, ProvinceId};
use crate::rng::GameRng;

use super::crt::{column, strength_factor, strength_row, CASUALTY_TABLE, MAX_ROUNDS, SCALE_DIVISOR};
use super::report::{BattleKind, BattleOutcome, BattleReport, BattleRound};
use super::siege::perform_siege;

/// Combined engagement size from which collateral damage applies.
pub const LARGE_BATTLE_SIZE: i32 = 30;

/// Mover size from which an unopposed march into enemy land causes collateral.
pub const WALKIN_COLLATERAL_SIZE: i32 = 25;

const COLLATERAL_FRACTION: f32 = 0.10;
const COLLATERAL_SPREAD: f32 = 0.80;

/// Resolves a battle between the moving army and the army holding its
/// destination. Exactly one of the two survives on the battlefield unless
/// the loser finds room to retreat.
pub fn resolve_field_combat(
    map: &mut Map,
    rng: &mut GameRng,
    mover: ArmyId,
    holder: ArmyId,
    battlefield: ProvinceId,
) {
    let origin = map.army(mover).province;
    let mover_force = map.army(mover).owner;
    let holder_force = map.army(holder).owner;
    let initial_total = map.army(mover).size + map.army(holder).size;

    // The side whose force owns the battlefield defends.
    let holder_defends = map.province(battlefield).owner != mover_force;
    let (attacker, defender) = if holder_defends { (mover, holder) } else { (holder, mover) };
    let attacker_force = map.army(attacker).owner;
    let defender_force = map.army(defender).owner;

    let mut row_mod = 0;
    if holder_defends && map.province(battlefield).is_mountain {
        row_mod += 1;
    }
    if attacker == mover {
        match map.link_type(origin, battlefield) {
            LinkType::River => row_mod += 1,
            LinkType::BigRiver => row_mod += 2,
            LinkType::Normal => {}
        }
    }

    let attacker_factor = strength_factor(map.force_huhuaness(attacker_force));
    let defender_factor = strength_factor(map.force_huhuaness(defender_force));

    let mut rounds = Vec::with_capacity(MAX_ROUNDS);
    let mut attacker_total_losses = 0;
    let mut defender_total_losses = 0;

    for _ in 0..MAX_ROUNDS {
        let asize = map.army(attacker).size;
        let dsize = map.army(defender).size;
        let aeff = ((asize as f32 * attacker_factor).floor() as i32).max(1);
        let deff = ((dsize as f32 * defender_factor).floor() as i32).max(1);
        let row = (strength_row(aeff, deff) + row_mod).clamp(0, 7);
        // Roll modifier is reserved at zero; the clamp still applies.
        let roll = rng.roll_int(0, 9).clamp(0, 9);
        let col = column(roll, row);
        let entry = CASUALTY_TABLE[col];
        let scale = (asize + dsize) / SCALE_DIVISOR;

        let attacker_losses = (entry.attacker_base + entry.attacker_scale * scale).min(asize);
        let defender_losses = (entry.defender_base + entry.defender_scale * scale).min(dsize);

        map.army_mut(attacker).size -= attacker_losses;
        map.army_mut(defender).size -= defender_losses;
        attacker_total_losses += attacker_losses;
        defender_total_losses += defender_losses;

        debug!(
            roll, row, col, attacker_losses, defender_losses,
            "field combat round"
        );
        rounds.push(BattleRound {
            roll,
            row,
            column: col,
            attacker_size: asize,
            defender_size: dsize,
            attacker_losses,
            defender_losses,
        });

        if map.army(attacker).size == 0 || map.army(defender).size == 0 {
            break;
        }
    }

    // A side wiped out loses outright; otherwise fewer casualties wins.
    let attacker_dead = map.army(attacker).size == 0;
    let defender_dead = map.army(defender).size == 0;
    let attacker_won = if attacker_dead {
        false
    } else if defender_dead {
        true
    } else {
        attacker_total_losses < defender_total_losses
    };

    let (winner, loser) = if attacker_won { (attacker, defender) } else { (defender, attacker) };
    let loser_force = map.army(loser).owner;

    if map.army(loser).size == 0 {
        map.remove_army(loser);
    } else if map.army(loser).province == battlefield {
        // The holder lost but survived: fall back to a friendly empty
        // neighbor, or die in place.
        match retreat_province(map, battlefield, loser_force, origin) {
            Some(dest) => {
                map.move_army_to(loser, dest);
                map.army_mut(loser).dest = None;
            }
            None => map.remove_army(loser),
        }
    }
    // A losing mover that survived simply stays at its origin.

    // The winner occupies the contested province.
    if winner == mover && map.try_army(mover).is_some() && map.province(battlefield).army_on.is_none()
    {
        map.move_army_to(mover, battlefield);
    }

    map.reports.push(BattleReport {
        kind: BattleKind::Field,
        province: battlefield,
        attacker: attacker_force,
        defender: defender_force,
        rounds,
        outcome: if attacker_won {
            BattleOutcome::AttackerWon
        } else {
            BattleOutcome::DefenderWon
        },
    });

    if initial_total >= LARGE_BATTLE_SIZE {
        collateral_damage(map, battlefield);
    }

    // Capture check when the mover won ground its force does not own. A
    // winning holder on foreign soil resumes its siege on its own turn.
    if winner == mover && map.try_army(mover).is_some() {
        if map.province(battlefield).owner != mover_force && map.army(mover).province == battlefield
        {
            perform_siege(map, rng, mover, battlefield);
        }
    }
}

/// Picks a retreat destination: an adjacent province owned by the loser with
/// no army on it, preferring anywhere over the attacker's origin.
fn retreat_province(
    map: &Map,
    battlefield: ProvinceId,
    loser: ForceId,
    attacker_origin: ProvinceId,
) -> Option<ProvinceId> {
    let mut fallback = None;
    for &n in map.neighbors(battlefield) {
        if map.province(n).owner != loser || map.province(n).army_on.is_some() {
            continue;
        }
        if n == attacker_origin {
            fallback = Some(n);
        } else {
            return Some(n);
        }
    }
    fallback
}

/// Large engagements cost the province a tenth of its population, most of
/// which scatters into the neighboring provinces.
pub fn collateral_damage(map: &mut Map, battlefield: ProvinceId) {
    let loss = map.province(battlefield).population * COLLATERAL_FRACTION;
    if loss <= 0.0 {
        return;
    }
    {
        let p = map.province_mut(battlefield);
        p.population = (p.population - loss).max(0.0);
    }
    let neighbors: Vec<ProvinceId> = map.neighbors(battlefield).to_vec();
    if neighbors.is_empty() {
        return;
    }
    let share = loss * COLLATERAL_SPREAD / neighbors.len() as f32;
    for n in neighbors {
        let p = map.province_mut(n);
        p.population = (p.population + share).min(crate::map::province::POPULATION_CAP);
    }
}
