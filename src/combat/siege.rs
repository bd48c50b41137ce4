//! Siege: an army against an enemy-owned province's defenses.
//!
//! One attempt per turn: the assault grinds down the defense value, then a
//! die roll against a size/defense threshold decides capture. Failed
//! assaults sometimes cost the besieger a soldier; the siege simply resumes
//! next turn.

use tracing::{debug, info};

use crate::map::{ArmyId, Map, ProvinceId};
use crate::rng::GameRng;

use super::report::{BattleKind, BattleOutcome, BattleReport, BattleRound};

/// Defense points ground down per besieging soldier each attempt.
pub const DEFENSE_PER_SOLDIER: f32 = 20.0;

/// Secondary roll at or below this value costs the besieger one soldier.
const ATTRITION_ROLL: i32 = 4;

/// Runs one siege attempt. On success the province transfers immediately;
/// on failure the army stays in place and tries again next turn.
pub fn perform_siege(map: &mut Map, rng: &mut GameRng, army: ArmyId, target: ProvinceId) {
    let size = map.army(army).size;
    let attacker_force = map.army(army).owner;
    let defender_force = map.province(target).owner;

    let roll = rng.roll_int(0, 9);
    // Mountain walls are harder to storm.
    let eff_roll = if map.province(target).is_mountain { roll - 1 } else { roll };

    let defense_before = map.province(target).defense;
    let reduced = (defense_before - size as f32 * DEFENSE_PER_SOLDIER).max(0.0);
    map.province_mut(target).defense = reduced;

    let normalized = (reduced / 100.0).max(1.0);
    let threshold = 10.0 - (size as f32 / normalized).clamp(1.0, 10.0);
    let captured = eff_roll as f32 >= threshold;

    let mut attrition = 0;
    if captured {
        map.transfer_province(target, attacker_force);
        info!(
            province = %map.province(target).name,
            force = %map.force(attacker_force).nickname,
            "siege succeeded"
        );
    } else {
        if rng.roll_int(0, 9) <= ATTRITION_ROLL {
            attrition = 1;
            map.army_mut(army).size -= 1;
        }
        debug!(roll, defense = reduced, attrition, "siege repulsed");
    }

    map.reports.push(BattleReport {
        kind: BattleKind::Siege,
        province: target,
        attacker: attacker_force,
        defender: defender_force,
        rounds: vec![BattleRound {
            roll,
            row: 0,
            column: 0,
            attacker_size: size,
            defender_size: defense_before as i32,
            attacker_losses: attrition,
            defender_losses: (defense_before - reduced) as i32,
        }],
        outcome: if captured { BattleOutcome::Captured } else { BattleOutcome::Repulsed },
    });

    if map.army(army).is_destroyed() {
        map.remove_army(army);
    }
}
