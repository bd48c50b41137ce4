//! The weighted operation table and the command-point sweep.
//!
//! Every AI turn builds a fresh candidate list — attract/defend/develop per
//! eligible province, recruit-5 per eligible army — weighted by personality
//! and current state, sorts it by weight, and sweeps it spending five points
//! per probabilistic trigger until the budget runs dry or the loop bound
//! hits. Army building and residual single-point recruitment bracket the
//! sweep.

use tracing::debug;

use crate::map::force::{BUILD_ARMY_COST, OPERATION_COST};
use crate::map::{ArmyId, ForceId, Map, ProvinceId};
use crate::rng::GameRng;

use super::valuation::ProvinceValue;
use super::Personality;

/// Safety bound on sweep passes over the candidate list.
const SWEEP_PASS_BOUND: usize = 50;

/// Safety bound on the army-building loop.
const BUILD_LOOP_BOUND: usize = 100;

/// Soldiers added by one recruit operation.
const RECRUIT_AMOUNT: i32 = 5;

/// Weights are clamped into this band so nothing is impossible or certain.
const WEIGHT_FLOOR: f32 = 0.05;
const WEIGHT_CEIL: f32 = 0.95;

/// What a candidate operation does when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Attract,
    Defend,
    Develop,
    Recruit5,
}

/// A weighted candidate operation.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub op: OpKind,
    pub province: ProvinceId,
    pub army: Option<ArmyId>,
    pub weight: f32,
}

/// Spends one command point per new army on the highest-value legal
/// province lacking one, up to the force's army cap.
pub fn build_armies(map: &mut Map, force: ForceId, values: &[ProvinceValue]) {
    for _ in 0..BUILD_LOOP_BOUND {
        let f = map.force(force);
        if f.command_points < BUILD_ARMY_COST || (f.armies.len() as i32) >= f.max_armies {
            break;
        }
        let pick = values
            .iter()
            .filter(|v| {
                let p = map.province(v.id);
                p.owner == force && p.is_legal() && p.army_on.is_none()
            })
            .max_by(|a, b| {
                a.value
                    .partial_cmp(&b.value)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|v| v.id);
        let Some(province) = pick else { break };
        if map.spawn_army(force, province).is_some() {
            map.force_mut(force).spend(BUILD_ARMY_COST);
            debug!(?province, "raised new army");
        } else {
            break;
        }
    }
}

/// Builds the weighted candidate list for this turn.
pub fn build_candidates(
    map: &Map,
    force: ForceId,
    personality: Personality,
    values: &[ProvinceValue],
) -> Vec<Candidate> {
    let under_attack = map
        .force(force)
        .provinces
        .iter()
        .any(|&p| map.is_sieged_by_enemy(p));
    let (income, upkeep) = map.force_income(force);
    let strained = upkeep as f32 > income.max(1) as f32 * 0.5;
    let total_army = map.force_army_total(force);

    let mut out = Vec::new();

    for v in values {
        let p = map.province(v.id);
        if p.owner != force || !p.is_legal() || map.is_sieged_by_enemy(v.id) {
            continue;
        }

        let dev_progress = if p.max_development > 0 {
            p.development as f32 / p.max_development as f32
        } else {
            0.0
        };
        let mut dev = 0.25 + v.value / 500.0 + 0.2 * dev_progress;
        if personality == Personality::Developer {
            dev += 0.25;
        }

        let fill = if p.max_defense > 0.0 { p.defense / p.max_defense } else { 1.0 };
        let mut def = 0.15 + 0.3 * (1.0 - fill);
        if personality == Personality::Defensive {
            def += 0.25;
        }
        if personality == Personality::Besieger {
            def += 0.15;
        }
        if v.border {
            def += 0.1;
        }

        let soft_cap = if p.is_mountain { 500_000.0 } else { 1_000_000.0 };
        let mut atr = 0.15;
        if personality == Personality::Mean {
            atr += 0.25;
        }
        if p.population < soft_cap {
            atr += 0.1;
        }

        out.push(Candidate { op: OpKind::Develop, province: v.id, army: None, weight: clamp(dev) });
        out.push(Candidate { op: OpKind::Defend, province: v.id, army: None, weight: clamp(def) });
        out.push(Candidate { op: OpKind::Attract, province: v.id, army: None, weight: clamp(atr) });
    }

    for &aid in &map.force(force).armies {
        let army = map.army(aid);
        let p = map.province(army.province);
        if p.owner != force || !p.is_legal_for(force) {
            continue;
        }
        let mut rct = 0.3;
        if under_attack {
            rct += 0.3;
        }
        if matches!(personality, Personality::Aggressive | Personality::Defensive) {
            rct += 0.2;
        }
        if army.size < army.max_size / 2 {
            rct += 0.15;
        }
        if total_army < 50 {
            rct += 0.1;
        }
        if strained && !under_attack {
            rct -= 0.4;
        }
        out.push(Candidate {
            op: OpKind::Recruit5,
            province: army.province,
            army: Some(aid),
            weight: clamp(rct),
        });
    }

    out
}

/// Sorts candidates by weight and sweeps the list, spending five command
/// points per triggered operation, until the budget drops below five or the
/// pass bound hits.
pub fn run_sweep(map: &mut Map, force: ForceId, rng: &mut GameRng, candidates: &[Candidate]) {
    let mut ordered: Vec<Candidate> = candidates.to_vec();
    ordered.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.province.cmp(&b.province))
    });

    'sweep: for _ in 0..SWEEP_PASS_BOUND {
        for c in &ordered {
            if map.force(force).command_points < OPERATION_COST {
                break 'sweep;
            }
            if rng.roll_float01() <= c.weight {
                execute(map, c);
                map.force_mut(force).spend(OPERATION_COST);
            }
        }
    }
}

fn execute(map: &mut Map, c: &Candidate) {
    debug!(op = ?c.op, province = ?c.province, "operation triggered");
    match c.op {
        OpKind::Attract => map.province_mut(c.province).attract(),
        OpKind::Defend => map.province_mut(c.province).fortify(),
        OpKind::Develop => map.province_mut(c.province).develop(),
        OpKind::Recruit5 => {
            if let Some(aid) = c.army {
                if map.try_army(aid).is_some() {
                    map.army_mut(aid).reinforce(RECRUIT_AMOUNT);
                }
            }
        }
    }
}

/// Spends leftover single points topping up under-cap armies on legal owned
/// provinces, one soldier per point, until nothing progresses.
pub fn residual_recruitment(map: &mut Map, force: ForceId) {
    loop {
        let mut progressed = false;
        let armies: Vec<ArmyId> = map.force(force).armies.clone();
        for aid in armies {
            if map.force(force).command_points < BUILD_ARMY_COST {
                return;
            }
            let army = map.army(aid);
            let p = map.province(army.province);
            if p.owner == force && p.is_legal() && army.size < army.max_size {
                map.army_mut(aid).size += 1;
                map.force_mut(force).spend(BUILD_ARMY_COST);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

fn clamp(w: f32) -> f32 {
    w.clamp(WEIGHT_FLOOR, WEIGHT_CEIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testutil::line_map;

    #[test]
    fn build_armies_spends_one_point_each() {
        // Three command points, one eligible province: exactly one army.
        let mut map = line_map(2, 1);
        map.force_mut(ForceId(0)).command_points = 3;
        map.force_mut(ForceId(0)).max_armies = 3;
        let values = super::super::valuation::compute_values(&map, ForceId(0));
        build_armies(&mut map, ForceId(0), &values);
        assert_eq!(map.force(ForceId(0)).armies.len(), 1);
        assert_eq!(map.force(ForceId(0)).command_points, 2);
    }

    #[test]
    fn build_armies_respects_cap() {
        let mut map = line_map(4, 3);
        map.force_mut(ForceId(0)).command_points = 10;
        map.force_mut(ForceId(0)).max_armies = 2;
        let values = super::super::valuation::compute_values(&map, ForceId(0));
        build_armies(&mut map, ForceId(0), &values);
        assert_eq!(map.force(ForceId(0)).armies.len(), 2);
        assert_eq!(map.force(ForceId(0)).command_points, 8);
    }

    #[test]
    fn build_armies_picks_highest_value_province() {
        let mut map = line_map(3, 3);
        map.province_mut(ProvinceId(1)).economy = 9;
        map.force_mut(ForceId(0)).command_points = 1;
        map.force_mut(ForceId(0)).max_armies = 1;
        let values = super::super::valuation::compute_values(&map, ForceId(0));
        build_armies(&mut map, ForceId(0), &values);
        assert!(map.province(ProvinceId(1)).army_on.is_some());
    }

    #[test]
    fn candidates_skip_illegal_and_sieged_provinces() {
        let mut map = line_map(4, 2);
        // An enemy army besieges province 1; province 0 stays eligible.
        let e = map.spawn_army(ForceId(1), ProvinceId(2)).unwrap();
        map.move_army_to(e, ProvinceId(1));
        let values = super::super::valuation::compute_values(&map, ForceId(0));
        let cands = build_candidates(&map, ForceId(0), Personality::Developer, &values);
        assert!(cands.iter().all(|c| c.province == ProvinceId(0)));
        assert_eq!(cands.len(), 3);
    }

    #[test]
    fn weights_stay_in_band() {
        let mut map = line_map(4, 2);
        map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        let values = super::super::valuation::compute_values(&map, ForceId(0));
        for personality in [
            Personality::Aggressive,
            Personality::Mean,
            Personality::Defensive,
            Personality::Besieger,
            Personality::Developer,
        ] {
            for c in build_candidates(&map, ForceId(0), personality, &values) {
                assert!((WEIGHT_FLOOR..=WEIGHT_CEIL).contains(&c.weight));
            }
        }
    }

    #[test]
    fn sweep_spends_five_per_trigger_and_stops_below_five() {
        let mut map = line_map(4, 2);
        map.force_mut(ForceId(0)).command_points = 23;
        let values = super::super::valuation::compute_values(&map, ForceId(0));
        let cands = build_candidates(&map, ForceId(0), Personality::Developer, &values);
        let mut rng = GameRng::seeded(7);
        run_sweep(&mut map, ForceId(0), &mut rng, &cands);
        let left = map.force(ForceId(0)).command_points;
        assert!(left < OPERATION_COST || left == 23);
        assert_eq!((23 - left) % OPERATION_COST, 0);
    }

    #[test]
    fn residual_recruitment_tops_up_one_for_one() {
        let mut map = line_map(2, 2);
        let aid = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        map.army_mut(aid).size = 97;
        map.force_mut(ForceId(0)).command_points = 7;
        residual_recruitment(&mut map, ForceId(0));
        assert_eq!(map.army(aid).size, 100);
        assert_eq!(map.force(ForceId(0)).command_points, 4);
    }

    #[test]
    fn residual_recruitment_stops_when_everyone_is_capped() {
        let mut map = line_map(2, 2);
        let aid = map.spawn_army(ForceId(0), ProvinceId(0)).unwrap();
        map.army_mut(aid).size = 100;
        map.force_mut(ForceId(0)).command_points = 7;
        residual_recruitment(&mut map, ForceId(0));
        assert_eq!(map.force(ForceId(0)).command_points, 7);
    }
}
