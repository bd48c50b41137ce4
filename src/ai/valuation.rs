//! Province valuation for the AI director.
//!
//! Recomputed from scratch every AI turn: a weight for how much a holding
//! matters (economy times population), discounted hard when the claim is
//! not recognized, plus a border flag for threat-aware weighting.

use crate::map::{ForceId, Map, ProvinceId};

/// One owned province's computed worth this turn.
#[derive(Debug, Clone, Copy)]
pub struct ProvinceValue {
    pub id: ProvinceId,
    pub value: f32,
    pub border: bool,
}

/// The raw value score for a single province.
pub fn province_value(map: &Map, id: ProvinceId) -> f32 {
    let p = map.province(id);
    let mut v = p.economy as f32 * p.population * 0.0001;
    if !p.is_legal() {
        v *= 0.1;
    }
    v
}

/// Values every province the force owns, in holding order.
pub fn compute_values(map: &Map, force: ForceId) -> Vec<ProvinceValue> {
    map.force(force)
        .provinces
        .iter()
        .map(|&id| ProvinceValue {
            id,
            value: province_value(map, id),
            border: map
                .neighbors(id)
                .iter()
                .any(|&n| map.province(n).owner != force),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testutil::line_map;

    #[test]
    fn value_scales_with_economy_and_population() {
        let mut map = line_map(4, 2);
        map.province_mut(ProvinceId(0)).economy = 10;
        let v0 = province_value(&map, ProvinceId(0));
        let v1 = province_value(&map, ProvinceId(1));
        assert!(v0 > v1);
        assert!((v1 - 5.0 * 50_000.0 * 0.0001).abs() < 1e-3);
    }

    #[test]
    fn illegal_holdings_are_discounted() {
        let mut map = line_map(4, 2);
        let legal = province_value(&map, ProvinceId(2));
        map.transfer_province(ProvinceId(2), ForceId(0));
        let illegal = province_value(&map, ProvinceId(2));
        assert!((illegal - legal * 0.1).abs() < 1e-3);
    }

    #[test]
    fn border_flags_mark_the_frontier() {
        let map = line_map(4, 2);
        let values = compute_values(&map, ForceId(0));
        let by_id = |id: u16| values.iter().find(|v| v.id == ProvinceId(id)).unwrap();
        assert!(!by_id(0).border);
        assert!(by_id(1).border);
    }
}
