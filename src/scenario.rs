//! Scenario definitions: the JSON files a session starts from.
//!
//! A scenario names its forces, provinces, and the links between them.
//! Provinces refer to forces by nickname and links refer to provinces by
//! their position in the list, so a definition stays hand-editable. All
//! referential problems are setup errors and fail the load.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::ai::{Director, Personality};
use crate::map::{Force, LinkType, Map, Province, ProvinceId};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scenario json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scenario defines no forces")]
    NoForces,
    #[error("scenario defines no provinces")]
    NoProvinces,
    #[error("unknown force nickname '{0}'")]
    UnknownForce(String),
    #[error("province index {0} out of range")]
    UnknownProvince(usize),
    #[error("unknown link kind '{0}'")]
    UnknownLinkKind(String),
    #[error("unknown terrain '{0}'")]
    UnknownTerrain(String),
    #[error("unknown personality '{0}'")]
    UnknownPersonality(String),
    #[error("link joins province {0} to itself")]
    SelfLink(usize),
    #[error("armies on province {0} would overlap")]
    ArmyOverlap(usize),
}

#[derive(Debug, Deserialize)]
pub struct ScenarioDef {
    pub name: String,
    pub forces: Vec<ForceDef>,
    pub provinces: Vec<ProvinceDef>,
    pub links: Vec<LinkDef>,
}

#[derive(Debug, Deserialize)]
pub struct ForceDef {
    pub nickname: String,
    pub color: [u8; 3],
    /// Province index of the capital.
    pub capital: usize,
    #[serde(default)]
    pub command_points: i32,
    #[serde(default)]
    pub player: bool,
    pub ai: Option<AiDef>,
}

#[derive(Debug, Deserialize)]
pub struct AiDef {
    pub personality: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: i32,
}

fn default_difficulty() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ProvinceDef {
    pub name: String,
    /// Nickname of the owning force.
    pub owner: String,
    pub economy: i32,
    pub population: f32,
    pub max_defense: f32,
    pub growth_rate: f32,
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub major: bool,
    /// Nicknames of forces holding a recognized claim.
    #[serde(default)]
    pub legal: Vec<String>,
    /// Initial army size stationed here, if any.
    #[serde(default)]
    pub army: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LinkDef {
    pub a: usize,
    pub b: usize,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Reads and builds a scenario from a JSON file.
pub fn load_scenario(path: &Path) -> Result<Map, ScenarioError> {
    let text = fs::read_to_string(path)?;
    let def: ScenarioDef = serde_json::from_str(&text)?;
    let map = build_map(&def)?;
    info!(scenario = %def.name, forces = def.forces.len(), provinces = def.provinces.len(), "scenario loaded");
    Ok(map)
}

/// Builds a map from an already-parsed definition.
pub fn build_map(def: &ScenarioDef) -> Result<Map, ScenarioError> {
    if def.forces.is_empty() {
        return Err(ScenarioError::NoForces);
    }
    if def.provinces.is_empty() {
        return Err(ScenarioError::NoProvinces);
    }

    let force_by_nickname = |nick: &str| {
        def.forces
            .iter()
            .position(|f| f.nickname == nick)
            .map(|i| crate::map::ForceId(i as u8))
            .ok_or_else(|| ScenarioError::UnknownForce(nick.to_string()))
    };
    let province_id = |idx: usize| {
        if idx < def.provinces.len() {
            Ok(ProvinceId(idx as u16))
        } else {
            Err(ScenarioError::UnknownProvince(idx))
        }
    };

    let mut map = Map::new();

    for (i, fd) in def.forces.iter().enumerate() {
        let capital = province_id(fd.capital)?;
        let mut force = Force::new(crate::map::ForceId(i as u8), fd.nickname.clone(), fd.color, capital);
        force.command_points = fd.command_points;
        force.is_player = fd.player;
        if let Some(ai) = &fd.ai {
            let personality = Personality::from_name(&ai.personality)
                .ok_or_else(|| ScenarioError::UnknownPersonality(ai.personality.clone()))?;
            force.director = Some(Director::new(personality, ai.difficulty));
        }
        map.add_force(force);
    }

    for (i, pd) in def.provinces.iter().enumerate() {
        let owner = force_by_nickname(&pd.owner)?;
        let mut p = Province::new(
            ProvinceId(i as u16),
            pd.name.clone(),
            owner,
            pd.economy,
            pd.population,
            pd.max_defense,
            pd.growth_rate,
        );
        match pd.terrain.as_deref() {
            None => {}
            Some("plain") => p.is_plain = true,
            Some("mountain") => p.is_mountain = true,
            Some(other) => return Err(ScenarioError::UnknownTerrain(other.to_string())),
        }
        p.is_major = pd.major;
        for nick in &pd.legal {
            let f = force_by_nickname(nick)?;
            p.add_legal_force(f);
        }
        p.max_development =
            crate::map::province::compute_max_development(p.population, p.is_plain, p.is_mountain);
        map.add_province(p);
    }

    for ld in &def.links {
        if ld.a == ld.b {
            return Err(ScenarioError::SelfLink(ld.a));
        }
        let a = province_id(ld.a)?;
        let b = province_id(ld.b)?;
        let kind = match ld.kind.as_deref() {
            None | Some("normal") => LinkType::Normal,
            Some("river") => LinkType::River,
            Some("bigriver") => LinkType::BigRiver,
            Some(other) => return Err(ScenarioError::UnknownLinkKind(other.to_string())),
        };
        map.add_link(a, b, kind);
    }

    for (i, pd) in def.provinces.iter().enumerate() {
        if let Some(size) = pd.army {
            let owner = force_by_nickname(&pd.owner)?;
            let id = ProvinceId(i as u16);
            let aid = map.spawn_army(owner, id).ok_or(ScenarioError::ArmyOverlap(i))?;
            map.army_mut(aid).size = size;
        }
    }

    for i in 0..def.forces.len() {
        map.recompute_derived(crate::map::ForceId(i as u8));
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ForceId;

    fn two_force_json() -> &'static str {
        r#"{
            "name": "strait",
            "forces": [
                {"nickname": "wei", "color": [200, 40, 40], "capital": 0,
                 "command_points": 10,
                 "ai": {"personality": "aggressive", "difficulty": 2}},
                {"nickname": "wu", "color": [40, 40, 200], "capital": 2,
                 "ai": {"personality": "defensive"}}
            ],
            "provinces": [
                {"name": "north", "owner": "wei", "economy": 6, "population": 80000,
                 "max_defense": 1200, "growth_rate": 0.001, "major": true,
                 "legal": ["wei"], "army": 15},
                {"name": "ford", "owner": "wei", "economy": 4, "population": 30000,
                 "max_defense": 600, "growth_rate": 0.001, "terrain": "plain",
                 "legal": ["wei", "wu"]},
                {"name": "south", "owner": "wu", "economy": 7, "population": 90000,
                 "max_defense": 1400, "growth_rate": 0.002, "terrain": "mountain",
                 "major": true, "legal": ["wu"]}
            ],
            "links": [
                {"a": 0, "b": 1},
                {"a": 1, "b": 2, "kind": "bigriver"}
            ]
        }"#
    }

    #[test]
    fn builds_a_complete_map() {
        let def: ScenarioDef = serde_json::from_str(two_force_json()).unwrap();
        let map = build_map(&def).unwrap();

        assert_eq!(map.forces().len(), 2);
        assert_eq!(map.provinces().len(), 3);
        assert_eq!(map.force(ForceId(0)).nickname, "wei");
        assert_eq!(map.force(ForceId(0)).command_points, 10);
        assert_eq!(map.force(ForceId(0)).max_armies, 1);
        assert!(map.force(ForceId(0)).director.is_some());

        let ford = map.province(ProvinceId(1));
        assert!(ford.is_plain);
        assert!(ford.is_legal_for(ForceId(1)));
        assert_eq!(map.link_type(ProvinceId(1), ProvinceId(2)), LinkType::BigRiver);

        let army = map.province(ProvinceId(0)).army_on.unwrap();
        assert_eq!(map.army(army).size, 15);
        assert_eq!(map.army(army).owner, ForceId(0));
    }

    #[test]
    fn unknown_owner_is_a_setup_error() {
        let mut def: ScenarioDef = serde_json::from_str(two_force_json()).unwrap();
        def.provinces[1].owner = "shu".to_string();
        assert!(matches!(build_map(&def), Err(ScenarioError::UnknownForce(n)) if n == "shu"));
    }

    #[test]
    fn out_of_range_link_is_a_setup_error() {
        let mut def: ScenarioDef = serde_json::from_str(two_force_json()).unwrap();
        def.links.push(LinkDef { a: 0, b: 9, kind: None });
        assert!(matches!(build_map(&def), Err(ScenarioError::UnknownProvince(9))));
    }

    #[test]
    fn unknown_personality_is_a_setup_error() {
        let mut def: ScenarioDef = serde_json::from_str(two_force_json()).unwrap();
        def.forces[0].ai = Some(AiDef { personality: "bold".to_string(), difficulty: 1 });
        assert!(matches!(build_map(&def), Err(ScenarioError::UnknownPersonality(_))));
    }

    #[test]
    fn self_link_is_rejected() {
        let mut def: ScenarioDef = serde_json::from_str(two_force_json()).unwrap();
        def.links.push(LinkDef { a: 1, b: 1, kind: None });
        assert!(matches!(build_map(&def), Err(ScenarioError::SelfLink(1))));
    }
}
