//! Session persistence: a line-oriented text format.
//!
//! A save holds the dynamic state only — round counter, province drift,
//! force budgets, armies, director state. The static shape of the world
//! (names, terrain, links, maxima) comes from the scenario the map was
//! built from, and [`SaveGame::apply`] expects a map freshly built from
//! that same scenario. Claim lists are written `[a;b]` so a province line
//! still splits cleanly on commas.
//!
//! ```text
//! Game
//! 3,1
//! Provinces
//! 0,5,51005,wei,[wei;wu],940,10,0.001,0,0.02,0,0,0
//! Forces
//! force:wei,0,12,2
//! army:1,100,45
//! ai:aggressive,2,wu
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::ai::{Director, Personality};
use crate::map::{ForceId, Map, ProvinceId};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("missing '{0}' section")]
    MissingSection(&'static str),
    #[error("line {line}: {msg}")]
    Malformed { line: usize, msg: String },
    #[error("save references unknown force '{0}'")]
    UnknownForce(String),
    #[error("save references province {0} not present in the scenario")]
    UnknownProvince(u16),
    #[error("armies on province {0} would overlap")]
    ArmyOverlap(u16),
    #[error("save references unknown personality '{0}'")]
    UnknownPersonality(String),
}

#[derive(Debug, Clone)]
pub struct ProvinceRecord {
    pub id: u16,
    pub economy: i32,
    pub population: f32,
    pub owner: String,
    pub legal: Vec<String>,
    pub defense: f32,
    pub development: i32,
    pub growth_rate: f32,
    pub attracting: bool,
    pub huhuaness: f32,
    pub legal_progress: f32,
    pub max_legal_progress: f32,
    pub legal_added_this_turn: bool,
}

#[derive(Debug, Clone)]
pub struct ArmyRecord {
    pub province: u16,
    pub max_size: i32,
    pub size: i32,
}

#[derive(Debug, Clone)]
pub struct AiRecord {
    pub personality: String,
    pub difficulty: i32,
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForceRecord {
    pub nickname: String,
    pub capital: u16,
    pub command_points: i32,
    pub max_armies: i32,
    pub armies: Vec<ArmyRecord>,
    pub ai: Option<AiRecord>,
}

/// A fully parsed save, not yet bound to a map.
#[derive(Debug, Clone)]
pub struct SaveGame {
    pub round: u32,
    pub turn_index: usize,
    pub provinces: Vec<ProvinceRecord>,
    pub forces: Vec<ForceRecord>,
}

/// Serializes the dynamic state of a map.
pub fn encode_save(map: &Map) -> String {
    let mut out = String::new();
    out.push_str("Game\n");
    let _ = writeln!(out, "{},{}", map.round, map.turn_index());

    out.push_str("Provinces\n");
    for p in map.provinces() {
        let legal = p
            .legal_forces()
            .iter()
            .map(|&f| map.force(f).nickname.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let _ = writeln!(
            out,
            "{},{},{},{},[{}],{},{},{},{},{},{},{},{}",
            p.id.0,
            p.economy,
            p.population,
            map.force(p.owner).nickname,
            legal,
            p.defense,
            p.development,
            p.growth_rate,
            p.attracting as u8,
            p.huhuaness,
            p.legal_progress,
            p.max_legal_progress,
            p.legal_added_this_turn as u8,
        );
    }

    out.push_str("Forces\n");
    for f in map.forces() {
        let _ = writeln!(
            out,
            "force:{},{},{},{}",
            f.nickname, f.capital.0, f.command_points, f.max_armies
        );
        for &aid in &f.armies {
            let a = map.army(aid);
            let _ = writeln!(out, "army:{},{},{}", a.province.0, a.max_size, a.size);
        }
        if let Some(d) = &f.director {
            let target = d
                .target
                .map(|t| map.force(t).nickname.clone())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "ai:{},{},{}", d.personality.name(), d.difficulty, target);
        }
    }
    out
}

/// Parses save text into records. Referential checks happen at apply time.
pub fn parse_save(text: &str) -> Result<SaveGame, SaveError> {
    #[derive(PartialEq)]
    enum Section {
        Start,
        Game,
        Provinces,
        Forces,
    }

    let mut section = Section::Start;
    let mut round: Option<(u32, usize)> = None;
    let mut provinces = Vec::new();
    let mut forces: Vec<ForceRecord> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let lineno = i + 1;
        if line.is_empty() {
            continue;
        }
        match line {
            "Game" => {
                section = Section::Game;
                continue;
            }
            "Provinces" => {
                section = Section::Provinces;
                continue;
            }
            "Forces" => {
                section = Section::Forces;
                continue;
            }
            _ => {}
        }
        match section {
            Section::Start => {
                return Err(malformed(lineno, "content before the Game section"));
            }
            Section::Game => {
                let fields: Vec<&str> = line.split(',').collect();
                if fields.len() != 2 {
                    return Err(malformed(lineno, "expected round,turn_index"));
                }
                round = Some((num(fields[0], lineno)?, num(fields[1], lineno)?));
            }
            Section::Provinces => {
                provinces.push(parse_province_line(line, lineno)?);
            }
            Section::Forces => {
                if let Some(rest) = line.strip_prefix("force:") {
                    forces.push(parse_force_line(rest, lineno)?);
                } else if let Some(rest) = line.strip_prefix("army:") {
                    let force = forces
                        .last_mut()
                        .ok_or_else(|| malformed(lineno, "army line before any force"))?;
                    force.armies.push(parse_army_line(rest, lineno)?);
                } else if let Some(rest) = line.strip_prefix("ai:") {
                    let force = forces
                        .last_mut()
                        .ok_or_else(|| malformed(lineno, "ai line before any force"))?;
                    force.ai = Some(parse_ai_line(rest, lineno)?);
                } else {
                    return Err(malformed(lineno, "unrecognized line in Forces section"));
                }
            }
        }
    }

    let (round, turn_index) = round.ok_or(SaveError::MissingSection("Game"))?;
    if provinces.is_empty() {
        return Err(SaveError::MissingSection("Provinces"));
    }
    if forces.is_empty() {
        return Err(SaveError::MissingSection("Forces"));
    }
    Ok(SaveGame { round, turn_index, provinces, forces })
}

impl SaveGame {
    /// Restores this save onto a map freshly built from the same scenario.
    /// Existing armies are discarded and rebuilt from the records.
    pub fn apply(&self, map: &mut Map) -> Result<(), SaveError> {
        fn force_id(map: &Map, nick: &str) -> Result<ForceId, SaveError> {
            map.forces()
                .iter()
                .position(|f| f.nickname == nick)
                .map(|i| ForceId(i as u8))
                .ok_or_else(|| SaveError::UnknownForce(nick.to_string()))
        }
        fn province_id(map: &Map, id: u16) -> Result<ProvinceId, SaveError> {
            if (id as usize) < map.provinces().len() {
                Ok(ProvinceId(id))
            } else {
                Err(SaveError::UnknownProvince(id))
            }
        }

        // Everything dynamic is rebuilt, so clear the army layer first.
        for i in 0..map.forces().len() {
            for aid in map.force(ForceId(i as u8)).armies.clone() {
                map.remove_army(aid);
            }
            map.force_mut(ForceId(i as u8)).provinces.clear();
        }

        for rec in &self.provinces {
            let id = province_id(map, rec.id)?;
            let owner = force_id(map, &rec.owner)?;
            let legal = rec
                .legal
                .iter()
                .map(|n| force_id(map, n))
                .collect::<Result<Vec<_>, _>>()?;
            let p = map.province_mut(id);
            p.owner = owner;
            p.economy = rec.economy;
            p.population = rec.population;
            p.defense = rec.defense;
            p.development = rec.development;
            p.growth_rate = rec.growth_rate;
            p.attracting = rec.attracting;
            p.huhuaness = rec.huhuaness;
            p.legal_progress = rec.legal_progress;
            p.max_legal_progress = rec.max_legal_progress;
            p.legal_added_this_turn = rec.legal_added_this_turn;
            p.set_legal_forces(legal);
            map.force_mut(owner).provinces.push(id);
        }

        for rec in &self.forces {
            let fid = force_id(map, &rec.nickname)?;
            let capital = province_id(map, rec.capital)?;
            for army in &rec.armies {
                let at = province_id(map, army.province)?;
                let aid = map
                    .spawn_army(fid, at)
                    .ok_or(SaveError::ArmyOverlap(army.province))?;
                let a = map.army_mut(aid);
                a.max_size = army.max_size;
                a.size = army.size;
            }
            let director = match &rec.ai {
                Some(ai) => {
                    let personality = Personality::from_name(&ai.personality)
                        .ok_or_else(|| SaveError::UnknownPersonality(ai.personality.clone()))?;
                    let mut d = Director::new(personality, ai.difficulty);
                    d.target = match &ai.target {
                        Some(nick) => Some(force_id(map, nick)?),
                        None => None,
                    };
                    Some(d)
                }
                None => None,
            };
            let force = map.force_mut(fid);
            force.capital = capital;
            force.command_points = rec.command_points;
            force.max_armies = rec.max_armies;
            force.director = director;
        }

        map.set_turn_state(self.round, self.turn_index);
        info!(round = self.round, "session restored");
        Ok(())
    }
}

fn malformed(line: usize, msg: &str) -> SaveError {
    SaveError::Malformed { line, msg: msg.to_string() }
}

fn num<T: FromStr>(s: &str, line: usize) -> Result<T, SaveError> {
    s.trim()
        .parse()
        .map_err(|_| malformed(line, &format!("bad number '{}'", s)))
}

fn parse_province_line(line: &str, lineno: usize) -> Result<ProvinceRecord, SaveError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 13 {
        return Err(malformed(lineno, "expected 13 province fields"));
    }
    let legal_raw = fields[4];
    if !legal_raw.starts_with('[') || !legal_raw.ends_with(']') {
        return Err(malformed(lineno, "claim list must be bracketed"));
    }
    let inner = &legal_raw[1..legal_raw.len() - 1];
    let legal = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(';').map(str::to_string).collect()
    };
    Ok(ProvinceRecord {
        id: num(fields[0], lineno)?,
        economy: num(fields[1], lineno)?,
        population: num(fields[2], lineno)?,
        owner: fields[3].to_string(),
        legal,
        defense: num(fields[5], lineno)?,
        development: num(fields[6], lineno)?,
        growth_rate: num(fields[7], lineno)?,
        attracting: num::<u8>(fields[8], lineno)? != 0,
        huhuaness: num(fields[9], lineno)?,
        legal_progress: num(fields[10], lineno)?,
        max_legal_progress: num(fields[11], lineno)?,
        legal_added_this_turn: num::<u8>(fields[12], lineno)? != 0,
    })
}

fn parse_force_line(rest: &str, lineno: usize) -> Result<ForceRecord, SaveError> {
    let fields: Vec<&str> = rest.split(',').collect();
    if fields.len() != 4 {
        return Err(malformed(lineno, "expected nickname,capital,command_points,max_armies"));
    }
    Ok(ForceRecord {
        nickname: fields[0].to_string(),
        capital: num(fields[1], lineno)?,
        command_points: num(fields[2], lineno)?,
        max_armies: num(fields[3], lineno)?,
        armies: Vec::new(),
        ai: None,
    })
}

fn parse_army_line(rest: &str, lineno: usize) -> Result<ArmyRecord, SaveError> {
    let fields: Vec<&str> = rest.split(',').collect();
    if fields.len() != 3 {
        return Err(malformed(lineno, "expected province,max_size,size"));
    }
    Ok(ArmyRecord {
        province: num(fields[0], lineno)?,
        max_size: num(fields[1], lineno)?,
        size: num(fields[2], lineno)?,
    })
}

fn parse_ai_line(rest: &str, lineno: usize) -> Result<AiRecord, SaveError> {
    let fields: Vec<&str> = rest.split(',').collect();
    if fields.len() != 3 {
        return Err(malformed(lineno, "expected personality,difficulty,target"));
    }
    Ok(AiRecord {
        personality: fields[0].to_string(),
        difficulty: num(fields[1], lineno)?,
        target: match fields[2].trim() {
            "-" => None,
            nick => Some(nick.to_string()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testutil::line_map;

    #[test]
    fn encode_parse_apply_round_trips() {
        let mut map = line_map(4, 2);
        map.set_turn_state(7, 1);
        map.force_mut(ForceId(0)).command_points = 23;
        let aid = map.spawn_army(ForceId(0), ProvinceId(1)).unwrap();
        map.army_mut(aid).size = 42;
        map.province_mut(ProvinceId(2)).huhuaness = 0.25;
        let mut d = Director::new(Personality::Besieger, 2);
        d.target = Some(ForceId(0));
        map.force_mut(ForceId(1)).director = Some(d);

        let text = encode_save(&map);
        let save = parse_save(&text).unwrap();
        let mut restored = line_map(4, 2);
        save.apply(&mut restored).unwrap();

        assert_eq!(restored.round, 7);
        assert_eq!(restored.turn_index(), 1);
        assert_eq!(restored.force(ForceId(0)).command_points, 23);
        let aid = restored.province(ProvinceId(1)).army_on.unwrap();
        assert_eq!(restored.army(aid).size, 42);
        assert_eq!(restored.province(ProvinceId(2)).huhuaness, 0.25);
        let d = restored.force(ForceId(1)).director.as_ref().unwrap();
        assert_eq!(d.personality, Personality::Besieger);
        assert_eq!(d.target, Some(ForceId(0)));

        // A second encode of the restored map is byte-identical.
        assert_eq!(encode_save(&restored), text);
    }

    #[test]
    fn claim_lists_survive_ownership_changes() {
        let mut map = line_map(3, 2);
        map.transfer_province(ProvinceId(2), ForceId(0));
        let text = encode_save(&map);
        let save = parse_save(&text).unwrap();
        let mut restored = line_map(3, 2);
        save.apply(&mut restored).unwrap();
        let p = restored.province(ProvinceId(2));
        assert_eq!(p.owner, ForceId(0));
        assert!(!p.is_legal());
        assert!(p.is_legal_for(ForceId(1)));
        assert!(restored.force(ForceId(0)).provinces.contains(&ProvinceId(2)));
        assert!(!restored.force(ForceId(1)).provinces.contains(&ProvinceId(2)));
    }

    #[test]
    fn unknown_force_in_save_is_an_error() {
        let map = line_map(3, 2);
        let text = encode_save(&map).replace("alpha", "ghost");
        let save = parse_save(&text).unwrap();
        let mut target = line_map(3, 2);
        assert!(matches!(save.apply(&mut target), Err(SaveError::UnknownForce(_))));
    }

    #[test]
    fn malformed_lines_report_position() {
        let err = parse_save("Game\n1\n").unwrap_err();
        assert!(matches!(err, SaveError::Malformed { line: 2, .. }));

        let map = line_map(3, 2);
        let text = encode_save(&map).replace("force:", "team:");
        assert!(matches!(parse_save(&text), Err(SaveError::Malformed { .. })));
    }

    #[test]
    fn empty_sections_are_missing_sections() {
        assert!(matches!(parse_save(""), Err(SaveError::MissingSection("Game"))));
        assert!(matches!(
            parse_save("Game\n1,0\nForces\nforce:alpha,0,0,1\n"),
            Err(SaveError::MissingSection("Provinces"))
        ));
    }
}
