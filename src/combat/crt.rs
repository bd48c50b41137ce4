//! The combat-results table.
//!
//! Field battles resolve through a fixed 24-column casualty table. The row
//! (0-7) encodes the strength ratio plus terrain/river modifiers; the die
//! roll (0-9) and row select the column as `roll + 2*row`. Columns band into
//! three zones: attacker-favored (0-5), even (6-13), defender-favored
//! (14-23). Casualties scale with the combined engagement size.

/// Number of columns in the casualty table.
pub const CRT_COLUMNS: usize = 24;

/// Maximum rounds per field battle.
pub const MAX_ROUNDS: usize = 3;

/// Divisor turning combined army size into the casualty scale step.
pub const SCALE_DIVISOR: i32 = 20;

/// Per-column casualty bases and size-scaling weights.
#[derive(Debug, Clone, Copy)]
pub struct CrtEntry {
    pub attacker_base: i32,
    pub attacker_scale: i32,
    pub defender_base: i32,
    pub defender_scale: i32,
}

const fn crt(ab: i32, asc: i32, db: i32, dsc: i32) -> CrtEntry {
    CrtEntry {
        attacker_base: ab,
        attacker_scale: asc,
        defender_base: db,
        defender_scale: dsc,
    }
}

/// The casualty table, indexed by column.
pub static CASUALTY_TABLE: [CrtEntry; CRT_COLUMNS] = [
    // Attacker-favored band (0-5).
    crt(0, 0, 4, 3),
    crt(0, 0, 4, 3),
    crt(0, 1, 3, 3),
    crt(1, 1, 3, 2),
    crt(1, 1, 3, 2),
    crt(1, 1, 2, 2),
    // Even band (6-13).
    crt(1, 1, 2, 2),
    crt(1, 1, 2, 1),
    crt(2, 1, 2, 1),
    crt(2, 1, 2, 1),
    crt(2, 1, 2, 1),
    crt(2, 1, 2, 1),
    crt(2, 1, 1, 1),
    crt(2, 1, 1, 1),
    // Defender-favored band (14-23).
    crt(2, 1, 1, 1),
    crt(2, 2, 1, 1),
    crt(2, 2, 1, 1),
    crt(3, 2, 1, 1),
    crt(3, 2, 1, 0),
    crt(3, 2, 0, 1),
    crt(3, 3, 0, 1),
    crt(4, 3, 0, 0),
    crt(4, 3, 0, 0),
    crt(4, 3, 0, 0),
];

/// Strength factor from a force's aggregate huhuaness `h` in [0, 1].
///
/// `-0.4h^2 + 0.8h + 0.6`: peaks near full assimilation and penalizes both
/// extremes of the loyalty/unrest tradeoff.
pub fn strength_factor(h: f32) -> f32 {
    -0.4 * h * h + 0.8 * h + 0.6
}

/// Maps the effective-strength ratio to the base row (0 = maximum attacker
/// advantage, 7 = maximum defender advantage). A 4:1 ratio caps the bracket.
pub fn strength_row(attacker_eff: i32, defender_eff: i32) -> i32 {
    let a = attacker_eff.max(1) as f32;
    let d = defender_eff.max(1) as f32;
    let r = a / d;
    if r >= 4.0 {
        0
    } else if r >= 2.5 {
        1
    } else if r >= 1.5 {
        2
    } else if r >= 1.0 {
        3
    } else if r > 1.0 / 1.5 {
        4
    } else if r > 1.0 / 2.5 {
        5
    } else if r > 0.25 {
        6
    } else {
        7
    }
}

/// Column index from a die roll in [0, 9] and a clamped row in [0, 7].
pub fn column(roll: i32, row: i32) -> usize {
    (roll + row * 2) as usize
}
