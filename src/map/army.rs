//! Army state and movement intent.
//!
//! An army is bound to exactly one province and may carry a pending
//! destination; the turn driver resolves that intent into a merge, a field
//! battle, or a siege. An army whose size reaches zero is destroyed and
//! removed from both its force's list and its province slot.

use super::{ArmyId, ForceId, ProvinceId};

/// Default size cap for newly raised armies.
pub const DEFAULT_MAX_SIZE: i32 = 100;

/// Starting size of a newly raised army.
pub const INITIAL_SIZE: i32 = 10;

/// A mobile military unit bound to one province.
#[derive(Debug, Clone)]
pub struct Army {
    pub id: ArmyId,
    pub owner: ForceId,
    pub province: ProvinceId,
    /// Pending move intent, resolved on the owner's next turn.
    pub dest: Option<ProvinceId>,
    pub size: i32,
    pub max_size: i32,
}

impl Army {
    pub fn new(id: ArmyId, owner: ForceId, province: ProvinceId) -> Self {
        Army {
            id,
            owner,
            province,
            dest: None,
            size: INITIAL_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Adds recruits up to the cap; returns the amount actually added.
    pub fn reinforce(&mut self, amount: i32) -> i32 {
        let added = amount.min(self.max_size - self.size).max(0);
        self.size += added;
        added
    }

    /// A zero-size army is considered destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.size <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_army_has_defaults() {
        let a = Army::new(ArmyId(0), ForceId(1), ProvinceId(2));
        assert_eq!(a.size, INITIAL_SIZE);
        assert_eq!(a.max_size, DEFAULT_MAX_SIZE);
        assert!(a.dest.is_none());
        assert!(!a.is_destroyed());
    }

    #[test]
    fn reinforce_caps_at_max_size() {
        let mut a = Army::new(ArmyId(0), ForceId(0), ProvinceId(0));
        a.size = a.max_size - 3;
        assert_eq!(a.reinforce(5), 3);
        assert_eq!(a.size, a.max_size);
        assert_eq!(a.reinforce(5), 0);
    }

    #[test]
    fn zero_size_is_destroyed() {
        let mut a = Army::new(ArmyId(0), ForceId(0), ProvinceId(0));
        a.size = 0;
        assert!(a.is_destroyed());
    }
}
