//! Hegemon engine library.
//!
//! Exposes the map/province/army/force data model, the CRT combat and siege
//! resolver, the rule-based AI director, and the scenario/save text formats
//! for use by integration tests and the binary entry point.

pub mod ai;
pub mod combat;
pub mod map;
pub mod rng;
pub mod save;
pub mod scenario;
