//! Deterministic damage simulation for a character's default attack loop.
//!
//! A character's cyclic "pitch" schedule (optionally split into phases) is
//! expanded into a timeline of hits and periodic ticks over a virtual clock;
//! each event is resolved through the character's mechanics and the results
//! are folded into total damage and DPS.

pub mod cli;
pub mod combat;
pub mod compare;
pub mod config;
pub mod data;
pub mod parallel;
pub mod server;
