//! Story Outline — seeded, deterministic drafting of story outlines.
//!
//! Drives a story from a form of choices through two idea candidates, a
//! five-act structure and a 24-block beat breakdown, then lets each block
//! grow overview and detail variants under a session policy of quotas and
//! cooldowns. Every generator draws from a seeded stream, so the same seed
//! and input always produce the same text.

pub mod core;
pub mod schema;
