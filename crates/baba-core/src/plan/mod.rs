//! The plan pipeline stages: instruction construction, tolerant skeleton
//! parsing, slot materialization, shopping-list consolidation, assembly,
//! and progress events.

pub mod assemble;
pub mod materialize;
pub mod progress;
pub mod prompt;
pub mod shopping;
pub mod skeleton;
