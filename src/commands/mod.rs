// src/commands/mod.rs
//
// Command handlers behind the native messaging host, organized by feature.

mod dtos;
pub mod habits;
pub mod rules;
pub mod stats;
pub mod usage;

pub use dtos::*;
pub use habits::*;
pub use rules::*;
pub use stats::*;
pub use usage::*;
